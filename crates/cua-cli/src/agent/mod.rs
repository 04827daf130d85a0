//! The agent: a bounded capture -> parse -> reason -> act loop
//! over the live screen.

mod state;
mod step_loop;

pub use state::{RunState, Summary};
pub use step_loop::StepLoop;
