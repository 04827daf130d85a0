//! cua-core: Shared library for the computer use agent
//!
//! Provides:
//! - Configuration loading (cua.toml)
//! - Screen capture of the primary monitor
//! - OmniParser HTTP client (screen -> UI elements)
//! - LLM-backed step reasoner
//! - Native mouse actuation

pub mod capture;
pub mod config;
pub mod element;
pub mod error;
pub mod input;
pub mod parser;
pub mod reasoner;

pub use capture::{Capture, PrimaryMonitorCapture, Screenshot};
pub use config::Config;
pub use element::{BoundingBox, Element};
pub use error::{ActuationError, CaptureError, ParseError, ReasonError};
pub use input::{Actuator, NativeActuator};
pub use parser::{OmniParserClient, ScreenParser};
pub use reasoner::{
    Confidence, Decision, LlmReasoner, Reasoner, StepContext, StructuredDecision,
};
