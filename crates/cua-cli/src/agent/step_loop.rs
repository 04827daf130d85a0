//! The step loop: a five-stage state machine driving one run.
//!
//! Each cycle walks CAPTURING -> PARSING -> REASONING -> ACTING ->
//! EVALUATING; evaluation either loops back to CAPTURING or terminates.
//! Capture, parse and actuation failures end the run immediately (skipping
//! evaluation, so a cycle that dies mid-stage does not count against the
//! budget). A reasoner that cannot be reached or does not produce the
//! expected shape only degrades the current cycle: the loop records what it
//! got and carries on without a target.

use cua_core::{Actuator, Capture, Decision, Reasoner, ScreenParser, StepContext};
use tracing::{debug, info, warn};

use super::state::{RunState, Summary};

/// Stages of one capture/act cycle. `Done` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Capturing,
    Parsing,
    Reasoning,
    Acting,
    Evaluating,
    Done,
}

/// The step loop orchestrator, generic over its four collaborators.
pub struct StepLoop<C, P, R, A> {
    capture: C,
    parser: P,
    reasoner: R,
    actuator: A,
}

impl<C, P, R, A> StepLoop<C, P, R, A>
where
    C: Capture,
    P: ScreenParser,
    R: Reasoner,
    A: Actuator,
{
    pub fn new(capture: C, parser: P, reasoner: R, actuator: A) -> Self {
        Self {
            capture,
            parser,
            reasoner,
            actuator,
        }
    }

    /// Execute a task, bounded by `max_steps` cycles.
    ///
    /// The stages run strictly sequentially; the loop itself performs no
    /// I/O beyond what the collaborators do.
    pub async fn run(&self, task: &str, max_steps: usize) -> Summary {
        info!(task, max_steps, "starting run");
        let mut state = RunState::new(task, max_steps);
        let mut phase = Phase::Capturing;

        while phase != Phase::Done {
            phase = match phase {
                Phase::Capturing => self.capture_stage(&mut state),
                Phase::Parsing => self.parse_stage(&mut state).await,
                Phase::Reasoning => self.reason_stage(&mut state).await,
                Phase::Acting => self.act_stage(&mut state),
                Phase::Evaluating => evaluate_stage(&mut state),
                Phase::Done => unreachable!("Done is terminal"),
            };
        }

        info!(
            completed = state.completed,
            steps = state.step_count,
            error = state.error.as_deref().unwrap_or(""),
            "run finished"
        );
        state.into_summary()
    }

    fn capture_stage(&self, state: &mut RunState) -> Phase {
        debug!(
            step = state.step_count + 1,
            max_steps = state.max_steps,
            "capturing screen"
        );
        match self.capture.capture() {
            Ok(shot) => {
                state.screenshot = Some(shot);
                Phase::Parsing
            }
            Err(e) => {
                state.mark_error(format!("screen capture failed: {e}"));
                Phase::Done
            }
        }
    }

    async fn parse_stage(&self, state: &mut RunState) -> Phase {
        let Some(shot) = state.screenshot.as_ref() else {
            state.mark_error("no screenshot to parse");
            return Phase::Done;
        };
        match self.parser.parse(shot).await {
            Ok(elements) => {
                debug!(count = elements.len(), "screen parsed");
                state.elements = elements;
                Phase::Reasoning
            }
            Err(e) => {
                state.mark_error(format!("screen parse failed: {e}"));
                Phase::Done
            }
        }
    }

    async fn reason_stage(&self, state: &mut RunState) -> Phase {
        let ctx = StepContext {
            original_task: &state.original_task,
            step_count: state.step_count,
            max_steps: state.max_steps,
            history: &state.history,
            elements: &state.elements,
        };

        match self.reasoner.decide(&ctx).await {
            Ok(Decision::Structured(decision)) => {
                if let Some(id) = decision.target_element_id {
                    match state.elements.iter().find(|e| e.id == id) {
                        Some(element) => {
                            let element = element.clone();
                            debug!(id, content = %element.content, "target resolved");
                            state.target_element = Some(element);
                            state.reasoning = decision.reasoning;
                        }
                        None => {
                            warn!(id, "reasoner chose an element that is not on screen");
                            state.reasoning = format!("element id {id} not found on screen");
                        }
                    }
                } else {
                    state.reasoning = decision.reasoning;
                }
                // Completion may co-occur with one final action.
                if decision.completed {
                    state.completed = true;
                }
            }
            Ok(Decision::Opaque(text)) => {
                warn!("reasoner reply did not parse, continuing without a target");
                state.reasoning = text;
            }
            Err(e) => {
                // Degraded continuation: an unreachable reasoner skips this
                // cycle's action instead of ending the run.
                warn!(error = %e, "reasoner unavailable");
                state.reasoning = format!("reasoner unavailable: {e}");
            }
        }
        Phase::Acting
    }

    fn act_stage(&self, state: &mut RunState) -> Phase {
        let Some(element) = state.target_element.clone() else {
            // Nothing to do: either the task is already complete or no
            // actionable element was found this cycle.
            debug!("no target element, skipping action");
            return Phase::Evaluating;
        };

        let Some(bbox) = element.bounding_box else {
            warn!(id = element.id, "target element has no usable bounding box");
            return Phase::Evaluating;
        };

        let (width, height) = match self.actuator.screen_size() {
            Ok(size) => size,
            Err(e) => {
                state.mark_error(format!("action failed: {e}"));
                return Phase::Done;
            }
        };

        let (x, y) = bbox.click_point(width, height);
        info!(content = %element.content, x, y, "clicking element");

        let description = format!("Clicked {}", element.content);
        match self.actuator.click(x, y) {
            Ok(()) => {
                state.record_action(description);
                Phase::Evaluating
            }
            Err(e) => {
                state.mark_error(format!("action failed: {e}"));
                Phase::Done
            }
        }
    }
}

/// Cycle bookkeeping and the continuation decision.
fn evaluate_stage(state: &mut RunState) -> Phase {
    state.step_count += 1;
    state.target_element = None;
    debug!(step = state.step_count, "cycle complete");

    if state.completed {
        info!("task completed");
        Phase::Done
    } else if state.error.is_some() {
        Phase::Done
    } else if state.step_count >= state.max_steps {
        info!(max_steps = state.max_steps, "step budget exhausted");
        Phase::Done
    } else {
        Phase::Capturing
    }
}
