//! Run state management

use cua_core::{Element, Screenshot};
use serde::Serialize;

/// Mutable state owned by the step loop for the duration of one run.
///
/// Created once per task, threaded through every stage, and converted into
/// a [`Summary`] when the run ends. Never persisted across runs.
#[derive(Debug)]
pub struct RunState {
    /// Current phrasing of the goal (may be rewritten by future steps).
    pub task: String,
    /// The goal exactly as the caller stated it. Never changes.
    pub original_task: String,
    /// Last captured frame, overwritten each cycle.
    pub screenshot: Option<Screenshot>,
    /// Elements found in the last parse, replaced each cycle.
    pub elements: Vec<Element>,
    /// Last reasoner rationale (or diagnostic), overwritten each cycle.
    pub reasoning: String,
    /// Element chosen this cycle; cleared again at evaluation.
    pub target_element: Option<Element>,
    /// Monotonic: once true, never reset.
    pub completed: bool,
    /// First hard failure; once set the run terminates.
    pub error: Option<String>,
    /// Number of fully evaluated cycles. Never exceeds `max_steps`.
    pub step_count: usize,
    pub max_steps: usize,
    /// One entry per action actually performed.
    pub history: Vec<String>,
}

impl RunState {
    pub fn new(task: &str, max_steps: usize) -> Self {
        Self {
            task: task.to_string(),
            original_task: task.to_string(),
            screenshot: None,
            elements: Vec::new(),
            reasoning: String::new(),
            target_element: None,
            completed: false,
            error: None,
            step_count: 0,
            max_steps,
            history: Vec::new(),
        }
    }

    /// Record a hard failure. The first error wins.
    pub fn mark_error(&mut self, error: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(error.into());
        }
    }

    /// Record an action that was actually performed on screen.
    pub fn record_action(&mut self, description: impl Into<String>) {
        self.history.push(description.into());
    }

    pub fn into_summary(self) -> Summary {
        Summary {
            task: self.task,
            completed: self.completed,
            reasoning: self.reasoning,
            error: self.error.unwrap_or_default(),
            elements_found: self.elements.len(),
            steps_executed: self.step_count,
            history: self.history,
        }
    }
}

/// Final report for one run. Exactly one of three outcomes holds:
/// `completed` is true, `error` is non-empty, or the step budget ran out.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub task: String,
    pub completed: bool,
    pub reasoning: String,
    /// Empty string when the run ended without a hard failure.
    pub error: String,
    /// Elements found in the last parsed screen.
    pub elements_found: usize,
    pub steps_executed: usize,
    pub history: Vec<String>,
}
