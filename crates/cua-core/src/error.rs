//! Error kinds for the collaborator leaves.
//!
//! Capture, parse and actuation failures are fatal to a run; a reasoner
//! failure only degrades the current cycle (the step loop records it and
//! carries on without a target).

use thiserror::Error;

/// Screen capture failed.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no monitor available")]
    NoMonitor,
    #[error("{0}")]
    Device(String),
    #[error("failed to encode screenshot: {0}")]
    Encode(#[from] image::ImageError),
}

/// The perception service rejected or never received the screenshot.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("omniparser returned HTTP {status}")]
    Status { status: u16 },
    #[error("omniparser request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// The LLM endpoint could not be reached or answered with an error status.
#[derive(Debug, Error)]
pub enum ReasonError {
    #[error("llm returned HTTP {status}")]
    Status { status: u16 },
    #[error("llm request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// A synthetic input could not be delivered.
#[derive(Debug, Error)]
pub enum ActuationError {
    #[error("input driver unavailable: {0}")]
    Init(String),
    #[error("screen dimensions unavailable: {0}")]
    Display(String),
    #[error("pointer action failed: {0}")]
    Pointer(String),
}
