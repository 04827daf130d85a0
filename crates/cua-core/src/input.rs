//! Native mouse control.

use std::sync::Mutex;

use enigo::{Button, Coordinate, Direction, Enigo, Mouse, Settings};
use tracing::debug;

use crate::error::ActuationError;

/// Actuator collaborator contract: a left click at live screen pixels.
pub trait Actuator: Send + Sync {
    /// Live screen dimensions in pixels.
    fn screen_size(&self) -> Result<(u32, u32), ActuationError>;

    /// Move the pointer to `(x, y)` and perform a left click.
    fn click(&self, x: i32, y: i32) -> Result<(), ActuationError>;
}

/// Drives the host's real mouse through enigo.
pub struct NativeActuator {
    enigo: Mutex<Enigo>,
}

impl NativeActuator {
    pub fn new() -> Result<Self, ActuationError> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| ActuationError::Init(e.to_string()))?;
        Ok(Self {
            enigo: Mutex::new(enigo),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Enigo>, ActuationError> {
        self.enigo
            .lock()
            .map_err(|_| ActuationError::Init("input driver lock poisoned".to_string()))
    }
}

impl Actuator for NativeActuator {
    fn screen_size(&self) -> Result<(u32, u32), ActuationError> {
        let enigo = self.lock()?;
        let (width, height) = enigo
            .main_display()
            .map_err(|e| ActuationError::Display(e.to_string()))?;
        Ok((width as u32, height as u32))
    }

    fn click(&self, x: i32, y: i32) -> Result<(), ActuationError> {
        let mut enigo = self.lock()?;
        enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| ActuationError::Pointer(e.to_string()))?;
        enigo
            .button(Button::Left, Direction::Click)
            .map_err(|e| ActuationError::Pointer(e.to_string()))?;
        debug!(x, y, "performed left click");
        Ok(())
    }
}
