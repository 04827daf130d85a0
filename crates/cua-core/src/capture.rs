//! Screen capture of the primary monitor.

use std::io::Cursor;
use std::thread;
use std::time::Duration;

use base64::Engine;
use image::ImageFormat;
use tracing::debug;
use xcap::Monitor;

use crate::error::CaptureError;

/// A captured frame of the live screen, PNG encoded.
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Screenshot {
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.png)
    }
}

/// Capture collaborator contract: one opaque frame of the live screen.
pub trait Capture: Send + Sync {
    fn capture(&self) -> Result<Screenshot, CaptureError>;
}

/// Captures the primary monitor, waiting a short settle delay first so UI
/// transitions triggered by the previous action have finished.
pub struct PrimaryMonitorCapture {
    settle: Duration,
}

impl PrimaryMonitorCapture {
    pub fn new(settle: Duration) -> Self {
        Self { settle }
    }
}

impl Capture for PrimaryMonitorCapture {
    fn capture(&self) -> Result<Screenshot, CaptureError> {
        if !self.settle.is_zero() {
            thread::sleep(self.settle);
        }

        let mut monitors = Monitor::all().map_err(|e| CaptureError::Device(e.to_string()))?;
        if monitors.is_empty() {
            return Err(CaptureError::NoMonitor);
        }
        // Prefer the primary monitor, fall back to the first one.
        let idx = monitors
            .iter()
            .position(|m| m.is_primary().unwrap_or(false))
            .unwrap_or(0);
        let monitor = monitors.swap_remove(idx);

        let img = monitor
            .capture_image()
            .map_err(|e| CaptureError::Device(e.to_string()))?;
        let (width, height) = (img.width(), img.height());

        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

        debug!(width, height, bytes = png.len(), "captured primary monitor");
        Ok(Screenshot { png, width, height })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screenshot_base64_roundtrip() {
        let shot = Screenshot {
            png: vec![0x89, 0x50, 0x4e, 0x47],
            width: 2,
            height: 2,
        };
        let encoded = shot.to_base64();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        assert_eq!(decoded, shot.png);
    }
}
