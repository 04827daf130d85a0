//! UI element types produced by the screen parser.

use serde::{Deserialize, Serialize};

/// Normalized `[x1, y1, x2, y2]` rectangle, each coordinate in `[0, 1]`
/// with `x1 <= x2` and `y1 <= y2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox(pub [f64; 4]);

impl BoundingBox {
    /// Build a box from a coordinate list, rejecting anything that is not
    /// exactly four components.
    pub fn from_coords(coords: &[f64]) -> Option<Self> {
        match coords {
            [x1, y1, x2, y2] => Some(Self([*x1, *y1, *x2, *y2])),
            _ => None,
        }
    }

    /// Midpoint of the box scaled to live screen pixels, truncated to
    /// integer coordinates.
    pub fn click_point(&self, screen_width: u32, screen_height: u32) -> (i32, i32) {
        let [x1, y1, x2, y2] = self.0;
        let x = (x1 + x2) / 2.0 * screen_width as f64;
        let y = (y1 + y2) / 2.0 * screen_height as f64;
        (x as i32, y as i32)
    }
}

/// A UI element detected on screen.
///
/// Ids are assigned in parse order and are only stable within a single
/// capture cycle; a fresh capture replaces the whole element list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: usize,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}
