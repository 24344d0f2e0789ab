//! Candidate piece regions

use serde::{Deserialize, Serialize};

/// Axis-aligned candidate piece area in one image's pixel space
///
/// `area` is the measured foreground (contour) area, which is usually smaller
/// than `width * height`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub area: f64,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32, area: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            area,
        }
    }

    /// Region whose area is its full bounding box
    pub fn cell(x: u32, y: u32, size: u32) -> Self {
        Self::new(x, y, size, size, (size as f64) * (size as f64))
    }

    /// Largest of width and height
    pub fn span(&self) -> u32 {
        self.width.max(self.height)
    }

    pub fn center(&self) -> (f32, f32) {
        (
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }
}
