//! Unit conversion utilities
//!
//! World space is measured in centimetres with Y pointing up. Move files are
//! written in millimetres with Z pointing up and Y pointing away from the
//! operator. [`FileFrame`] is the single place where that remap lives.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// World units per file unit (1 file mm = 0.1 world cm)
pub const SCALE: f64 = 0.1;

/// Convert a length in file millimetres to world units
pub fn mm_to_world(value_mm: f64) -> f64 {
    value_mm * SCALE
}

/// Bidirectional transform between world space and move file space
///
/// `file = (w.x, -w.z, w.y) / SCALE` and `world = (f.x, f.z, -f.y) * SCALE`.
/// The two directions are exact inverses of each other.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FileFrame {
    scale: f64,
}

impl FileFrame {
    /// Frame using the standard [`SCALE`]
    pub fn new() -> Self {
        Self { scale: SCALE }
    }

    /// Frame using a custom world-units-per-file-unit factor
    pub fn with_scale(scale: f64) -> Self {
        Self { scale }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Map a world point into file coordinates
    pub fn to_file(&self, world: &Point3<f64>) -> Point3<f64> {
        Point3::new(world.x, -world.z, world.y) / self.scale
    }

    /// Map a file point into world coordinates
    pub fn to_world(&self, file: &Point3<f64>) -> Point3<f64> {
        Point3::new(file.x, file.z, -file.y) * self.scale
    }
}

impl Default for FileFrame {
    fn default() -> Self {
        Self::new()
    }
}
