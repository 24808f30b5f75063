//! Data models for millkit
//!
//! Shared value types passed between the simulator, the move file codec and
//! the toolpath planners.

pub mod tools;

pub use tools::{ToolData, ToolProfile, ToolShape};

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Ordered sequence of world-space tool tip positions
///
/// The first point is the tool's start/retract position.
pub type MoveSequence = Vec<Point3<f64>>;

/// Partial position for updating only specific axes
///
/// Used when only some axes are present on a move line. Each axis is an
/// `Option` where `None` means "carry over" and `Some(value)` means "set".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialPosition {
    /// X-axis position (if Some, update this axis)
    pub x: Option<f64>,
    /// Y-axis position (if Some, update this axis)
    pub y: Option<f64>,
    /// Z-axis position (if Some, update this axis)
    pub z: Option<f64>,
}

impl PartialPosition {
    /// Create a new empty partial position (all axes None)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a partial position with XYZ axes set
    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: Some(z),
        }
    }

    /// Set one axis by its letter; returns false for an unknown letter
    pub fn set_axis(&mut self, axis: char, value: f64) -> bool {
        match axis.to_ascii_uppercase() {
            'X' => self.x = Some(value),
            'Y' => self.y = Some(value),
            'Z' => self.z = Some(value),
            _ => return false,
        }
        true
    }

    /// Apply this partial position to an existing point, updating only specified axes
    pub fn apply_to(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::new(
            self.x.unwrap_or(point.x),
            self.y.unwrap_or(point.y),
            self.z.unwrap_or(point.z),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_position_carry_over() {
        let previous = Point3::new(1.0, 2.0, 3.0);
        let mut partial = PartialPosition::new();
        partial.set_axis('Y', 5.0);
        let next = partial.apply_to(&previous);
        assert_eq!(next, Point3::new(1.0, 5.0, 3.0));
    }

    #[test]
    fn test_partial_position_set_axis() {
        let mut partial = PartialPosition::new();
        assert_eq!(partial.apply_to(&Point3::new(4.0, 4.0, 4.0)), Point3::new(4.0, 4.0, 4.0));
        assert!(partial.set_axis('x', 1.5));
        assert!(partial.set_axis('Z', -2.0));
        assert!(!partial.set_axis('A', 9.0));
        assert_eq!(partial.y, None);
        assert_eq!(
            partial.apply_to(&Point3::origin()),
            Point3::new(1.5, 0.0, -2.0)
        );
    }

    #[test]
    fn test_partial_position_serde() {
        let partial = PartialPosition::xyz(1.0, 2.0, 3.0);
        let json = serde_json::to_string(&partial).unwrap();
        let back: PartialPosition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, partial);
    }
}
