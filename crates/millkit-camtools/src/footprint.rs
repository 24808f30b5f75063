//! Rectangular stock footprint on the XZ plane

use serde::{Deserialize, Serialize};

/// Axis-aligned footprint of the stock in world X/Z
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StockFootprint {
    pub min_x: f64,
    pub max_x: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl StockFootprint {
    pub fn new(min_x: f64, max_x: f64, min_z: f64, max_z: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_z,
            max_z,
        }
    }

    /// Footprint of a block centred on `(center_x, center_z)`
    pub fn centered(center_x: f64, center_z: f64, size_x: f64, size_z: f64) -> Self {
        Self::new(
            center_x - size_x / 2.0,
            center_x + size_x / 2.0,
            center_z - size_z / 2.0,
            center_z + size_z / 2.0,
        )
    }

    /// Grow every side by `margin`
    pub fn expanded(&self, margin: f64) -> Self {
        Self::new(
            self.min_x - margin,
            self.max_x + margin,
            self.min_z - margin,
            self.max_z + margin,
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn depth(&self) -> f64 {
        self.max_z - self.min_z
    }

    pub fn is_valid(&self) -> bool {
        self.width() > 0.0 && self.depth() > 0.0
    }
}

/// Evenly spaced positions from `start` to `end` inclusive, at most `step` apart
pub(crate) fn stations(start: f64, end: f64, step: f64) -> Vec<f64> {
    let span = end - start;
    if span <= 0.0 || step <= 0.0 {
        return vec![start];
    }
    let count = (span / step).ceil().max(1.0) as usize;
    (0..=count)
        .map(|i| start + span * i as f64 / count as f64)
        .collect()
}
