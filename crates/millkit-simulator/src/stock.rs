//! Height-field stock model
//!
//! The block of material is discretized into a `(div_x + 1) x (div_z + 1)`
//! grid of remaining heights. Cells only ever get lower until the model is
//! reset.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Dimensions and placement of the raw block
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StockBlock {
    /// Extents along X, Y (height) and Z in world units.
    pub size: Vector3<f64>,
    /// Centre of the block's bottom face.
    pub position: Point3<f64>,
    /// Floor below which cutting is illegal, measured up from the bottom face.
    pub base_height: f64,
}

impl StockBlock {
    pub fn new(size: Vector3<f64>, position: Point3<f64>, base_height: f64) -> Self {
        Self {
            size,
            position,
            base_height,
        }
    }

    pub fn top(&self) -> f64 {
        self.position.y + self.size.y
    }

    pub fn base_floor(&self) -> f64 {
        self.position.y + self.base_height
    }

    /// World (x, z) of the grid cell (0, 0)
    pub fn corner(&self) -> (f64, f64) {
        (
            self.position.x - self.size.x / 2.0,
            self.position.z - self.size.z / 2.0,
        )
    }
}

/// Discretized remaining-material height field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockModel {
    block: StockBlock,
    div_x: usize,
    div_z: usize,
    heights: Vec<f64>,
}

impl StockModel {
    /// Create a full-height stock. Divisions below one are raised to one.
    pub fn new(block: StockBlock, div_x: usize, div_z: usize) -> Self {
        let mut stock = Self {
            block,
            div_x: 0,
            div_z: 0,
            heights: Vec::new(),
        };
        stock.reset(block.size, (div_x, div_z));
        stock
    }

    /// Reinitialize every cell to the top of the block
    ///
    /// Any previous material removal is discarded.
    pub fn reset(&mut self, size: Vector3<f64>, divisions: (usize, usize)) {
        self.block.size = size;
        self.div_x = divisions.0.max(1);
        self.div_z = divisions.1.max(1);
        let top = self.block.top();
        self.heights = vec![top; (self.div_x + 1) * (self.div_z + 1)];
        debug!(
            "Stock reset to {}x{} cells, top {:.3}",
            self.div_x + 1,
            self.div_z + 1,
            top
        );
    }

    /// Restore full height without changing the dimensions
    pub fn restore(&mut self) {
        self.reset(self.block.size, (self.div_x, self.div_z));
    }

    /// Move the block; the height field is rebuilt
    pub fn set_block(&mut self, block: StockBlock) {
        self.block = block;
        self.restore();
    }

    pub fn block(&self) -> &StockBlock {
        &self.block
    }

    pub fn divisions(&self) -> (usize, usize) {
        (self.div_x, self.div_z)
    }

    /// Number of grid samples along X and Z
    pub fn dimensions(&self) -> (usize, usize) {
        (self.div_x + 1, self.div_z + 1)
    }

    pub fn top(&self) -> f64 {
        self.block.top()
    }

    pub fn base_floor(&self) -> f64 {
        self.block.base_floor()
    }

    /// World distance between adjacent samples along X and Z
    pub fn cell_size(&self) -> (f64, f64) {
        (
            self.block.size.x / self.div_x as f64,
            self.block.size.z / self.div_z as f64,
        )
    }

    pub fn contains(&self, x: i64, z: i64) -> bool {
        x >= 0 && z >= 0 && (x as usize) <= self.div_x && (z as usize) <= self.div_z
    }

    fn index(&self, x: i64, z: i64) -> Option<usize> {
        if self.contains(x, z) {
            Some(z as usize * (self.div_x + 1) + x as usize)
        } else {
            None
        }
    }

    /// Remaining height at a grid sample, `None` outside the grid
    pub fn height(&self, x: i64, z: i64) -> Option<f64> {
        self.index(x, z).map(|i| self.heights[i])
    }

    /// Lower a sample to `h` if it is currently higher
    ///
    /// Returns the amount of material removed at the sample (zero when the
    /// sample is already at or below `h`, or lies outside the grid).
    pub fn set_height_if_lower(&mut self, x: i64, z: i64, h: f64) -> f64 {
        match self.index(x, z) {
            Some(i) => {
                let current = self.heights[i];
                if h < current {
                    self.heights[i] = h;
                    current - h
                } else {
                    0.0
                }
            }
            None => 0.0,
        }
    }

    /// Continuous grid coordinates of a world (x, z) position
    pub fn world_to_grid(&self, x: f64, z: f64) -> (f64, f64) {
        let (cx, cz) = self.block.corner();
        (
            (x - cx) / self.block.size.x * self.div_x as f64,
            (z - cz) / self.block.size.z * self.div_z as f64,
        )
    }

    /// World (x, z) position of continuous grid coordinates
    pub fn grid_to_world(&self, gx: f64, gz: f64) -> (f64, f64) {
        let (cx, cz) = self.block.corner();
        (
            cx + gx / self.div_x as f64 * self.block.size.x,
            cz + gz / self.div_z as f64 * self.block.size.z,
        )
    }

    /// Nearest grid sample of a world position, ties to even
    pub fn snap_to_grid(&self, x: f64, z: f64) -> (i64, i64) {
        let (gx, gz) = self.world_to_grid(x, z);
        (gx.round_ties_even() as i64, gz.round_ties_even() as i64)
    }

    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    pub fn min_height(&self) -> f64 {
        self.heights.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max_height(&self) -> f64 {
        self.heights.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Approximate volume removed so far, in cubic world units
    pub fn removed_volume(&self) -> f64 {
        let (dx, dz) = self.cell_size();
        let top = self.top();
        self.heights.iter().map(|h| top - h).sum::<f64>() * dx * dz
    }
}
