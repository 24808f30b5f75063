//! Planar Bresenham walk between two grid samples
//!
//! The tool tip height is interpolated linearly over the walk. A walk with no
//! planar extent (a pure plunge or retract) yields its single cell at the end
//! height.

/// One visited cell of a [`GridWalk`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkCell {
    pub x: i64,
    pub z: i64,
    /// Tool tip height at this cell.
    pub tip: f64,
    /// Position along the walk, `0..=steps`.
    pub index: usize,
}

/// Axis the walk advances on every step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DominantAxis {
    X,
    Z,
}

/// Iterator over the grid cells between two samples
#[derive(Debug, Clone)]
pub struct GridWalk {
    x: i64,
    z: i64,
    step_x: i64,
    step_z: i64,
    major: i64,
    minor: i64,
    error: i64,
    dominant: DominantAxis,
    y_start: f64,
    y_end: f64,
    steps: usize,
    index: usize,
}

impl GridWalk {
    pub fn new(from: (i64, i64), to: (i64, i64), y_start: f64, y_end: f64) -> Self {
        let dx = to.0 - from.0;
        let dz = to.1 - from.1;
        let (dominant, major, minor) = if dx.abs() >= dz.abs() {
            (DominantAxis::X, dx.abs(), dz.abs())
        } else {
            (DominantAxis::Z, dz.abs(), dx.abs())
        };
        Self {
            x: from.0,
            z: from.1,
            step_x: dx.signum(),
            step_z: dz.signum(),
            major,
            minor,
            error: 2 * minor - major,
            dominant,
            y_start,
            y_end,
            steps: major as usize,
            index: 0,
        }
    }

    /// Number of steps; the walk yields `steps + 1` cells
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn dominant_axis(&self) -> DominantAxis {
        self.dominant
    }

    /// Unit travel direction when the walk runs along a single grid axis
    pub fn axis_direction(&self) -> Option<(i64, i64)> {
        if self.steps == 0 || (self.step_x != 0 && self.step_z != 0) {
            None
        } else {
            Some((self.step_x, self.step_z))
        }
    }

    pub fn is_done(&self) -> bool {
        self.index > self.steps
    }

    fn tip_at(&self, index: usize) -> f64 {
        if self.steps == 0 {
            self.y_end
        } else {
            self.y_start + (self.y_end - self.y_start) * index as f64 / self.steps as f64
        }
    }
}

impl Iterator for GridWalk {
    type Item = WalkCell;

    fn next(&mut self) -> Option<WalkCell> {
        if self.is_done() {
            return None;
        }
        let cell = WalkCell {
            x: self.x,
            z: self.z,
            tip: self.tip_at(self.index),
            index: self.index,
        };
        self.index += 1;

        if self.error > 0 {
            match self.dominant {
                DominantAxis::X => self.z += self.step_z,
                DominantAxis::Z => self.x += self.step_x,
            }
            self.error -= 2 * self.major;
        }
        self.error += 2 * self.minor;
        match self.dominant {
            DominantAxis::X => self.x += self.step_x,
            DominantAxis::Z => self.z += self.step_z,
        }
        Some(cell)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.steps + 1).saturating_sub(self.index);
        (left, Some(left))
    }
}

impl ExactSizeIterator for GridWalk {}

/// Parameter range `(t0, t1)` of the segment `from -> to` that lies inside
/// the box `min..=max`, or `None` when the segment misses the box
pub fn clip_segment(
    from: (f64, f64),
    to: (f64, f64),
    min: (f64, f64),
    max: (f64, f64),
) -> Option<(f64, f64)> {
    if ![from.0, from.1, to.0, to.1].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (dx, dz) = (to.0 - from.0, to.1 - from.1);
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    for (p, q) in [
        (-dx, from.0 - min.0),
        (dx, max.0 - from.0),
        (-dz, from.1 - min.1),
        (dz, max.1 - from.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else if p < 0.0 {
            t0 = t0.max(q / p);
        } else {
            t1 = t1.min(q / p);
        }
    }
    (t0 <= t1).then_some((t0, t1))
}
