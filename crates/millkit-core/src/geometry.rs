//! Geometry capabilities consumed by the planners
//!
//! The milling engine never builds curves or surfaces itself. Modelling
//! collaborators implement these traits and hand the planners evaluated
//! geometry: parametric surfaces, surface/surface intersection polylines and
//! rasterized top-surface heightmaps.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

const DERIVATIVE_STEP: f64 = 1e-4;

/// Parametric rectangle a surface is defined over
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterDomain {
    pub u_min: f64,
    pub u_max: f64,
    pub v_min: f64,
    pub v_max: f64,
    /// The surface wraps around in `u`.
    pub u_closed: bool,
    /// The surface wraps around in `v`.
    pub v_closed: bool,
}

impl ParameterDomain {
    pub fn new(u_min: f64, u_max: f64, v_min: f64, v_max: f64) -> Self {
        Self {
            u_min,
            u_max,
            v_min,
            v_max,
            u_closed: false,
            v_closed: false,
        }
    }

    /// The unit square `[0,1] x [0,1]`
    pub fn unit() -> Self {
        Self::new(0.0, 1.0, 0.0, 1.0)
    }

    pub fn with_closed(mut self, u_closed: bool, v_closed: bool) -> Self {
        self.u_closed = u_closed;
        self.v_closed = v_closed;
        self
    }

    pub fn u_span(&self) -> f64 {
        self.u_max - self.u_min
    }

    pub fn v_span(&self) -> f64 {
        self.v_max - self.v_min
    }

    pub fn contains(&self, u: f64, v: f64) -> bool {
        (self.u_min..=self.u_max).contains(&u) && (self.v_min..=self.v_max).contains(&v)
    }

    /// Bring `(u, v)` into the domain: closed directions wrap, open ones clamp
    pub fn clamp(&self, u: f64, v: f64) -> (f64, f64) {
        (
            fit(u, self.u_min, self.u_max, self.u_closed),
            fit(v, self.v_min, self.v_max, self.v_closed),
        )
    }
}

impl Default for ParameterDomain {
    fn default() -> Self {
        Self::unit()
    }
}

fn fit(t: f64, min: f64, max: f64, closed: bool) -> f64 {
    let span = max - min;
    if closed && span > 0.0 {
        if (min..=max).contains(&t) {
            t
        } else {
            min + (t - min).rem_euclid(span)
        }
    } else {
        t.clamp(min, max)
    }
}

/// A surface that can be evaluated at parametric coordinates
///
/// Second partials default to central differences of the first partials.
pub trait ParametricSurface: Send + Sync {
    fn domain(&self) -> ParameterDomain;

    fn point(&self, u: f64, v: f64) -> Point3<f64>;

    fn du(&self, u: f64, v: f64) -> Vector3<f64>;

    fn dv(&self, u: f64, v: f64) -> Vector3<f64>;

    fn duu(&self, u: f64, v: f64) -> Vector3<f64> {
        let h = DERIVATIVE_STEP * self.domain().u_span();
        (self.du(u + h, v) - self.du(u - h, v)) / (2.0 * h)
    }

    fn dvv(&self, u: f64, v: f64) -> Vector3<f64> {
        let h = DERIVATIVE_STEP * self.domain().v_span();
        (self.dv(u, v + h) - self.dv(u, v - h)) / (2.0 * h)
    }

    fn duv(&self, u: f64, v: f64) -> Vector3<f64> {
        let h = DERIVATIVE_STEP * self.domain().v_span();
        (self.du(u, v + h) - self.du(u, v - h)) / (2.0 * h)
    }

    /// Unit normal `du x dv`, or `None` where the surface is degenerate
    fn normal(&self, u: f64, v: f64) -> Option<Vector3<f64>> {
        self.du(u, v).cross(&self.dv(u, v)).try_normalize(1e-12)
    }
}

/// Starting hint for an intersection search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchSeed {
    /// Subdivisions per parametric direction used to find a start point.
    pub divisions: u32,
    /// Optional world point the search should start near.
    pub near: Option<Point3<f64>>,
}

impl SearchSeed {
    pub fn new(divisions: u32) -> Self {
        Self {
            divisions,
            near: None,
        }
    }

    pub fn near(mut self, point: Point3<f64>) -> Self {
        self.near = Some(point);
        self
    }
}

/// Ordered polyline where two surfaces meet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntersectionCurve {
    pub points: Vec<Point3<f64>>,
    pub closed: bool,
}

impl IntersectionCurve {
    pub fn new(points: Vec<Point3<f64>>, closed: bool) -> Self {
        Self { points, closed }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Result code of an intersection search
#[derive(Debug, Clone, PartialEq)]
pub enum IntersectionResult {
    Ok(IntersectionCurve),
    /// No start point was found from this seed
    NoIntersection,
    /// A start point was found but tracing produced no usable curve
    NoCurve,
}

impl IntersectionResult {
    pub fn curve(self) -> Option<IntersectionCurve> {
        match self {
            Self::Ok(curve) => Some(curve),
            Self::NoIntersection | Self::NoCurve => None,
        }
    }
}

/// Computes the intersection of two surfaces
pub trait IntersectionFinder {
    fn intersect(
        &self,
        first: &dyn ParametricSurface,
        second: &dyn ParametricSurface,
        seed: &SearchSeed,
    ) -> IntersectionResult;
}

/// Rasterized grid of model top heights over a rectangular footprint
///
/// Columns run along world X, rows along world Z. `None` marks cells where
/// the model is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heightmap {
    /// World X of the centre of column 0.
    pub origin_x: f64,
    /// World Z of the centre of row 0.
    pub origin_z: f64,
    /// Distance between adjacent cell centres.
    pub cell_size: f64,
    pub cols: usize,
    pub rows: usize,
    heights: Vec<Option<f64>>,
}

impl Heightmap {
    /// Empty heightmap (no model anywhere)
    pub fn new(origin_x: f64, origin_z: f64, cell_size: f64, cols: usize, rows: usize) -> Self {
        Self {
            origin_x,
            origin_z,
            cell_size,
            cols,
            rows,
            heights: vec![None; cols * rows],
        }
    }

    /// Build by sampling a function at each cell centre
    pub fn from_fn(
        origin_x: f64,
        origin_z: f64,
        cell_size: f64,
        cols: usize,
        rows: usize,
        mut f: impl FnMut(f64, f64) -> Option<f64>,
    ) -> Self {
        let mut map = Self::new(origin_x, origin_z, cell_size, cols, rows);
        for row in 0..rows {
            for col in 0..cols {
                let (x, z) = map.cell_center(col, row);
                map.heights[row * cols + col] = f(x, z);
            }
        }
        map
    }

    pub fn get(&self, col: usize, row: usize) -> Option<f64> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.heights.get(row * self.cols + col).copied().flatten()
    }

    pub fn set(&mut self, col: usize, row: usize, height: Option<f64>) {
        if col < self.cols && row < self.rows {
            if let Some(cell) = self.heights.get_mut(row * self.cols + col) {
                *cell = height;
            }
        }
    }

    pub fn cell_center(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.origin_x + col as f64 * self.cell_size,
            self.origin_z + row as f64 * self.cell_size,
        )
    }

    /// Nearest cell to a world (x, z) position
    pub fn world_to_cell(&self, x: f64, z: f64) -> Option<(usize, usize)> {
        if self.cell_size <= 0.0 {
            return None;
        }
        let col = ((x - self.origin_x) / self.cell_size).round();
        let row = ((z - self.origin_z) / self.cell_size).round();
        if col < 0.0 || row < 0.0 || col >= self.cols as f64 || row >= self.rows as f64 {
            return None;
        }
        Some((col as usize, row as usize))
    }

    /// Highest model point, if any cell is covered
    pub fn max_height(&self) -> Option<f64> {
        self.heights.iter().flatten().copied().reduce(f64::max)
    }

    /// Whether the stored cell count matches the dimensions
    pub fn is_consistent(&self) -> bool {
        self.heights.len() == self.cols * self.rows
    }
}

/// Produces a top-surface heightmap of the model
pub trait HeightmapSource {
    fn render_heightmap(
        &self,
        origin_x: f64,
        origin_z: f64,
        cell_size: f64,
        cols: usize,
        rows: usize,
    ) -> Heightmap;
}
