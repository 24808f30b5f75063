//! Roughing toolpath
//!
//! The model heightmap is dilated by the ball profile of the roughing tool,
//! giving for every cell the lowest tip height at which the tool clears all
//! material within its radius. Strips along world Z then sweep the stock on an
//! upper plane and again on a lower plane, lifting over the model wherever the
//! clearance exceeds the plane.

use millkit_core::{mm_to_world, Heightmap, HeightmapSource};
use nalgebra::Point3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CamToolError, CamToolResult, ParameterError};
use crate::footprint::{stations, StockFootprint};
use crate::simplify::simplify;

/// Parameters for the roughing pass
///
/// Heights and distances are world units; the tool diameter is millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoughingParameters {
    pub tool_diameter: f64,
    pub upper_plane: f64,
    pub lower_plane: f64,
    /// Distance between strips.
    pub spacing: f64,
    /// Distance between samples along a strip.
    pub sampling: f64,
    pub safe_height: f64,
    /// Extra height kept above the model.
    pub clearance_margin: f64,
    pub simplify_epsilon: f64,
}

impl Default for RoughingParameters {
    fn default() -> Self {
        Self {
            tool_diameter: 16.0,
            upper_plane: 3.5,
            lower_plane: 2.0,
            spacing: 0.6,
            sampling: 0.05,
            safe_height: 6.0,
            clearance_margin: 0.05,
            simplify_epsilon: 0.001,
        }
    }
}

impl RoughingParameters {
    pub fn tool_radius(&self) -> f64 {
        mm_to_world(self.tool_diameter) / 2.0
    }

    pub fn validate(&self) -> CamToolResult<()> {
        ParameterError::require_positive("tool_diameter", self.tool_diameter)?;
        ParameterError::require_positive("spacing", self.spacing)?;
        ParameterError::require_positive("sampling", self.sampling)?;
        if self.lower_plane > self.upper_plane {
            return Err(ParameterError::Incompatible(format!(
                "lower plane {} is above upper plane {}",
                self.lower_plane, self.upper_plane
            ))
            .into());
        }
        if self.safe_height < self.upper_plane {
            return Err(ParameterError::Incompatible(format!(
                "safe height {} is below upper plane {}",
                self.safe_height, self.upper_plane
            ))
            .into());
        }
        if self.simplify_epsilon < 0.0 {
            return Err(ParameterError::InvalidValue {
                name: "simplify_epsilon".to_string(),
                reason: "must not be negative".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// One cell of the dilation kernel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelEntry {
    pub dcol: i64,
    pub drow: i64,
    /// How far the ball surface rises above the tip at this offset.
    pub rise: f64,
}

/// Ball profile rise for every cell within `radius` of the centre
pub fn ball_kernel(radius: f64, cell_size: f64) -> Vec<KernelEntry> {
    let reach = (radius / cell_size + 1e-9).floor() as i64;
    let mut kernel = Vec::new();
    for drow in -reach..=reach {
        for dcol in -reach..=reach {
            let d = ((dcol * dcol + drow * drow) as f64).sqrt() * cell_size;
            if d <= radius {
                kernel.push(KernelEntry {
                    dcol,
                    drow,
                    rise: radius - (radius * radius - d * d).max(0.0).sqrt(),
                });
            }
        }
    }
    kernel
}

/// Lowest legal tip height per heightmap cell
#[derive(Debug, Clone, PartialEq)]
pub struct ClearanceMap {
    origin_x: f64,
    origin_z: f64,
    cell_size: f64,
    cols: usize,
    rows: usize,
    values: Vec<f64>,
}

impl ClearanceMap {
    /// Dilate `heightmap` by the ball kernel and add `margin`
    ///
    /// Cells with no model height in reach are `-inf`.
    pub fn compute(heightmap: &Heightmap, radius: f64, margin: f64) -> Self {
        let kernel = ball_kernel(radius, heightmap.cell_size);
        let cols = heightmap.cols;
        let rows = heightmap.rows;
        debug!(
            "Dilating {}x{} heightmap with {} kernel cells",
            cols,
            rows,
            kernel.len()
        );

        let mut values = vec![f64::NEG_INFINITY; cols * rows];
        if cols > 0 {
            values
                .par_chunks_mut(cols)
                .enumerate()
                .for_each(|(row, out)| {
                    for (col, cell) in out.iter_mut().enumerate() {
                        *cell = dilate_cell(heightmap, &kernel, col as i64, row as i64) + margin;
                    }
                });
        }

        Self {
            origin_x: heightmap.origin_x,
            origin_z: heightmap.origin_z,
            cell_size: heightmap.cell_size,
            cols,
            rows,
            values,
        }
    }

    pub fn get(&self, col: usize, row: usize) -> f64 {
        if col >= self.cols || row >= self.rows {
            return f64::NEG_INFINITY;
        }
        self.values[row * self.cols + col]
    }

    /// Clearance at the cell nearest to a world position; `-inf` off the map
    pub fn at(&self, x: f64, z: f64) -> f64 {
        let col = ((x - self.origin_x) / self.cell_size).round();
        let row = ((z - self.origin_z) / self.cell_size).round();
        if col < 0.0 || row < 0.0 {
            return f64::NEG_INFINITY;
        }
        self.get(col as usize, row as usize)
    }
}

fn dilate_cell(heightmap: &Heightmap, kernel: &[KernelEntry], col: i64, row: i64) -> f64 {
    kernel
        .iter()
        .filter_map(|k| {
            let c = col + k.dcol;
            let r = row + k.drow;
            if c < 0 || r < 0 {
                return None;
            }
            heightmap
                .get(c as usize, r as usize)
                .map(|h| h - k.rise)
        })
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Builds roughing toolpaths
pub struct RoughPlanner {
    params: RoughingParameters,
}

impl RoughPlanner {
    pub fn new(params: RoughingParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &RoughingParameters {
        &self.params
    }

    /// Render a heightmap from `source` over the swept area and plan on it
    pub fn plan_from_source(
        &self,
        source: &dyn HeightmapSource,
        footprint: &StockFootprint,
    ) -> CamToolResult<Vec<Point3<f64>>> {
        self.params.validate()?;
        let area = footprint.expanded(2.0 * self.params.tool_radius());
        let cell = self.params.sampling;
        let cols = (area.width() / cell).ceil() as usize + 1;
        let rows = (area.depth() / cell).ceil() as usize + 1;
        let heightmap = source.render_heightmap(area.min_x, area.min_z, cell, cols, rows);
        self.plan(&heightmap, footprint)
    }

    /// Plan both roughing passes over `footprint`
    pub fn plan(
        &self,
        heightmap: &Heightmap,
        footprint: &StockFootprint,
    ) -> CamToolResult<Vec<Point3<f64>>> {
        let p = &self.params;
        p.validate()?;
        if !footprint.is_valid() {
            return Err(ParameterError::InvalidDimensions(format!(
                "stock footprint {:?}",
                footprint
            ))
            .into());
        }
        if heightmap.cell_size <= 0.0 || !heightmap.is_consistent() {
            return Err(CamToolError::InvalidParameters(
                "heightmap has no usable cells".to_string(),
            ));
        }

        let radius = p.tool_radius();
        let clearance = ClearanceMap::compute(heightmap, radius, p.clearance_margin);
        let area = footprint.expanded(radius);
        let xs = stations(area.min_x, area.max_x, p.spacing);
        let zs = stations(area.min_z, area.max_z, p.sampling);

        let mut path = Vec::new();
        let mut strip_index = 0usize;
        for &x in &xs {
            path.extend(self.strip(&clearance, x, &zs, p.upper_plane, strip_index % 2 == 1));
            strip_index += 1;
        }
        for &x in xs.iter().rev() {
            path.extend(self.strip(&clearance, x, &zs, p.lower_plane, strip_index % 2 == 1));
            strip_index += 1;
        }

        if let (Some(first), Some(last)) = (path.first().copied(), path.last().copied()) {
            path.insert(0, Point3::new(first.x, p.safe_height, first.z));
            path.push(Point3::new(last.x, p.safe_height, last.z));
        }

        let raw = path.len();
        let path = simplify(&path, p.simplify_epsilon);
        info!(
            "Roughing path: {} strips, {} points ({} before simplification)",
            strip_index,
            path.len(),
            raw
        );
        Ok(path)
    }

    /// Samples of one strip that matter at `plane`
    ///
    /// A sample is kept at the strip ends, where the tool must rise above the
    /// plane, and next to such places so the tool leaves and rejoins the
    /// plane at the right spot.
    fn strip(
        &self,
        clearance: &ClearanceMap,
        x: f64,
        zs: &[f64],
        plane: f64,
        reversed: bool,
    ) -> Vec<Point3<f64>> {
        let needs: Vec<f64> = zs.iter().map(|&z| clearance.at(x, z)).collect();
        let raised = |i: usize| needs.get(i).is_some_and(|&n| n > plane);
        let last = zs.len().saturating_sub(1);

        let mut out: Vec<Point3<f64>> = zs
            .iter()
            .zip(&needs)
            .enumerate()
            .filter(|&(i, _)| {
                i == 0 || i == last || raised(i) || raised(i - 1) || raised(i + 1)
            })
            .map(|(_, (&z, &need))| Point3::new(x, plane.max(need), z))
            .collect();
        if reversed {
            out.reverse();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> RoughingParameters {
        RoughingParameters {
            tool_diameter: 10.0,
            upper_plane: 2.0,
            lower_plane: 1.0,
            spacing: 0.5,
            sampling: 0.1,
            safe_height: 4.0,
            clearance_margin: 0.0,
            simplify_epsilon: 0.0,
        }
    }

    #[test]
    fn test_ball_kernel_profile() {
        let kernel = ball_kernel(0.5, 0.1);
        let centre = kernel.iter().find(|k| k.dcol == 0 && k.drow == 0).unwrap();
        assert_eq!(centre.rise, 0.0);
        let edge = kernel.iter().find(|k| k.dcol == 5 && k.drow == 0).unwrap();
        assert!((edge.rise - 0.5).abs() < 1e-9);
        assert!(kernel.iter().all(|k| k.dcol.abs() <= 5 && k.drow.abs() <= 5));
        assert!(!kernel.iter().any(|k| k.dcol == 5 && k.drow == 5));
    }

    #[test]
    fn test_clearance_of_single_spike() {
        let mut map = Heightmap::new(0.0, 0.0, 0.1, 21, 21);
        map.set(10, 10, Some(1.0));
        let clearance = ClearanceMap::compute(&map, 0.5, 0.0);

        assert!((clearance.get(10, 10) - 1.0).abs() < 1e-12);
        // 0.3 away the ball surface is 0.1 above the tip
        assert!((clearance.get(13, 10) - 0.9).abs() < 1e-9);
        assert_eq!(clearance.get(0, 0), f64::NEG_INFINITY);
        assert_eq!(clearance.at(-5.0, 1.0), f64::NEG_INFINITY);
    }

    #[test]
    fn test_margin_is_added() {
        let map = Heightmap::from_fn(0.0, 0.0, 0.1, 5, 5, |_, _| Some(0.5));
        let clearance = ClearanceMap::compute(&map, 0.2, 0.25);
        assert!((clearance.get(2, 2) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_flat_stock_path() {
        let map = Heightmap::new(-2.0, -2.0, 0.1, 41, 41);
        let footprint = StockFootprint::centered(0.0, 0.0, 2.0, 2.0);
        let path = RoughPlanner::new(params()).plan(&map, &footprint).unwrap();

        let first = path.first().unwrap();
        let last = path.last().unwrap();
        assert_eq!(first.y, 4.0);
        assert_eq!(last.y, 4.0);
        // footprint widened by the 0.5 tool radius
        assert!((first.x + 1.5).abs() < 1e-12);
        assert!((path[1].z + 1.5).abs() < 1e-12);
        assert!(path[1..path.len() - 1]
            .iter()
            .all(|p| p.y == 2.0 || p.y == 1.0));
        assert!(path.iter().any(|p| p.y == 1.0));
    }

    #[test]
    fn test_path_clears_model() {
        let map = Heightmap::from_fn(-2.0, -2.0, 0.1, 41, 41, |x, z| {
            let r2 = x * x + z * z;
            (r2 < 0.64).then(|| 1.5 + (0.64 - r2).sqrt())
        });
        let footprint = StockFootprint::centered(0.0, 0.0, 2.0, 2.0);
        let mut p = params();
        p.clearance_margin = 0.02;
        let path = RoughPlanner::new(p).plan(&map, &footprint).unwrap();
        let clearance = ClearanceMap::compute(&map, p.tool_radius(), p.clearance_margin);

        assert!(path.iter().any(|q| q.y > p.upper_plane));
        for q in &path {
            assert!(q.y >= clearance.at(q.x, q.z) - 1e-9, "{q:?}");
        }
    }

    #[test]
    fn test_invalid_parameters() {
        let map = Heightmap::new(0.0, 0.0, 0.1, 4, 4);
        let footprint = StockFootprint::centered(0.0, 0.0, 1.0, 1.0);

        let mut bad = params();
        bad.lower_plane = 3.0;
        assert!(RoughPlanner::new(bad).plan(&map, &footprint).is_err());

        let mut bad = params();
        bad.spacing = 0.0;
        assert!(matches!(
            RoughPlanner::new(bad).plan(&map, &footprint),
            Err(CamToolError::Parameter(_))
        ));

        let degenerate = StockFootprint::new(0.0, 0.0, 0.0, 1.0);
        assert!(RoughPlanner::new(params()).plan(&map, &degenerate).is_err());
    }

    struct Dome;

    impl HeightmapSource for Dome {
        fn render_heightmap(
            &self,
            origin_x: f64,
            origin_z: f64,
            cell_size: f64,
            cols: usize,
            rows: usize,
        ) -> Heightmap {
            Heightmap::from_fn(origin_x, origin_z, cell_size, cols, rows, |x, z| {
                (x * x + z * z < 0.25).then_some(2.5)
            })
        }
    }

    #[test]
    fn test_plan_from_source() {
        let footprint = StockFootprint::centered(0.0, 0.0, 2.0, 2.0);
        let path = RoughPlanner::new(params())
            .plan_from_source(&Dome, &footprint)
            .unwrap();
        assert!(path.iter().any(|q| q.y >= 2.5));
    }
}
