//! Detail finishing toolpath
//!
//! Rasters a parametric surface row by row. Each sample is pushed out along
//! the surface normal by the ball radius and dropped by the same amount to get
//! the tool tip; samples whose tip is not above the clearance plane are left
//! to the other stages.

use millkit_core::{mm_to_world, Degenerate, Outcome, ParameterDomain, ParametricSurface};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CamToolResult, ParameterError};
use crate::simplify::simplify;

/// Parameters for the detail pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetailParameters {
    /// Ball tool diameter in millimetres.
    pub tool_diameter: f64,
    /// Row count across `u`.
    pub u_steps: u32,
    /// Sample count along `v`.
    pub v_steps: u32,
    pub clearance_plane: f64,
    pub safe_height: f64,
    pub simplify_epsilon: f64,
    /// Use `dv x du` instead of `du x dv` as the outward normal.
    pub flip_normal: bool,
}

impl Default for DetailParameters {
    fn default() -> Self {
        Self {
            tool_diameter: 8.0,
            u_steps: 200,
            v_steps: 200,
            clearance_plane: 1.55,
            safe_height: 6.0,
            simplify_epsilon: 0.0005,
            flip_normal: false,
        }
    }
}

impl DetailParameters {
    pub fn tool_radius(&self) -> f64 {
        mm_to_world(self.tool_diameter) / 2.0
    }

    pub fn validate(&self) -> CamToolResult<()> {
        ParameterError::require_positive("tool_diameter", self.tool_diameter)?;
        if self.u_steps == 0 || self.v_steps == 0 {
            return Err(ParameterError::InvalidValue {
                name: "u_steps/v_steps".to_string(),
                reason: "at least one step is required".to_string(),
            }
            .into());
        }
        if self.safe_height <= self.clearance_plane {
            return Err(ParameterError::Incompatible(format!(
                "safe height {} is not above clearance plane {}",
                self.safe_height, self.clearance_plane
            ))
            .into());
        }
        Ok(())
    }
}

/// Parameter values from `min` to `max`; a closed direction omits `max`
fn samples(min: f64, max: f64, steps: u32, closed: bool) -> Vec<f64> {
    let count = if closed { steps } else { steps + 1 };
    (0..count)
        .map(|i| min + (max - min) * i as f64 / steps as f64)
        .collect()
}

/// Builds detail toolpaths
pub struct DetailPlanner {
    params: DetailParameters,
}

impl DetailPlanner {
    pub fn new(params: DetailParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &DetailParameters {
        &self.params
    }

    /// Tool tip position for the surface point at `(u, v)`
    pub fn tool_tip(&self, surface: &dyn ParametricSurface, u: f64, v: f64) -> Option<Point3<f64>> {
        let r = self.params.tool_radius();
        let n = surface.normal(u, v)?;
        let n = if self.params.flip_normal { -n } else { n };
        Some(surface.point(u, v) + n * r - Vector3::new(0.0, r, 0.0))
    }

    pub fn plan(
        &self,
        surface: &dyn ParametricSurface,
    ) -> CamToolResult<Outcome<Vec<Point3<f64>>>> {
        let p = &self.params;
        p.validate()?;
        let domain: ParameterDomain = surface.domain();

        let us = samples(domain.u_min, domain.u_max, p.u_steps, domain.u_closed);
        let vs = samples(domain.v_min, domain.v_max, p.v_steps, domain.v_closed);
        debug!(
            "Detail raster {}x{} (u closed = {}, v closed = {})",
            us.len(),
            vs.len(),
            domain.u_closed,
            domain.v_closed
        );

        let mut path = Vec::new();
        let mut emitted_rows = 0usize;
        for &u in &us {
            let mut runs = self.row_runs(surface, u, &vs, domain.v_closed);
            if runs.is_empty() {
                continue;
            }
            if emitted_rows % 2 == 1 {
                runs.reverse();
                runs.iter_mut().for_each(|run| run.reverse());
            }
            for run in &runs {
                if let (Some(first), Some(last)) = (run.first(), run.last()) {
                    path.push(Point3::new(first.x, p.safe_height, first.z));
                    path.extend_from_slice(run);
                    path.push(Point3::new(last.x, p.safe_height, last.z));
                }
            }
            emitted_rows += 1;
        }

        if path.is_empty() {
            warn!("Detail pass found nothing above the clearance plane");
            return Ok(Outcome::Skipped(Degenerate::EmptyPath));
        }
        let raw = path.len();
        let path = simplify(&path, p.simplify_epsilon);
        info!(
            "Detail path: {} rows, {} points ({} before simplification)",
            emitted_rows,
            path.len(),
            raw
        );
        Ok(Outcome::Produced(path))
    }

    /// Runs of consecutive above-clearance tips along one row
    fn row_runs(
        &self,
        surface: &dyn ParametricSurface,
        u: f64,
        vs: &[f64],
        v_closed: bool,
    ) -> Vec<Vec<Point3<f64>>> {
        let clearance = self.params.clearance_plane;
        let tips: Vec<Option<Point3<f64>>> = vs
            .iter()
            .map(|&v| {
                self.tool_tip(surface, u, v)
                    .filter(|tip| tip.y > clearance)
            })
            .collect();

        let n = tips.len();
        // a closed row starts where a run starts, so no run wraps the seam
        let start = if v_closed {
            (0..n)
                .find(|&i| tips[i].is_some() && tips[(i + n - 1) % n].is_none())
                .unwrap_or(0)
        } else {
            0
        };

        let mut runs: Vec<Vec<Point3<f64>>> = Vec::new();
        let mut current: Vec<Point3<f64>> = Vec::new();
        for k in 0..n {
            match tips[(start + k) % n] {
                Some(tip) => current.push(tip),
                None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            runs.push(current);
        }
        runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    /// Horizontal square at height `h`, rows along world Z
    struct Plane {
        h: f64,
    }

    impl ParametricSurface for Plane {
        fn domain(&self) -> ParameterDomain {
            ParameterDomain::unit()
        }
        fn point(&self, u: f64, v: f64) -> Point3<f64> {
            Point3::new(v * 4.0 - 2.0, self.h, u * 4.0 - 2.0)
        }
        fn du(&self, _u: f64, _v: f64) -> Vector3<f64> {
            Vector3::new(0.0, 0.0, 4.0)
        }
        fn dv(&self, _u: f64, _v: f64) -> Vector3<f64> {
            Vector3::new(4.0, 0.0, 0.0)
        }
    }

    /// Cylinder of radius 1 along Z with its seam on top
    struct Cylinder;

    impl ParametricSurface for Cylinder {
        fn domain(&self) -> ParameterDomain {
            ParameterDomain::unit().with_closed(false, true)
        }
        fn point(&self, u: f64, v: f64) -> Point3<f64> {
            let t = TAU * v;
            Point3::new(t.sin(), 2.0 + t.cos(), u)
        }
        fn du(&self, _u: f64, _v: f64) -> Vector3<f64> {
            Vector3::new(0.0, 0.0, 1.0)
        }
        fn dv(&self, _u: f64, v: f64) -> Vector3<f64> {
            let t = TAU * v;
            Vector3::new(TAU * t.cos(), -TAU * t.sin(), 0.0)
        }
    }

    fn params() -> DetailParameters {
        DetailParameters {
            tool_diameter: 1.0,
            u_steps: 2,
            v_steps: 4,
            clearance_plane: 0.5,
            safe_height: 5.0,
            simplify_epsilon: 0.0,
            flip_normal: false,
        }
    }

    #[test]
    fn test_samples_skip_closed_duplicate() {
        assert_eq!(samples(0.0, 1.0, 4, false).len(), 5);
        assert_eq!(samples(0.0, 1.0, 4, true), vec![0.0, 0.25, 0.5, 0.75]);
    }

    #[test]
    fn test_tip_on_flat_surface_is_surface_point() {
        let planner = DetailPlanner::new(params());
        let tip = planner.tool_tip(&Plane { h: 1.0 }, 0.5, 0.5).unwrap();
        assert!((tip - Point3::new(0.0, 1.0, 0.0)).norm() < 1e-12);

        let mut flipped = params();
        flipped.flip_normal = true;
        let tip = DetailPlanner::new(flipped)
            .tool_tip(&Plane { h: 1.0 }, 0.5, 0.5)
            .unwrap();
        assert!((tip.y - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_rows_alternate() {
        let path = match DetailPlanner::new(params()).plan(&Plane { h: 1.0 }).unwrap() {
            Outcome::Produced(path) => path,
            other => panic!("unexpected {:?}", other),
        };
        // collinear samples collapse, leaving plunge, row ends and retract
        assert_eq!(
            path,
            vec![
                Point3::new(-2.0, 5.0, -2.0),
                Point3::new(-2.0, 1.0, -2.0),
                Point3::new(2.0, 1.0, -2.0),
                Point3::new(2.0, 5.0, -2.0),
                Point3::new(2.0, 5.0, 0.0),
                Point3::new(2.0, 1.0, 0.0),
                Point3::new(-2.0, 1.0, 0.0),
                Point3::new(-2.0, 5.0, 0.0),
                Point3::new(-2.0, 5.0, 2.0),
                Point3::new(-2.0, 1.0, 2.0),
                Point3::new(2.0, 1.0, 2.0),
                Point3::new(2.0, 5.0, 2.0),
            ]
        );
    }

    #[test]
    fn test_below_clearance_is_skipped() {
        let outcome = DetailPlanner::new(params()).plan(&Plane { h: 0.2 }).unwrap();
        assert_eq!(outcome, Outcome::Skipped(Degenerate::EmptyPath));
    }

    #[test]
    fn test_closed_row_starts_at_run() {
        let mut p = params();
        p.u_steps = 1;
        p.v_steps = 8;
        p.clearance_plane = 2.0;
        let path = match DetailPlanner::new(p).plan(&Cylinder).unwrap() {
            Outcome::Produced(path) => path,
            other => panic!("unexpected {:?}", other),
        };

        // one run per row across the seam: v = 7/8, 0, 1/8
        assert_eq!(path.len(), 10);
        assert_eq!(path[0].y, 5.0);
        assert!(path[1].x < 0.0);
        assert!(path[2].x.abs() < 1e-12);
        assert!(path[3].x > 0.0);
        assert_eq!(path[4].y, 5.0);
        assert_eq!(path[5].y, 5.0);
        // the second row comes back the other way
        assert!(path[6].x > 0.0);
        assert!(path[8].x < 0.0);
        assert!(path[1..4].iter().all(|q| q.y > 2.0));
    }

    #[test]
    fn test_invalid_parameters() {
        let mut p = params();
        p.v_steps = 0;
        assert!(DetailPlanner::new(p).plan(&Plane { h: 1.0 }).is_err());

        let mut p = params();
        p.safe_height = 0.1;
        assert!(DetailPlanner::new(p).plan(&Plane { h: 1.0 }).is_err());
    }
}
