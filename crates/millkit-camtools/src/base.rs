//! Base facing and contour finishing with a flat tool
//!
//! The model silhouette on the base plane is stitched into one outer boundary
//! and offset by the tool radius. Everything outside that offset contour is
//! faced at cut height, then the tool runs once around the contour.
//!
//! A flat tool may not descend into material, so every plunge happens outside
//! the stock footprint and every cut is horizontal.

use millkit_core::{
    mm_to_world, Degenerate, IntersectionFinder, IntersectionResult, Outcome, ParametricSurface,
    SearchSeed,
};
use nalgebra::{Point3, Vector2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::contour_graph::{
    extract_path, offset_contour, ContourGraphBuilder, ContourPlane, ContourSegment,
};
use crate::error::{CamToolError, CamToolResult, ParameterError};
use crate::footprint::{stations, StockFootprint};

/// Parameters for the base pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseParameters {
    /// Flat tool diameter in millimetres.
    pub tool_diameter: f64,
    /// Distance between facing strips.
    pub spacing: f64,
    pub safe_height: f64,
    /// Height of the tool tip while cutting; keep it above the base floor.
    pub cut_height: f64,
}

impl Default for BaseParameters {
    fn default() -> Self {
        Self {
            tool_diameter: 10.0,
            spacing: 0.8,
            safe_height: 6.0,
            cut_height: 1.5,
        }
    }
}

impl BaseParameters {
    pub fn tool_radius(&self) -> f64 {
        mm_to_world(self.tool_diameter) / 2.0
    }

    pub fn validate(&self) -> CamToolResult<()> {
        ParameterError::require_positive("tool_diameter", self.tool_diameter)?;
        ParameterError::require_positive("spacing", self.spacing)?;
        if self.safe_height <= self.cut_height {
            return Err(ParameterError::Incompatible(format!(
                "safe height {} is not above cut height {}",
                self.safe_height, self.cut_height
            ))
            .into());
        }
        Ok(())
    }
}

/// The two base toolpaths
#[derive(Debug, Clone, PartialEq)]
pub struct BasePaths {
    /// Facing strips around the model; skipped when the model covers them all.
    pub facing: Outcome<Vec<Point3<f64>>>,
    pub contour: Vec<Point3<f64>>,
}

impl BasePaths {
    /// Facing followed by the contour, as one program
    pub fn combined(&self) -> Vec<Point3<f64>> {
        let mut out = match &self.facing {
            Outcome::Produced(points) => points.clone(),
            Outcome::Skipped(_) => Vec::new(),
        };
        out.extend_from_slice(&self.contour);
        out
    }
}

/// Gather model/base intersection curves as silhouette polylines
///
/// Seeds are tried in order for each surface until one yields a curve;
/// surfaces that never do are left out.
pub fn collect_silhouette(
    finder: &dyn IntersectionFinder,
    base: &dyn ParametricSurface,
    surfaces: &[&dyn ParametricSurface],
    seeds: &[SearchSeed],
) -> Outcome<Vec<ContourSegment>> {
    let mut polylines = Vec::new();
    for (index, surface) in surfaces.iter().enumerate() {
        let found = seeds.iter().find_map(|seed| match finder.intersect(*surface, base, seed) {
            IntersectionResult::Ok(curve) if curve.len() >= 2 => Some(curve),
            IntersectionResult::Ok(_) => {
                debug!("Surface {}: curve too short with seed {:?}", index, seed);
                None
            }
            IntersectionResult::NoIntersection | IntersectionResult::NoCurve => None,
        });
        match found {
            Some(curve) => polylines.push(ContourSegment::new(index, curve.points, curve.closed)),
            None => debug!("Surface {} does not meet the base plane", index),
        }
    }

    if polylines.is_empty() {
        warn!("No surface meets the base plane");
        return Outcome::Skipped(Degenerate::TooFewSurfaces {
            found: 0,
            required: 1,
        });
    }
    Outcome::Produced(polylines)
}

/// Even-odd crossings of the vertical line `x` with a closed polygon, sorted by z
fn crossings(polygon: &[Vector2<f64>], x: f64) -> Vec<f64> {
    let n = polygon.len();
    let mut zs: Vec<f64> = (0..n)
        .filter_map(|i| {
            let a = polygon[i];
            let b = polygon[(i + 1) % n];
            if (a.x > x) == (b.x > x) {
                return None;
            }
            Some(a.y + (x - a.x) * (b.y - a.y) / (b.x - a.x))
        })
        .collect();
    zs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    zs
}

/// Builds base facing and contour paths
pub struct BasePlanner {
    params: BaseParameters,
    builder: ContourGraphBuilder,
}

impl BasePlanner {
    pub fn new(params: BaseParameters) -> Self {
        Self {
            params,
            builder: ContourGraphBuilder::new(ContourPlane::XZ),
        }
    }

    pub fn with_builder(mut self, builder: ContourGraphBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn params(&self) -> &BaseParameters {
        &self.params
    }

    /// Collect the silhouette from surfaces and plan on it
    pub fn plan_from_surfaces(
        &self,
        finder: &dyn IntersectionFinder,
        base: &dyn ParametricSurface,
        surfaces: &[&dyn ParametricSurface],
        seeds: &[SearchSeed],
        footprint: &StockFootprint,
    ) -> CamToolResult<Outcome<BasePaths>> {
        match collect_silhouette(finder, base, surfaces, seeds) {
            Outcome::Produced(silhouette) => self.plan(silhouette, footprint),
            Outcome::Skipped(reason) => Ok(Outcome::Skipped(reason)),
        }
    }

    pub fn plan(
        &self,
        silhouette: Vec<ContourSegment>,
        footprint: &StockFootprint,
    ) -> CamToolResult<Outcome<BasePaths>> {
        let p = &self.params;
        p.validate()?;
        if !footprint.is_valid() {
            return Err(ParameterError::InvalidDimensions(format!(
                "stock footprint {:?}",
                footprint
            ))
            .into());
        }
        let radius = p.tool_radius();

        let builder = ContourGraphBuilder {
            plane: ContourPlane::XZ,
            ..self.builder
        };
        let graph = builder.build(silhouette);
        let Some(start) = graph.leftmost_vertex() else {
            warn!("Silhouette curves never cross");
            return Ok(Outcome::Skipped(Degenerate::NoIntersectionsFound));
        };
        let boundary = extract_path(&graph, start, Vector2::new(0.0, -1.0));
        if !boundary.closed {
            return Err(CamToolError::GeometryError(
                "silhouette boundary does not close".to_string(),
            ));
        }
        let offset = offset_contour(&graph, &boundary, radius, &builder)
            .filter(|path| path.closed && path.points.len() >= 3)
            .ok_or_else(|| {
                CamToolError::GeometryError("offset contour does not close".to_string())
            })?;
        debug!(
            "Base boundary {} points, offset contour {} points",
            boundary.points.len(),
            offset.points.len()
        );

        let polygon: Vec<Vector2<f64>> = offset
            .points
            .iter()
            .map(|q| ContourPlane::XZ.project(q))
            .collect();
        let facing = self.facing_path(&polygon, footprint);
        let contour = self.contour_path(&polygon, footprint);
        info!(
            "Base paths: facing {}, contour {} points",
            match &facing {
                Outcome::Produced(points) => format!("{} points", points.len()),
                Outcome::Skipped(reason) => reason.to_string(),
            },
            contour.len()
        );
        Ok(Outcome::Produced(BasePaths { facing, contour }))
    }

    /// Facing strips over the parts of each strip that reach its ends
    ///
    /// A strip is cut from outside the stock up to the first contour crossing,
    /// and from the far side back to the last crossing. Gaps between inner
    /// crossings are not faced.
    fn facing_path(
        &self,
        polygon: &[Vector2<f64>],
        footprint: &StockFootprint,
    ) -> Outcome<Vec<Point3<f64>>> {
        let p = &self.params;
        let r = p.tool_radius();
        let area = footprint.expanded(r);
        let near = footprint.min_z - 2.0 * r;
        let far = footprint.max_z + 2.0 * r;

        let mut path = Vec::new();
        for (i, x) in stations(area.min_x, area.max_x, p.spacing).into_iter().enumerate() {
            let zs = crossings(polygon, x);
            let mut passes: Vec<(f64, f64)> = Vec::new();
            match (zs.first(), zs.last()) {
                (Some(&first), Some(&last)) => {
                    if first > area.min_z {
                        passes.push((near, first.min(area.max_z)));
                    }
                    if last < area.max_z {
                        passes.push((far, last.max(area.min_z)));
                    }
                }
                _ => passes.push((near, area.max_z)),
            }
            if i % 2 == 1 {
                passes.reverse();
            }
            for (from, to) in passes {
                path.push(Point3::new(x, p.safe_height, from));
                path.push(Point3::new(x, p.cut_height, from));
                path.push(Point3::new(x, p.cut_height, to));
                path.push(Point3::new(x, p.safe_height, to));
            }
        }

        if path.is_empty() {
            warn!("Model covers the whole base; nothing to face");
            return Outcome::Skipped(Degenerate::NoGapsToFill);
        }
        Outcome::Produced(path)
    }

    /// One lap of the offset contour, entered from the left of the stock
    fn contour_path(
        &self,
        polygon: &[Vector2<f64>],
        footprint: &StockFootprint,
    ) -> Vec<Point3<f64>> {
        let p = &self.params;
        let r = p.tool_radius();
        let first = polygon
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (a.x, a.y)
                    .partial_cmp(&(b.x, b.y))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)
            .unwrap_or(0);
        let entry = polygon[first];
        let outside = footprint.min_x - 2.0 * r;

        let mut path = vec![
            Point3::new(outside, p.safe_height, entry.y),
            Point3::new(outside, p.cut_height, entry.y),
        ];
        let n = polygon.len();
        for k in 0..=n {
            let q = polygon[(first + k) % n];
            path.push(Point3::new(q.x, p.cut_height, q.y));
        }
        path.push(Point3::new(entry.x, p.safe_height, entry.y));
        path
    }
}
