//! Contour graph
//!
//! Stitches loose polylines (for example the pieces of a model silhouette)
//! into one traversable boundary:
//!
//! 1. every pair of polylines (and every polyline with itself) is intersected
//!    on a projection plane;
//! 2. each polyline is split into edges between consecutive intersections,
//!    and each edge is stored together with its reverse twin;
//! 3. [`extract_path`] walks the graph taking the rightmost turn at each
//!    vertex;
//! 4. [`offset_contour`] offsets a closed walk and re-runs 1-3 on the result.
//!
//! Vertices and edges live in arenas and are addressed by index.

mod intersect;
mod offset;
mod traversal;

pub use intersect::find_intersections;
pub use offset::offset_contour;
pub use traversal::{extract_path, ContourPath};

use nalgebra::{Point3, Vector2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default distance below which two points are the same point
pub const DEFAULT_EPSILON: f64 = 1e-6;

pub type VertexId = usize;
pub type EdgeId = usize;

/// Plane the polylines are projected onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ContourPlane {
    XY,
    /// The stock base plane (world Y up)
    #[default]
    XZ,
    YZ,
}

impl ContourPlane {
    /// In-plane `(u, v)` coordinates of a point
    pub fn project(&self, p: &Point3<f64>) -> Vector2<f64> {
        match self {
            Self::XY => Vector2::new(p.x, p.y),
            Self::XZ => Vector2::new(p.x, p.z),
            Self::YZ => Vector2::new(p.y, p.z),
        }
    }

    /// Move `p` by an in-plane displacement
    pub fn displace(&self, p: &Point3<f64>, d: &Vector2<f64>) -> Point3<f64> {
        match self {
            Self::XY => Point3::new(p.x + d.x, p.y + d.y, p.z),
            Self::XZ => Point3::new(p.x + d.x, p.y, p.z + d.y),
            Self::YZ => Point3::new(p.x, p.y + d.x, p.z + d.y),
        }
    }
}

/// An input polyline with a stable id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourSegment {
    pub id: usize,
    pub points: Vec<Point3<f64>>,
    /// The last point connects back to the first.
    pub closed: bool,
    /// Ids of the intersections on this polyline, filled by the builder.
    #[serde(default)]
    pub intersections: Vec<usize>,
}

impl ContourSegment {
    pub fn new(id: usize, points: Vec<Point3<f64>>, closed: bool) -> Self {
        Self {
            id,
            points,
            closed,
            intersections: Vec::new(),
        }
    }

    pub fn open(id: usize, points: Vec<Point3<f64>>) -> Self {
        Self::new(id, points, false)
    }

    pub fn closed(id: usize, points: Vec<Point3<f64>>) -> Self {
        Self::new(id, points, true)
    }

    /// Drop a repeated closing point and mark the polyline closed instead
    fn normalized(mut self, plane: ContourPlane, epsilon: f64) -> Self {
        self.points.dedup_by(|b, a| (plane.project(a) - plane.project(b)).norm() <= epsilon);
        if self.points.len() > 2 {
            if let (Some(first), Some(last)) = (self.points.first(), self.points.last()) {
                if (plane.project(first) - plane.project(last)).norm() <= epsilon {
                    self.points.pop();
                    self.closed = true;
                }
            }
        }
        if self.points.len() < 3 {
            self.closed = false;
        }
        self
    }
}

/// Where two polylines cross
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourIntersection {
    pub id: usize,
    /// Ids of the two polylines (equal for a self-intersection).
    pub segments: (usize, usize),
    /// Index of the crossed segment within each polyline.
    pub indices: (usize, usize),
    /// Position along each crossed segment, in `[0, 1]`.
    pub params: (f64, f64),
    pub point: Point3<f64>,
}

/// Graph vertex: one or more coincident intersections
#[derive(Debug, Clone, PartialEq)]
pub struct ContourVertex {
    /// Id of the first intersection merged into this vertex.
    pub intersection: usize,
    pub point: Point3<f64>,
    pub outgoing: Vec<EdgeId>,
}

/// Identity of a directed edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    pub from: VertexId,
    pub to: VertexId,
    /// Id of the polyline the edge was cut from.
    pub polyline: usize,
    /// Ordinal of the piece along that polyline.
    pub piece: usize,
}

/// Directed sub-polyline between two vertices
#[derive(Debug, Clone, PartialEq)]
pub struct ContourEdge {
    pub key: EdgeKey,
    pub points: Vec<Point3<f64>>,
    /// The same piece walked the other way.
    pub twin: EdgeId,
}

impl ContourEdge {
    /// In-plane direction leaving the start vertex
    pub fn start_direction(&self, plane: ContourPlane) -> Vector2<f64> {
        match self.points.as_slice() {
            [a, b, ..] => plane.project(b) - plane.project(a),
            _ => Vector2::zeros(),
        }
    }

    /// In-plane direction arriving at the end vertex
    pub fn end_direction(&self, plane: ContourPlane) -> Vector2<f64> {
        match self.points.as_slice() {
            [.., a, b] => plane.project(b) - plane.project(a),
            _ => Vector2::zeros(),
        }
    }
}

/// Planar intersection graph
#[derive(Debug, Clone, PartialEq)]
pub struct ContourGraph {
    pub plane: ContourPlane,
    pub polylines: Vec<ContourSegment>,
    pub intersections: Vec<ContourIntersection>,
    pub vertices: Vec<ContourVertex>,
    pub edges: Vec<ContourEdge>,
}

impl ContourGraph {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertex(&self, id: VertexId) -> &ContourVertex {
        &self.vertices[id]
    }

    pub fn edge(&self, id: EdgeId) -> &ContourEdge {
        &self.edges[id]
    }

    /// Vertex with the smallest `u`, ties to the smallest `v`
    pub fn leftmost_vertex(&self) -> Option<VertexId> {
        let key = |v: &ContourVertex| {
            let p = self.plane.project(&v.point);
            (p.x, p.y)
        };
        self.vertices
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                key(a)
                    .partial_cmp(&key(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)
    }
}

/// One stop of a polyline at a vertex, used while splitting
#[derive(Debug, Clone, Copy)]
struct Stop {
    vertex: VertexId,
    segment: usize,
    t: f64,
    point: Point3<f64>,
}

/// Builds a [`ContourGraph`] from polylines
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourGraphBuilder {
    pub plane: ContourPlane,
    pub epsilon: f64,
    /// Edges with fewer distinct points are discarded.
    pub min_edge_points: usize,
}

impl ContourGraphBuilder {
    pub fn new(plane: ContourPlane) -> Self {
        Self {
            plane,
            epsilon: DEFAULT_EPSILON,
            min_edge_points: 2,
        }
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn build(&self, polylines: Vec<ContourSegment>) -> ContourGraph {
        let mut polylines: Vec<ContourSegment> = polylines
            .into_iter()
            .map(|p| p.normalized(self.plane, self.epsilon))
            .filter(|p| p.points.len() >= 2)
            .collect();

        let intersections = find_intersections(&polylines, self.plane, self.epsilon);
        let (mut vertices, vertex_of) = self.merge_vertices(&intersections);

        let mut stops: Vec<Vec<Stop>> = vec![Vec::new(); polylines.len()];
        for hit in &intersections {
            let vertex = vertex_of[hit.id];
            for (side, polyline_id) in [hit.segments.0, hit.segments.1].into_iter().enumerate() {
                let Some(idx) = polylines.iter().position(|p| p.id == polyline_id) else {
                    continue;
                };
                let (segment, t) = if side == 0 {
                    (hit.indices.0, hit.params.0)
                } else {
                    (hit.indices.1, hit.params.1)
                };
                stops[idx].push(Stop {
                    vertex,
                    segment,
                    t,
                    point: hit.point,
                });
                polylines[idx].intersections.push(hit.id);
            }
        }

        let mut edges = Vec::new();
        for (idx, polyline_stops) in stops.iter_mut().enumerate() {
            polyline_stops.sort_by(|a, b| {
                (a.segment, a.t)
                    .partial_cmp(&(b.segment, b.t))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            self.split_polyline(&polylines[idx], polyline_stops, &mut vertices, &mut edges);
        }

        debug!(
            "Contour graph: {} polylines, {} intersections, {} vertices, {} edges",
            polylines.len(),
            intersections.len(),
            vertices.len(),
            edges.len()
        );
        ContourGraph {
            plane: self.plane,
            polylines,
            intersections,
            vertices,
            edges,
        }
    }

    /// Collapse intersections closer than epsilon into shared vertices
    fn merge_vertices(
        &self,
        intersections: &[ContourIntersection],
    ) -> (Vec<ContourVertex>, Vec<VertexId>) {
        let mut vertices: Vec<ContourVertex> = Vec::new();
        let mut vertex_of = Vec::with_capacity(intersections.len());
        for hit in intersections {
            let p = self.plane.project(&hit.point);
            let existing = vertices
                .iter()
                .position(|v| (self.plane.project(&v.point) - p).norm() <= self.epsilon);
            let id = match existing {
                Some(id) => id,
                None => {
                    vertices.push(ContourVertex {
                        intersection: hit.id,
                        point: hit.point,
                        outgoing: Vec::new(),
                    });
                    vertices.len() - 1
                }
            };
            vertex_of.push(id);
        }
        (vertices, vertex_of)
    }

    fn split_polyline(
        &self,
        polyline: &ContourSegment,
        stops: &[Stop],
        vertices: &mut [ContourVertex],
        edges: &mut Vec<ContourEdge>,
    ) {
        let n = polyline.points.len();
        let mut spans: Vec<(Stop, Stop, usize)> = stops
            .windows(2)
            .map(|w| (w[0], w[1], w[1].segment))
            .collect();
        if polyline.closed {
            if let (Some(&last), Some(&first)) = (stops.last(), stops.first()) {
                spans.push((last, first, first.segment + n));
            }
        }

        for (piece, (from, to, end_segment)) in spans.into_iter().enumerate() {
            let mut points = vec![from.point];
            for k in from.segment + 1..=end_segment {
                points.push(polyline.points[k % n]);
            }
            points.push(to.point);
            points.dedup_by(|b, a| {
                (self.plane.project(a) - self.plane.project(b)).norm() <= self.epsilon
            });
            if points.len() < self.min_edge_points.max(2) {
                continue;
            }

            let forward = edges.len();
            let backward = forward + 1;
            let mut reversed = points.clone();
            reversed.reverse();
            edges.push(ContourEdge {
                key: EdgeKey {
                    from: from.vertex,
                    to: to.vertex,
                    polyline: polyline.id,
                    piece,
                },
                points,
                twin: backward,
            });
            edges.push(ContourEdge {
                key: EdgeKey {
                    from: to.vertex,
                    to: from.vertex,
                    polyline: polyline.id,
                    piece,
                },
                points: reversed,
                twin: forward,
            });
            vertices[from.vertex].outgoing.push(forward);
            vertices[to.vertex].outgoing.push(backward);
        }
    }
}
