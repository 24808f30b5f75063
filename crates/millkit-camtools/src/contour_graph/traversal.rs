//! Boundary walk over a contour graph

use nalgebra::{Point3, Vector2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::intersect::cross;
use super::{ContourGraph, EdgeId, VertexId};

/// A walk through the graph
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContourPath {
    /// Path points; a closed path does not repeat its first point.
    pub points: Vec<Point3<f64>>,
    /// Edges in walk order.
    pub edges: Vec<EdgeId>,
    pub closed: bool,
}

impl ContourPath {
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Twice the signed area in the plane; positive for counter-clockwise
    pub fn signed_area2(&self, graph: &ContourGraph) -> f64 {
        let n = self.points.len();
        (0..n)
            .map(|i| {
                let a = graph.plane.project(&self.points[i]);
                let b = graph.plane.project(&self.points[(i + 1) % n]);
                cross(&a, &b)
            })
            .sum()
    }
}

/// Signed turn from `from` to `to`, in `(-pi, pi]`
fn turn_angle(from: &Vector2<f64>, to: &Vector2<f64>) -> f64 {
    cross(from, to).atan2(from.dot(to))
}

/// Walk from `start`, always taking the sharpest clockwise turn
///
/// `hint` is the direction the walk pretends to arrive with; starting at
/// the leftmost vertex with a hint of `(0, -1)` traces the outer boundary.
/// Each piece is used at most once in either direction, and the walk never
/// doubles back along the edge it arrived on. When it reaches a vertex it
/// already passed, the part before that vertex is dropped so the result is a
/// cycle. An unknown `start` gives an empty path.
pub fn extract_path(graph: &ContourGraph, start: VertexId, hint: Vector2<f64>) -> ContourPath {
    if start >= graph.vertices.len() {
        warn!(
            "Start vertex {} outside graph of {} vertices",
            start,
            graph.vertices.len()
        );
        return ContourPath::default();
    }
    let mut used = vec![false; graph.edges.len()];
    let mut visited: Vec<VertexId> = vec![start];
    let mut walk: Vec<EdgeId> = Vec::new();
    let mut direction = hint;
    let mut current = start;
    let mut arrival: Option<EdgeId> = None;
    let mut closed = false;

    loop {
        let back = arrival.map(|e| graph.edge(e).twin);
        let next = graph
            .vertex(current)
            .outgoing
            .iter()
            .copied()
            .filter(|&e| !used[e] && Some(e) != back)
            .map(|e| (turn_angle(&direction, &graph.edge(e).start_direction(graph.plane)), e))
            .min_by(|a, b| {
                a.0.partial_cmp(&b.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.1.cmp(&b.1))
            });
        let Some((_, edge_id)) = next else {
            break;
        };

        let edge = graph.edge(edge_id);
        used[edge_id] = true;
        used[edge.twin] = true;
        walk.push(edge_id);
        direction = edge.end_direction(graph.plane);

        let to = edge.key.to;
        if let Some(pos) = visited.iter().position(|&v| v == to) {
            if pos > 0 {
                debug!("Dropping {} lead-in edges before the cycle", pos);
                walk.drain(..pos);
            }
            closed = true;
            break;
        }
        visited.push(to);
        current = to;
        arrival = Some(edge_id);
    }

    if !closed && !walk.is_empty() {
        warn!("Contour walk from vertex {} did not close", start);
    }

    let mut points: Vec<Point3<f64>> = Vec::new();
    for &e in &walk {
        let edge_points = &graph.edge(e).points;
        let skip = usize::from(!points.is_empty());
        points.extend(edge_points.iter().skip(skip));
    }
    if closed && points.len() > 1 {
        points.pop();
    }
    if points.is_empty() {
        if let Some(v) = graph.vertices.get(start) {
            points.push(v.point);
        }
    }

    ContourPath {
        points,
        edges: walk,
        closed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour_graph::{ContourGraphBuilder, ContourPlane, ContourSegment};

    fn p(x: f64, z: f64) -> Point3<f64> {
        Point3::new(x, 0.0, z)
    }

    fn two_squares() -> ContourGraph {
        ContourGraphBuilder::new(ContourPlane::XZ).build(vec![
            ContourSegment::closed(0, vec![p(0.0, 0.0), p(2.0, 0.0), p(2.0, 2.0), p(0.0, 2.0)]),
            ContourSegment::closed(1, vec![p(1.0, 1.0), p(3.0, 1.0), p(3.0, 3.0), p(1.0, 3.0)]),
        ])
    }

    #[test]
    fn test_turn_angle_sign() {
        let down = Vector2::new(0.0, -1.0);
        assert!(turn_angle(&down, &Vector2::new(-1.0, 0.0)) < 0.0);
        assert!(turn_angle(&down, &Vector2::new(1.0, 0.0)) > 0.0);
        assert_eq!(turn_angle(&down, &down), 0.0);
    }

    #[test]
    fn test_outer_boundary_of_two_squares() {
        let graph = two_squares();
        let start = graph.leftmost_vertex().unwrap();
        let path = extract_path(&graph, start, Vector2::new(0.0, -1.0));

        assert!(path.closed);
        assert_eq!(path.edges.len(), 2);
        assert_eq!(
            path.points,
            vec![
                p(1.0, 2.0),
                p(0.0, 2.0),
                p(0.0, 0.0),
                p(2.0, 0.0),
                p(2.0, 1.0),
                p(3.0, 1.0),
                p(3.0, 3.0),
                p(1.0, 3.0),
            ]
        );
        // union of two 2x2 squares overlapping by 1x1
        assert!((path.signed_area2(&graph) - 14.0).abs() < 1e-9);
    }

    #[test]
    fn test_lead_in_is_trimmed() {
        // a triangle with a spur running left to a crossing at x = -1
        let graph = ContourGraphBuilder::new(ContourPlane::XZ).build(vec![
            ContourSegment::open(0, vec![p(-2.0, 0.5), p(0.5, 0.5)]),
            ContourSegment::open(3, vec![p(-1.0, -1.0), p(-1.0, 2.0)]),
            ContourSegment::open(1, vec![p(0.0, -1.0), p(0.0, 2.0)]),
            ContourSegment::open(2, vec![p(-0.5, 1.5), p(2.0, -1.0)]),
        ]);
        let start = graph.leftmost_vertex().unwrap();
        assert!((graph.vertex(start).point - p(-1.0, 0.5)).norm() < 1e-9);
        let path = extract_path(&graph, start, Vector2::new(0.0, -1.0));
        assert!(path.closed);
        assert_eq!(path.edges.len(), 3);
        let expected = [p(0.0, 0.5), p(0.5, 0.5), p(0.0, 1.0)];
        assert_eq!(path.points.len(), expected.len());
        for (got, want) in path.points.iter().zip(&expected) {
            assert!((got - want).norm() < 1e-9, "{got:?} != {want:?}");
        }
        for e in &path.edges {
            assert_ne!(graph.edge(*e).key.from, graph.edge(*e).key.to);
        }
    }

    #[test]
    fn test_isolated_vertex_gives_open_path() {
        let graph = ContourGraphBuilder::new(ContourPlane::XZ).build(vec![
            ContourSegment::open(0, vec![p(-1.0, 0.0), p(1.0, 0.0)]),
            ContourSegment::open(1, vec![p(0.0, -1.0), p(0.0, 1.0)]),
        ]);
        // the crossing has no edges: every polyline ends before a second stop
        let path = extract_path(&graph, 0, Vector2::new(0.0, -1.0));
        assert!(!path.closed);
        assert!(path.is_empty());
        assert_eq!(path.points, vec![p(0.0, 0.0)]);
    }

    #[test]
    fn test_unknown_start_gives_empty_path() {
        let graph = two_squares();
        let path = extract_path(&graph, graph.vertices.len(), Vector2::new(0.0, -1.0));
        assert_eq!(path, ContourPath::default());
        assert!(path.is_empty() && !path.closed);

        let empty = ContourGraphBuilder::new(ContourPlane::XZ).build(Vec::new());
        assert!(extract_path(&empty, 0, Vector2::new(0.0, -1.0)).points.is_empty());
    }
}
