//! Outward offset of a traced boundary

use nalgebra::{Point3, Vector2};
use tracing::debug;

use super::{
    extract_path, find_intersections, ContourGraph, ContourGraphBuilder, ContourPath,
    ContourPlane, ContourSegment,
};

/// Longest miter relative to the offset distance
const MITER_LIMIT: f64 = 4.0;

/// Unit normal to the right of `d`, or zero for a degenerate direction
fn right_normal(d: &Vector2<f64>) -> Vector2<f64> {
    Vector2::new(d.y, -d.x)
        .try_normalize(f64::EPSILON)
        .unwrap_or_else(Vector2::zeros)
}

/// Shift every point of an open polyline sideways by `distance`
///
/// Interior points are mitred so the offset segments stay parallel to the
/// originals; endpoints move along their single segment normal.
fn offset_piece(
    points: &[Point3<f64>],
    plane: ContourPlane,
    distance: f64,
) -> Vec<Point3<f64>> {
    let uv: Vec<Vector2<f64>> = points.iter().map(|p| plane.project(p)).collect();
    let normals: Vec<Vector2<f64>> = uv.windows(2).map(|w| right_normal(&(w[1] - w[0]))).collect();
    if normals.is_empty() {
        return points.to_vec();
    }

    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let before = normals.get(i.wrapping_sub(1)).copied();
            let after = normals.get(i).copied();
            let shift = match (before, after) {
                (Some(a), Some(b)) => {
                    let denom = 1.0 + a.dot(&b);
                    let miter = if denom > 1e-9 {
                        (a + b) / denom
                    } else {
                        a
                    };
                    if miter.norm() > MITER_LIMIT {
                        miter.normalize() * MITER_LIMIT
                    } else {
                        miter
                    }
                }
                (Some(n), None) | (None, Some(n)) => n,
                (None, None) => Vector2::zeros(),
            };
            plane.displace(p, &(shift * distance))
        })
        .collect()
}

/// Offset a closed boundary outward by `distance` and trace the result
///
/// Each edge of the walk is offset on its own. Neighbouring offsets that
/// cross are left to the new graph to trim; neighbours that separate (at a
/// convex corner) are joined by a straight link. The new graph is walked from
/// its leftmost vertex, so loops that fold inward are discarded.
///
/// Returns `None` when the offset pieces do not form a graph.
pub fn offset_contour(
    graph: &ContourGraph,
    path: &ContourPath,
    distance: f64,
    builder: &ContourGraphBuilder,
) -> Option<ContourPath> {
    if path.edges.is_empty() {
        return None;
    }
    let plane = graph.plane;
    let orientation = if path.signed_area2(graph) < 0.0 { -1.0 } else { 1.0 };

    let pieces: Vec<Vec<Point3<f64>>> = path
        .edges
        .iter()
        .map(|&e| offset_piece(&graph.edge(e).points, plane, distance * orientation))
        .collect();

    let mut polylines: Vec<ContourSegment> = Vec::with_capacity(pieces.len() * 2);
    for (i, piece) in pieces.iter().enumerate() {
        polylines.push(ContourSegment::open(polylines.len(), piece.clone()));

        let last = i + 1 == pieces.len();
        if last && !path.closed {
            break;
        }
        let next = &pieces[(i + 1) % pieces.len()];
        let (Some(&end), Some(&start)) = (piece.last(), next.first()) else {
            continue;
        };
        let pair = [
            ContourSegment::open(0, piece.clone()),
            ContourSegment::open(1, next.clone()),
        ];
        let crossing = find_intersections(&pair, plane, builder.epsilon)
            .iter()
            .any(|hit| hit.segments.0 != hit.segments.1);
        if !crossing {
            polylines.push(ContourSegment::open(polylines.len(), vec![end, start]));
        }
    }

    let offset_graph = ContourGraphBuilder { plane, ..*builder }.build(polylines);
    let start = offset_graph.leftmost_vertex()?;
    let traced = extract_path(&offset_graph, start, Vector2::new(0.0, -1.0));
    debug!(
        "Offset contour by {}: {} points, closed = {}",
        distance,
        traced.points.len(),
        traced.closed
    );
    Some(traced)
}
