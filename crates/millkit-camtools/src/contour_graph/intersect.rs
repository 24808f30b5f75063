//! Pairwise polyline intersection on a projection plane

use nalgebra::{Point3, Vector2};
use rayon::prelude::*;

use super::{ContourIntersection, ContourPlane, ContourSegment};

/// Cross product of two plane vectors
pub(crate) fn cross(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Parameters `(t, s)` where segments `p1-p2` and `q1-q2` cross
///
/// Parallel segments never intersect. Hits within `epsilon` (world units)
/// of an endpoint are snapped onto the segment.
pub(crate) fn segment_intersection(
    p1: &Vector2<f64>,
    p2: &Vector2<f64>,
    q1: &Vector2<f64>,
    q2: &Vector2<f64>,
    epsilon: f64,
) -> Option<(f64, f64)> {
    let r = p2 - p1;
    let s = q2 - q1;
    let denom = cross(&r, &s);
    if denom.abs() < 1e-12 {
        return None;
    }
    let qp = q1 - p1;
    let t = cross(&qp, &s) / denom;
    let u = cross(&qp, &r) / denom;

    let tol_t = epsilon / r.norm().max(f64::MIN_POSITIVE);
    let tol_u = epsilon / s.norm().max(f64::MIN_POSITIVE);
    if t < -tol_t || t > 1.0 + tol_t || u < -tol_u || u > 1.0 + tol_u {
        return None;
    }
    Some((t.clamp(0.0, 1.0), u.clamp(0.0, 1.0)))
}

/// A crossing found between two polylines before ids are assigned
#[derive(Debug, Clone, Copy)]
struct Hit {
    first_segment: usize,
    first_t: f64,
    second_segment: usize,
    second_t: f64,
    point: Point3<f64>,
}

fn segment_count(polyline: &ContourSegment) -> usize {
    let n = polyline.points.len();
    if polyline.closed {
        n
    } else {
        n.saturating_sub(1)
    }
}

fn segment_ends(polyline: &ContourSegment, i: usize) -> (Point3<f64>, Point3<f64>) {
    let n = polyline.points.len();
    (polyline.points[i], polyline.points[(i + 1) % n])
}

/// Segments of the same polyline that are too close in index to count
fn near_in_index(i: usize, j: usize, count: usize, closed: bool) -> bool {
    let d = i.abs_diff(j);
    let d = if closed { d.min(count - d) } else { d };
    d <= 2
}

fn intersect_pair(
    first: &ContourSegment,
    second: &ContourSegment,
    same: bool,
    plane: ContourPlane,
    epsilon: f64,
) -> Vec<Hit> {
    let mut hits: Vec<Hit> = Vec::new();
    let count_a = segment_count(first);
    let count_b = segment_count(second);

    for i in 0..count_a {
        let (a1, a2) = segment_ends(first, i);
        let (pa1, pa2) = (plane.project(&a1), plane.project(&a2));
        let j_start = if same { i + 1 } else { 0 };
        for j in j_start..count_b {
            if same && near_in_index(i, j, count_a, first.closed) {
                continue;
            }
            let (b1, b2) = segment_ends(second, j);
            let (pb1, pb2) = (plane.project(&b1), plane.project(&b2));
            let Some((t, u)) = segment_intersection(&pa1, &pa2, &pb1, &pb2, epsilon) else {
                continue;
            };
            let point = a1 + (a2 - a1) * t;
            let projected = plane.project(&point);
            let duplicate = hits
                .iter()
                .any(|h| (plane.project(&h.point) - projected).norm() <= epsilon);
            if !duplicate {
                hits.push(Hit {
                    first_segment: i,
                    first_t: t,
                    second_segment: j,
                    second_t: u,
                    point,
                });
            }
        }
    }
    hits
}

/// Find every crossing between (and within) the polylines
///
/// Pairs are processed in parallel but ids follow the sequential pair order,
/// so the result does not depend on scheduling.
pub fn find_intersections(
    polylines: &[ContourSegment],
    plane: ContourPlane,
    epsilon: f64,
) -> Vec<ContourIntersection> {
    let pairs: Vec<(usize, usize)> = (0..polylines.len())
        .flat_map(|a| (a..polylines.len()).map(move |b| (a, b)))
        .collect();

    let per_pair: Vec<Vec<Hit>> = pairs
        .par_iter()
        .map(|&(a, b)| intersect_pair(&polylines[a], &polylines[b], a == b, plane, epsilon))
        .collect();

    let mut out = Vec::new();
    for (&(a, b), hits) in pairs.iter().zip(per_pair) {
        for hit in hits {
            out.push(ContourIntersection {
                id: out.len(),
                segments: (polylines[a].id, polylines[b].id),
                indices: (hit.first_segment, hit.second_segment),
                params: (hit.first_t, hit.second_t),
                point: hit.point,
            });
        }
    }
    out
}
