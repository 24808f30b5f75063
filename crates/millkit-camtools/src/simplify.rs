//! Douglas-Peucker polyline reduction
//!
//! A point survives when it lies strictly farther than `epsilon` from the
//! chord of the range it splits. Running the simplifier on its own output
//! with the same epsilon returns that output unchanged.

use nalgebra::Point3;
use tracing::debug;

/// Distance from `p` to the segment `a`-`b`
fn distance_to_segment(p: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 == 0.0 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Mark the points Douglas-Peucker keeps
pub fn simplify_mask(points: &[Point3<f64>], epsilon: f64) -> Vec<bool> {
    let n = points.len();
    let mut keep = vec![false; n];
    if n == 0 {
        return keep;
    }
    keep[0] = true;
    keep[n - 1] = true;

    let mut ranges = vec![(0usize, n - 1)];
    while let Some((first, last)) = ranges.pop() {
        if last <= first + 1 {
            continue;
        }
        let mut max_dist = 0.0;
        let mut split = first;
        for i in first + 1..last {
            let d = distance_to_segment(&points[i], &points[first], &points[last]);
            if d > max_dist {
                max_dist = d;
                split = i;
            }
        }
        if max_dist > epsilon {
            keep[split] = true;
            ranges.push((first, split));
            ranges.push((split, last));
        }
    }
    keep
}

/// Reduce a polyline, keeping both endpoints
pub fn simplify(points: &[Point3<f64>], epsilon: f64) -> Vec<Point3<f64>> {
    let keep = simplify_mask(points, epsilon);
    let out: Vec<_> = points
        .iter()
        .zip(&keep)
        .filter_map(|(p, &k)| k.then_some(*p))
        .collect();
    debug!(
        "Simplified {} points to {} (epsilon {})",
        points.len(),
        out.len(),
        epsilon
    );
    out
}
