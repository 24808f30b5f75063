use millkit_camtools::contour_graph::{
    extract_path, offset_contour, ContourGraphBuilder, ContourPlane, ContourSegment,
};
use nalgebra::{Point3, Vector2};
use proptest::prelude::*;
use std::collections::HashSet;

fn p(x: f64, z: f64) -> Point3<f64> {
    Point3::new(x, 0.0, z)
}

/// Closed polygon approximating a circle
fn circle(id: usize, cx: f64, cz: f64, r: f64, n: usize) -> ContourSegment {
    let points = (0..n)
        .map(|i| {
            let t = std::f64::consts::TAU * i as f64 / n as f64;
            p(cx + r * t.cos(), cz + r * t.sin())
        })
        .collect();
    ContourSegment::closed(id, points)
}

#[test]
fn test_three_circles_outer_boundary() {
    let builder = ContourGraphBuilder::new(ContourPlane::XZ);
    let graph = builder.build(vec![
        circle(0, 0.0, 0.0, 1.0, 48),
        circle(1, 1.2, 0.0, 1.0, 48),
        circle(2, 0.6, 1.0, 1.0, 48),
    ]);
    assert!(!graph.is_empty());

    let start = graph.leftmost_vertex().unwrap();
    let boundary = extract_path(&graph, start, Vector2::new(0.0, -1.0));
    assert!(boundary.closed);
    assert!(boundary.signed_area2(&graph) > 0.0);

    // every boundary point lies on or outside each circle
    let centres = [(0.0, 0.0), (1.2, 0.0), (0.6, 1.0)];
    for q in &boundary.points {
        for &(cx, cz) in &centres {
            let d = ((q.x - cx).powi(2) + (q.z - cz).powi(2)).sqrt();
            assert!(d > 1.0 - 0.01, "{q:?} inside circle at ({cx}, {cz})");
        }
    }

    let offset = offset_contour(&graph, &boundary, 0.2, &builder).unwrap();
    assert!(offset.closed);
    for q in &offset.points {
        for &(cx, cz) in &centres {
            let d = ((q.x - cx).powi(2) + (q.z - cz).powi(2)).sqrt();
            assert!(d > 1.15, "{q:?} too close to circle at ({cx}, {cz})");
        }
    }
}

#[test]
fn test_xy_plane_graph() {
    let graph = ContourGraphBuilder::new(ContourPlane::XY).build(vec![
        ContourSegment::closed(
            0,
            vec![
                Point3::new(0.0, 0.0, 5.0),
                Point3::new(2.0, 0.0, 5.0),
                Point3::new(2.0, 2.0, 5.0),
                Point3::new(0.0, 2.0, 5.0),
            ],
        ),
        ContourSegment::closed(
            1,
            vec![
                Point3::new(1.0, 1.0, 5.0),
                Point3::new(3.0, 1.0, 5.0),
                Point3::new(3.0, 3.0, 5.0),
                Point3::new(1.0, 3.0, 5.0),
            ],
        ),
    ]);
    let path = extract_path(&graph, graph.leftmost_vertex().unwrap(), Vector2::new(0.0, -1.0));
    assert!(path.closed);
    assert_eq!(path.points.len(), 8);
    assert!(path.points.iter().all(|q| q.z == 5.0));
}

fn polyline_strategy() -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((-5.0f64..5.0, -5.0f64..5.0), 2..6)
}

proptest! {
    #[test]
    fn prop_walk_never_reuses_an_edge(
        lines in prop::collection::vec(polyline_strategy(), 1..5),
        hint_angle in 0.0f64..std::f64::consts::TAU,
    ) {
        let polylines: Vec<ContourSegment> = lines
            .iter()
            .enumerate()
            .map(|(id, pts)| ContourSegment::open(id, pts.iter().map(|&(x, z)| p(x, z)).collect()))
            .collect();
        let graph = ContourGraphBuilder::new(ContourPlane::XZ).build(polylines);
        let hint = Vector2::new(hint_angle.cos(), hint_angle.sin());

        for start in 0..graph.vertices.len() {
            let path = extract_path(&graph, start, hint);
            prop_assert!(path.edges.len() * 2 <= graph.edges.len());

            let mut seen = HashSet::new();
            for &e in &path.edges {
                prop_assert!(seen.insert(e));
                prop_assert!(seen.insert(graph.edge(e).twin));
            }
            for pair in path.edges.windows(2) {
                prop_assert_eq!(graph.edge(pair[0]).key.to, graph.edge(pair[1]).key.from);
            }
            if path.closed {
                let first = graph.edge(path.edges[0]).key.from;
                let last = graph.edge(*path.edges.last().unwrap()).key.to;
                prop_assert_eq!(first, last);
            }
        }
    }
}
