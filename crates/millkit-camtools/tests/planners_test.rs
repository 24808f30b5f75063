use millkit_camtools::{
    BaseParameters, BasePlanner, ClearanceMap, ContourSegment, DetailParameters, DetailPlanner,
    RoughPlanner, RoughingParameters, StockFootprint,
};
use millkit_core::{
    Degenerate, Heightmap, IntersectionCurve, IntersectionFinder, IntersectionResult, Outcome,
    ParameterDomain, ParametricSurface, SearchSeed,
};
use nalgebra::{Point3, Vector3};

/// Dome of radius 1 centred on the origin, resting on y = 1
struct Dome;

impl ParametricSurface for Dome {
    fn domain(&self) -> ParameterDomain {
        ParameterDomain::new(0.0, std::f64::consts::FRAC_PI_2, 0.0, std::f64::consts::TAU)
            .with_closed(false, true)
    }

    fn point(&self, u: f64, v: f64) -> Point3<f64> {
        Point3::new(u.cos() * v.cos(), 1.0 + u.sin(), u.cos() * v.sin())
    }

    fn du(&self, u: f64, v: f64) -> Vector3<f64> {
        Vector3::new(-u.sin() * v.cos(), u.cos(), -u.sin() * v.sin())
    }

    fn dv(&self, u: f64, v: f64) -> Vector3<f64> {
        Vector3::new(-u.cos() * v.sin(), 0.0, u.cos() * v.cos())
    }
}

fn dome_heightmap() -> Heightmap {
    Heightmap::from_fn(-2.0, -2.0, 0.05, 81, 81, |x, z| {
        let r2 = x * x + z * z;
        (r2 < 1.0).then(|| 1.0 + (1.0 - r2).sqrt())
    })
}

#[test]
fn test_rough_path_stays_above_dilated_model() {
    let params = RoughingParameters {
        tool_diameter: 8.0,
        upper_plane: 1.6,
        lower_plane: 1.2,
        spacing: 0.4,
        sampling: 0.05,
        safe_height: 3.0,
        clearance_margin: 0.01,
        simplify_epsilon: 0.001,
    };
    let map = dome_heightmap();
    let footprint = StockFootprint::centered(0.0, 0.0, 3.0, 3.0);
    let path = RoughPlanner::new(params).plan(&map, &footprint).unwrap();
    let clearance = ClearanceMap::compute(&map, params.tool_radius(), params.clearance_margin);

    assert_eq!(path.first().unwrap().y, 3.0);
    assert_eq!(path.last().unwrap().y, 3.0);
    for q in &path {
        assert!(q.y >= clearance.at(q.x, q.z) - 1e-9);
        assert!(q.y >= params.lower_plane);
    }
    // the dome top forces the tool over 2.0
    assert!(path.iter().any(|q| q.y > 2.0));
}

#[test]
fn test_detail_path_on_dome() {
    let params = DetailParameters {
        tool_diameter: 4.0,
        u_steps: 20,
        v_steps: 36,
        clearance_plane: 1.2,
        safe_height: 3.0,
        simplify_epsilon: 0.0001,
        flip_normal: false,
    };
    let path = match DetailPlanner::new(params).plan(&Dome).unwrap() {
        Outcome::Produced(path) => path,
        other => panic!("unexpected {:?}", other),
    };

    let r = params.tool_radius();
    for q in path.iter().filter(|q| q.y < params.safe_height) {
        // tips lie on the dome grown by the tool radius, dropped by r
        let centre = Point3::new(q.x, q.y + r, q.z);
        let d = (centre - Point3::new(0.0, 1.0, 0.0)).norm();
        assert!((d - (1.0 + r)).abs() < 1e-9, "{q:?}");
        assert!(q.y > params.clearance_plane);
    }
}

/// Base plane silhouette made of two overlapping squares
struct SquareFinder;

impl IntersectionFinder for SquareFinder {
    fn intersect(
        &self,
        first: &dyn ParametricSurface,
        _second: &dyn ParametricSurface,
        _seed: &SearchSeed,
    ) -> IntersectionResult {
        let o = first.point(0.0, 0.0);
        let (x, z) = (o.x, o.z);
        IntersectionResult::Ok(IntersectionCurve::new(
            vec![
                Point3::new(x, 0.0, z),
                Point3::new(x + 2.0, 0.0, z),
                Point3::new(x + 2.0, 0.0, z + 2.0),
                Point3::new(x, 0.0, z + 2.0),
                Point3::new(x, 0.0, z),
            ],
            false,
        ))
    }
}

struct Marker(Point3<f64>);

impl ParametricSurface for Marker {
    fn domain(&self) -> ParameterDomain {
        ParameterDomain::unit()
    }
    fn point(&self, _u: f64, _v: f64) -> Point3<f64> {
        self.0
    }
    fn du(&self, _u: f64, _v: f64) -> Vector3<f64> {
        Vector3::x()
    }
    fn dv(&self, _u: f64, _v: f64) -> Vector3<f64> {
        Vector3::z()
    }
}

#[test]
fn test_base_paths_from_surfaces() {
    let a = Marker(Point3::new(-1.5, 0.0, -1.5));
    let b = Marker(Point3::new(-0.5, 0.0, -0.5));
    let base = Marker(Point3::origin());
    let planner = BasePlanner::new(BaseParameters {
        tool_diameter: 6.0,
        spacing: 0.5,
        safe_height: 3.0,
        cut_height: 0.2,
    });
    let footprint = StockFootprint::centered(0.0, 0.0, 5.0, 5.0);

    let paths = planner
        .plan_from_surfaces(
            &SquareFinder,
            &base,
            &[&a, &b],
            &[SearchSeed::new(8)],
            &footprint,
        )
        .unwrap()
        .produced()
        .unwrap();

    assert!(paths.facing.is_produced());
    let contour = &paths.contour;
    assert_eq!(contour.first().unwrap().y, 3.0);
    assert!(contour.first().unwrap().x < footprint.min_x);
    assert_eq!(contour.last().unwrap().y, 3.0);
    for q in &contour[1..contour.len() - 1] {
        assert_eq!(q.y, 0.2);
    }
    // the contour keeps the tool radius away from the silhouette
    for q in &contour[2..contour.len() - 1] {
        let outside_a = q.x <= -1.5 - 0.3 + 1e-9
            || q.x >= 0.5 + 0.3 - 1e-9
            || q.z <= -1.5 - 0.3 + 1e-9
            || q.z >= 0.5 + 0.3 - 1e-9;
        let outside_b = q.x <= -0.5 - 0.3 + 1e-9
            || q.x >= 1.5 + 0.3 - 1e-9
            || q.z <= -0.5 - 0.3 + 1e-9
            || q.z >= 1.5 + 0.3 - 1e-9;
        assert!(outside_a && outside_b, "{q:?}");
    }
}

#[test]
fn test_base_skips_without_crossings() {
    let planner = BasePlanner::new(BaseParameters::default());
    let footprint = StockFootprint::centered(0.0, 0.0, 15.0, 15.0);
    let outcome = planner
        .plan(
            vec![ContourSegment::closed(
                0,
                vec![
                    Point3::new(0.0, 0.0, 0.0),
                    Point3::new(1.0, 0.0, 0.0),
                    Point3::new(1.0, 0.0, 1.0),
                ],
            )],
            &footprint,
        )
        .unwrap();
    assert_eq!(outcome, Outcome::Skipped(Degenerate::NoIntersectionsFound));
}
