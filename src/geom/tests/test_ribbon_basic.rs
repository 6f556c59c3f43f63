use crate::geom::{
    CatmullRomCurve3, CrossSectionProfile, Curve3, DEFAULT_ARC_LENGTH_DIVISIONS, Point3,
    RibbonError, RibbonOptions, Tolerance, Vec3, build_ribbon_mesh, grid_index,
};

fn sample_curve() -> CatmullRomCurve3 {
    CatmullRomCurve3::centripetal(vec![
        Point3::new(-25.0, 0.0, -25.0),
        Point3::new(-4.0, 2.0, -9.0),
        Point3::new(4.0, 1.0, -6.0),
        Point3::new(6.0, 0.0, 0.0),
    ])
    .unwrap()
}

fn options(segments: usize, tracks: usize) -> RibbonOptions {
    RibbonOptions {
        segments,
        tracks,
        ..RibbonOptions::default()
    }
}

#[test]
fn ribbon_counts_match_grid() {
    let profile = CrossSectionProfile::new(vec![-0.5, 0.0, 0.5]).unwrap();
    let (mesh, diag) = build_ribbon_mesh(&sample_curve(), &profile, options(4, 2))
        .expect("ribbon should build");

    assert_eq!(mesh.vertex_count(), 15);
    assert_eq!(mesh.indices.len(), 48);
    assert_eq!(mesh.groups.len(), 8);
    assert!(mesh.groups.iter().all(|g| g.count == 6));
    let slots: Vec<u32> = mesh.groups.iter().map(|g| g.material_slot).collect();
    assert_eq!(slots, vec![0, 1, 0, 1, 0, 1, 0, 1]);
    assert_eq!(mesh.material_slot_count(), 2);

    assert!(mesh.validate().is_ok());
    assert_eq!(diag.vertex_count, 15);
    assert_eq!(diag.triangle_count, 16);
    assert_eq!(diag.group_count, 8);
    assert!(diag.is_clean(), "{diag}");
}

#[test]
fn ribbon_is_deterministic() {
    let profile = CrossSectionProfile::default();
    let a = build_ribbon_mesh(&sample_curve(), &profile, options(32, 3)).unwrap();
    let b = build_ribbon_mesh(&sample_curve(), &profile, options(32, 3)).unwrap();
    assert_eq!(a.0, b.0);
}

#[test]
fn ribbon_vertices_follow_the_frame() {
    let curve = sample_curve();
    let profile = CrossSectionProfile::new(vec![-0.5, 0.0, 0.5]).unwrap();
    let segments = 16;
    let (mesh, _) = build_ribbon_mesh(&curve, &profile, options(segments, 2)).unwrap();
    let tol = Tolerance::new(1e-9);

    for j in 0..=segments {
        let t = j as f64 / segments as f64;
        let left = Point3::from_array(mesh.positions[grid_index(2, j, 0)]);
        let center = Point3::from_array(mesh.positions[grid_index(2, j, 1)]);
        let right = Point3::from_array(mesh.positions[grid_index(2, j, 2)]);

        assert!(tol.approx_eq_point3(center, curve.point_at(t)));
        assert!(tol.approx_eq_f64(left.distance_to(right), 1.0));
        // Flat banking: the cross-section never tilts.
        assert_eq!(left.y, center.y);
        assert_eq!(right.y, center.y);

        let normal = Vec3::from_array(mesh.normals[grid_index(2, j, 0)]);
        assert!(tol.approx_eq_f64(normal.length(), 1.0));
        assert!(normal.dot(right - left).abs() < 1e-9);
    }
}

#[test]
fn ribbon_uvs_follow_arc_length() {
    let curve = sample_curve();
    let profile = CrossSectionProfile::default();
    let segments = 20;
    let (mesh, diag) = build_ribbon_mesh(&curve, &profile, options(segments, 3)).unwrap();
    let tracks = 3;

    assert_eq!(mesh.uvs[0], [0.0, 0.0]);
    let mut prev_u = 0.0;
    for j in 0..=segments {
        let u = mesh.uvs[grid_index(tracks, j, 0)][0];
        assert!(u >= prev_u);
        prev_u = u;
        for i in 0..=tracks {
            let uv = mesh.uvs[grid_index(tracks, j, i)];
            assert_eq!(uv[0], u);
            assert_eq!(uv[1], i as f64 / tracks as f64);
        }
    }

    // The last u is the chord length at `segments` steps over the length at
    // the curve's own resolution. Coarser sampling falls short of 1.
    let expected_last = curve.sample_lengths(segments).total() / curve.length();
    assert!((prev_u - expected_last).abs() < 1e-12);
    assert!(prev_u < 1.0 && prev_u > 0.95);
    assert!((diag.curve_length - curve.length()).abs() < 1e-12);
}

#[test]
fn refined_ribbon_uvs_reach_one() {
    let curve = sample_curve();
    let segments = DEFAULT_ARC_LENGTH_DIVISIONS * 5;
    let (mesh, _) =
        build_ribbon_mesh(&curve, &CrossSectionProfile::default(), options(segments, 3)).unwrap();

    // A refinement of the curve's own divisions sums longer chords.
    let last_u = mesh.uvs[grid_index(3, segments, 0)][0];
    let expected_last = curve.sample_lengths(segments).total() / curve.length();
    assert!((last_u - expected_last).abs() < 1e-12);
    assert!(last_u >= 1.0 - 1e-12 && last_u < 1.01);
}

#[test]
fn ribbon_faces_point_up_on_flat_road() {
    let curve = CatmullRomCurve3::centripetal(
        (0..4).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect(),
    )
    .unwrap();
    let profile = CrossSectionProfile::new(vec![-0.5, 0.5]).unwrap();
    let (mesh, _) = build_ribbon_mesh(&curve, &profile, options(3, 1)).unwrap();

    for tri in mesh.indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Point3::from_array(mesh.positions[i as usize]));
        let face_normal = (b - a).cross(c - a);
        assert!(face_normal.y > 0.0, "triangle {tri:?} faces {face_normal:?}");
    }
}

#[test]
fn ribbon_survives_coincident_control_points() {
    let curve = CatmullRomCurve3::centripetal(vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(4.0, 0.0, 0.0),
        Point3::new(8.0, 0.0, 0.0),
    ])
    .unwrap();
    let profile = CrossSectionProfile::new(vec![-0.5, 0.0, 0.5]).unwrap();
    let (mesh, diag) = build_ribbon_mesh(&curve, &profile, options(6, 2)).unwrap();

    assert!(mesh.validate().is_ok());
    assert!(mesh.normals.iter().flatten().all(|c| c.is_finite()));
    assert!(diag.zero_tangent_count >= 1);
    assert!(!diag.is_clean());

    // First row uses the chord towards the next distinct control point (+X),
    // so the lateral axis is +Z.
    let left = Point3::from_array(mesh.positions[0]);
    assert_eq!(left, Point3::new(0.0, 0.0, -0.5));
}

#[test]
fn ribbon_rejects_bad_inputs() {
    let curve = sample_curve();
    let profile = CrossSectionProfile::default();

    assert_eq!(
        build_ribbon_mesh(&curve, &profile, options(0, 3)).unwrap_err(),
        RibbonError::ZeroSegments
    );
    assert_eq!(
        build_ribbon_mesh(&curve, &profile, options(4, 0)).unwrap_err(),
        RibbonError::ZeroTracks
    );
    assert_eq!(
        build_ribbon_mesh(&curve, &profile, options(4, 2)).unwrap_err(),
        RibbonError::ProfileMismatch { tracks: 2, offsets: 4 }
    );
}

#[test]
fn default_road_builds_clean() {
    let curve = CatmullRomCurve3::centripetal(vec![
        Point3::new(-25.0, 0.0, -25.0),
        Point3::new(-4.0, 2.0, -9.0),
        Point3::new(4.0, 1.0, -6.0),
        Point3::new(6.0, 0.0, 0.0),
        Point3::new(-3.0, 1.0, 1.0),
        Point3::new(-11.0, 0.0, 6.0),
        Point3::new(-12.0, 1.0, 1.0),
        Point3::new(-7.0, 1.0, -3.0),
        Point3::new(7.0, 8.0, -9.0),
        Point3::new(13.0, 2.0, -12.0),
        Point3::new(10.0, 1.0, -20.0),
    ])
    .unwrap();
    let (mesh, diag) =
        build_ribbon_mesh(&curve, &CrossSectionProfile::default(), RibbonOptions::default()).unwrap();

    assert_eq!(mesh.vertex_count(), 1001 * 4);
    assert_eq!(mesh.indices.len(), 1000 * 3 * 6);
    assert_eq!(mesh.groups.len(), 3000);
    assert!(mesh.validate().is_ok());
    assert_eq!(diag.degenerate_event_count(), 0);
}
