use std::sync::Arc;

use road_engine::RoadEngine;
use road_engine::geom::{CrossSectionProfile, Curve3, Point3, Vec3};
use road_engine::road::{DEFAULT_LOOP_MS, RoadConfig, RoadError, RoadSurface};

fn four_point_surface(segments: usize) -> RoadSurface {
    RoadSurface::from_points(
        vec![
            Point3::new(-25.0, 0.0, -25.0),
            Point3::new(-4.0, 2.0, -9.0),
            Point3::new(4.0, 1.0, -6.0),
            Point3::new(6.0, 0.0, 0.0),
        ],
        vec![-0.5, 0.0, 0.5],
        segments,
    )
    .expect("valid surface")
}

#[test]
fn engine_builds_default_road() {
    let mut engine = RoadEngine::from_config(RoadConfig::default()).expect("default road");
    assert_eq!(engine.surface().segments(), 1000);
    assert_eq!(engine.surface().tracks(), 3);

    let mesh = engine.mesh().expect("mesh");
    assert_eq!(mesh.vertex_count(), 1001 * 4);
    assert_eq!(mesh.positions_f32().len(), 1001 * 4 * 3);
    assert_eq!(mesh.uvs_f32().len(), 1001 * 4 * 2);
    assert_eq!(mesh.groups.len(), 3000);
    assert!(mesh.validate().is_ok());
}

#[test]
fn surface_reuses_mesh_until_changed() {
    let mut surface = four_point_surface(4);
    assert!(surface.cached_mesh().is_none());

    let first = surface.mesh().unwrap();
    let second = surface.mesh().unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let stats = surface.cache_stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.entries, 1);

    surface.set_segments(8).unwrap();
    assert!(surface.cached_mesh().is_none());
    let rebuilt = surface.mesh().unwrap();
    assert!(!Arc::ptr_eq(&first, &rebuilt));
    assert_eq!(rebuilt.vertex_count(), 9 * 3);
    assert_eq!(first.vertex_count(), 5 * 3);
    assert_eq!(surface.cache_stats().invalidations, 1);
}

#[test]
fn unchanged_setters_keep_the_cache() {
    let mut surface = four_point_surface(4);
    let first = surface.mesh().unwrap();
    let revision = surface.revision();

    surface.set_segments(4).unwrap();
    surface
        .set_profile(CrossSectionProfile::new(vec![-0.5, 0.0, 0.5]).unwrap())
        .unwrap();
    assert_eq!(surface.revision(), revision);
    assert!(Arc::ptr_eq(&first, &surface.mesh().unwrap()));
}

#[test]
fn profile_change_rebuilds_with_new_tracks() {
    let mut surface = four_point_surface(4);
    let _ = surface.mesh().unwrap();

    surface.set_profile(CrossSectionProfile::default()).unwrap();
    assert_eq!(surface.tracks(), 3);
    let mesh = surface.mesh().unwrap();
    assert_eq!(mesh.vertex_count(), 5 * 4);
    assert_eq!(mesh.groups.len(), 4 * 3);
}

#[test]
fn rejected_setters_leave_the_surface_untouched() {
    let mut surface = four_point_surface(4);
    let revision = surface.revision();
    assert!(matches!(surface.set_segments(0), Err(RoadError::Ribbon(_))));
    assert!(matches!(
        surface.set_reference_up(Vec3::ZERO),
        Err(RoadError::Ribbon(_))
    ));
    assert_eq!(surface.segments(), 4);
    assert_eq!(surface.revision(), revision);
}

#[test]
fn pose_starts_at_first_control_point() {
    let surface = four_point_surface(4);
    let pose = surface.pose_at(0.0);
    assert_eq!(pose.position, Point3::new(-25.0, 0.0, -25.0));
    assert_eq!(pose.position, surface.curve().point_at(0.0));
    assert_eq!(pose.forward, surface.curve().tangent_at(0.0));
    assert!((pose.forward.length() - 1.0).abs() < 1e-9);
    assert!(pose.forward.dot(pose.lateral).abs() < 1e-9);
    assert!(pose.up.y > 0.0);

    let end = surface.pose_at_arc(1.0);
    assert!(end.position.distance_to(Point3::new(6.0, 0.0, 0.0)) < 1e-9);
}

#[test]
fn pose_follows_the_curve_mid_span() {
    let surface = four_point_surface(4);
    let curve = surface.curve();

    for t in [0.25, 0.4, 0.9] {
        let pose = surface.pose_at(t);
        assert_eq!(pose.parameter, t);
        assert_eq!(pose.position, curve.point_at(t));
        assert_eq!(pose.forward, curve.tangent_at(t));
        assert!(pose.forward.dot(pose.lateral).abs() < 1e-9);
    }
}

#[test]
fn camera_rides_above_the_road() {
    let engine = RoadEngine::from_config(RoadConfig::default()).unwrap();
    let camera = engine.camera_placement_at_time(DEFAULT_LOOP_MS * 0.25);
    let pose = engine.surface().pose_at_arc(0.25);

    assert!((camera.eye.distance_to(pose.position) - 0.3).abs() < 1e-9);
    assert!(camera.eye.distance_to(camera.target) > 0.0);
    assert!(camera.view_transform().is_some());

    let wrapped = engine.camera_placement_at_time(DEFAULT_LOOP_MS * 1.25);
    assert!(wrapped.eye.distance_to(camera.eye) < 1e-6);
}

#[test]
fn config_document_drives_the_engine() {
    let xml = r#"
        <road segments="12" loop-ms="1000">
          <procedural count="8" seed="42"/>
          <profile>
            <offset>-1</offset>
            <offset>1</offset>
          </profile>
        </road>
    "#;
    let config = RoadConfig::from_xml_str(xml).expect("config parses");
    let mut engine = RoadEngine::from_config(config).expect("engine builds");
    assert_eq!(engine.config().loop_ms, 1000.0);

    let mesh = engine.mesh().unwrap();
    assert_eq!(mesh.vertex_count(), 13 * 2);
    assert_eq!(mesh.groups.len(), 12);
    assert!(mesh.groups.iter().all(|g| g.material_slot == 0));
    assert!(mesh.validate().is_ok());
}

#[test]
fn config_with_too_few_points_is_rejected() {
    let xml = r#"
        <road>
          <curve>
            <point x="0" y="0" z="0"/>
            <point x="1" y="0" z="0"/>
          </curve>
        </road>
    "#;
    let config = RoadConfig::from_xml_str(xml).expect("scalars are valid");
    assert!(matches!(
        RoadEngine::from_config(config),
        Err(RoadError::Curve(_))
    ));
}
