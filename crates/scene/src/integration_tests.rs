//! Integration tests for the viewer core using the `TestScene` harness.
//!
//! These tests spin up a headless Bevy App with `ScenePlugin`, serve datasets
//! from memory and verify loading, rebuilds and animation end to end.

mod animation_tests;
mod terrain_tests;

use bevy::math::Vec2;
use serde_json::json;

use crate::arena::SceneGroup;
use crate::coords::GeoCoord;
use crate::features::{FeatureGeometry, GeoFeature};
use crate::rebuild::LoadStatus;
use crate::settings::ViewerCommand;
use crate::terrain::TerrainSurface;
use crate::test_harness::TestScene;

pub(crate) const LA: GeoCoord = GeoCoord::new(-118.326019, 34.102646);
pub(crate) const PARIS: GeoCoord = GeoCoord::new(2.29541, 48.85726);

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub(crate) fn offset(center: GeoCoord, dlon: f64, dlat: f64) -> GeoCoord {
    GeoCoord::new(center.lon + dlon, center.lat + dlat)
}

/// Axis-aligned square footprint with its south-west corner at `corner`.
pub(crate) fn square_building(corner: GeoCoord, size: f64, props: serde_json::Value) -> GeoFeature {
    GeoFeature::new(
        FeatureGeometry::Polygon(vec![vec![
            corner,
            offset(corner, size, 0.0),
            offset(corner, size, size),
            offset(corner, 0.0, size),
            corner,
        ]]),
        props.as_object().cloned(),
    )
}

pub(crate) fn road(points: Vec<GeoCoord>, highway: &str) -> GeoFeature {
    GeoFeature::new(
        FeatureGeometry::LineString(points),
        json!({ "highway": highway }).as_object().cloned(),
    )
}

pub(crate) fn tree(at: GeoCoord, height: f64) -> GeoFeature {
    GeoFeature::new(
        FeatureGeometry::Point(at),
        json!({ "natural": "tree", "height": height }).as_object().cloned(),
    )
}

/// A small block: two buildings, a long and a short road, one pond, two trees.
pub(crate) fn block(center: GeoCoord) -> Vec<GeoFeature> {
    vec![
        square_building(center, 0.0003, json!({ "building": "yes", "building:levels": 3 })),
        square_building(
            offset(center, 0.001, 0.0),
            0.0002,
            json!({ "building": "apartments", "name": "Corner" }),
        ),
        road(vec![offset(center, -0.001, -0.001), offset(center, 0.002, -0.001)], "primary"),
        road(vec![offset(center, -0.001, 0.001), offset(center, -0.0008, 0.001)], "service"),
        GeoFeature::new(
            FeatureGeometry::Polygon(vec![vec![
                offset(center, -0.003, 0.0),
                offset(center, -0.002, 0.0),
                offset(center, -0.002, 0.001),
            ]]),
            json!({ "natural": "water" }).as_object().cloned(),
        ),
        tree(offset(center, -0.0015, -0.0005), 8.0),
        tree(offset(center, 0.0001, 0.0001), 6.0),
    ]
}

pub(crate) fn flat_terrain(height: f32) -> TerrainSurface {
    let (rows, cols) = (40, 40);
    TerrainSurface::from_heights(
        rows,
        cols,
        Vec2::ZERO,
        Vec2::new(40.0, 40.0),
        vec![height; rows * cols],
    )
}

// ===========================================================================
// 1. Harness bootstrap
// ===========================================================================

#[test]
fn test_initial_load_composes_scene() {
    let mut scene = TestScene::with_features(LA, block(LA));
    scene.wait_for_load();

    assert_eq!(scene.status(), &LoadStatus::Ready);
    assert_eq!(scene.settings().location, "test");
    let state = scene.scene();
    assert_eq!(state.center, LA);
    assert_eq!(state.buildings.len(), 2);
    assert_eq!(state.arena.len(SceneGroup::Buildings), 1);
    assert_eq!(state.arena.len(SceneGroup::Roads), 2);
    assert_eq!(state.arena.len(SceneGroup::WaterShader), 1);
    assert_eq!(state.arena.len(SceneGroup::WaterSimple), 1);
    assert!(scene.growth().buildings.state.is_growing());
}

#[test]
fn test_empty_dataset_loads_empty_scene() {
    let mut scene = TestScene::with_features(LA, Vec::new());
    scene.wait_for_load();
    assert_eq!(scene.status(), &LoadStatus::Ready);
    assert!(scene.scene().buildings.is_empty());
    assert!(scene.scene().has_batch());
}

#[test]
fn test_missing_dataset_reports_failure() {
    let mut scene = TestScene::builder().with_missing_dataset("gone", LA).build();
    scene.wait_for_load();
    assert!(matches!(scene.status(), LoadStatus::Failed(_)));
    assert!(!scene.rebuild().is_busy());
    assert!(scene.scene().arena.is_empty());
}

// ===========================================================================
// 2. Loading
// ===========================================================================

#[test]
fn test_triangle_building_extruded_by_levels() {
    let triangle = GeoFeature::new(
        FeatureGeometry::Polygon(vec![vec![
            LA,
            offset(LA, 0.0005, 0.0),
            offset(LA, 0.0, 0.0005),
            LA,
        ]]),
        json!({ "building": "yes", "building:levels": 2 }).as_object().cloned(),
    );
    let mut scene = TestScene::with_features(LA, vec![triangle]);
    scene.wait_for_load();

    let state = scene.scene();
    assert_eq!(state.buildings.len(), 1);
    let bounds = state.buildings[0].mesh.bounds();
    assert!((bounds.size().y - 0.10).abs() < 1e-5, "height {}", bounds.size().y);
    let (batch, _) = state.batch().unwrap();
    assert_eq!(batch.vertex_count(), state.buildings[0].mesh.vertex_count());
}

#[test]
fn test_tree_inside_building_is_rejected() {
    let mut scene = TestScene::with_features(LA, block(LA));
    scene.wait_for_load();

    let state = scene.scene();
    let trees = state.trees().unwrap();
    assert_eq!(trees.capacity(), 7);
    assert_eq!(trees.count(), 1);
    assert!(trees.get(5).is_some());
    assert!(trees.get(6).is_none(), "tree under the building must be rejected");
    assert_eq!(state.stats.rejected_trees, 1);
}

#[test]
fn test_overlay_only_for_long_roads() {
    let mut scene = TestScene::with_features(LA, block(LA));
    scene.wait_for_load();
    let state = scene.scene();
    // ~276 m primary gets a pulse; ~18 m service road does not.
    assert_eq!(state.arena.len(SceneGroup::AnimatedRoads), 1);
    assert_eq!(state.stats.overlays, 1);
}

#[test]
fn test_excluded_highways_are_not_drawn() {
    let features = vec![
        road(vec![LA, offset(LA, 0.002, 0.0)], "footway"),
        road(vec![LA, offset(LA, 0.0, 0.002)], "path"),
        road(vec![LA, offset(LA, 0.002, 0.002)], "residential"),
    ];
    let mut scene = TestScene::with_features(LA, features);
    scene.wait_for_load();
    assert_eq!(scene.scene().arena.len(SceneGroup::Roads), 1);
}

// ===========================================================================
// 3. Panel commands
// ===========================================================================

#[test]
fn test_camera_angles_are_clamped() {
    let mut scene = TestScene::with_features(LA, Vec::new());
    scene.send(ViewerCommand::SetCameraAngles {
        pitch: 120.0,
        yaw: -15.0,
    });
    scene.tick(1);
    assert_eq!(scene.settings().pitch, 80.0);
    assert_eq!(scene.settings().yaw, 0.0);

    scene.send(ViewerCommand::SetCameraAngles {
        pitch: 30.0,
        yaw: 400.0,
    });
    scene.tick(1);
    assert_eq!(scene.settings().pitch, 30.0);
    assert_eq!(scene.settings().yaw, 360.0);
}

#[test]
fn test_transparency_restarts_growth() {
    let mut scene = TestScene::with_features(LA, block(LA));
    scene.wait_for_load();
    scene.wait_for_growth();
    assert_eq!(scene.growth().buildings.state.progress(), 1.0);

    scene.send(ViewerCommand::SetTransparency(1.5));
    scene.tick(1);
    assert_eq!(scene.settings().transparency, 1.0);
    let growth = &scene.growth().buildings;
    assert!(growth.state.is_growing());
    assert!(growth.state.progress() < 0.05);
    assert_eq!(growth.target_opacity, 0.0);
}

#[test]
fn test_toggles_update_settings() {
    let mut scene = TestScene::with_features(LA, Vec::new());
    scene.send(ViewerCommand::SetRoadAnimation(false));
    scene.send(ViewerCommand::SetMap2d(true));
    scene.send(ViewerCommand::SetDepthOfField(true));
    scene.send(ViewerCommand::SetRenderedLighting(false));
    scene.send(ViewerCommand::SetRenderedWater(false));
    scene.tick(1);
    let s = scene.settings();
    assert!(!s.road_animation);
    assert!(s.map_2d);
    assert!(s.depth_of_field);
    assert!(!s.rendered_lighting);
    assert!(!s.rendered_water);
}
