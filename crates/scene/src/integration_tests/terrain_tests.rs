use crate::settings::ViewerCommand;
use crate::test_harness::TestScene;

use super::{block, flat_terrain, LA, PARIS};

// ====================================================================
// Terrain mode
// ====================================================================

fn terrain_scene(height: f32) -> TestScene {
    let mut scene = TestScene::builder()
        .with_location("la", LA, block(LA))
        .with_terrain(flat_terrain(height))
        .with_location("paris", PARIS, block(PARIS))
        .build();
    scene.wait_for_load();
    scene.tick_until("terrain surface", |world| {
        world.resource::<crate::SceneState>().terrain.is_some()
    });
    scene
}

#[test]
fn test_terrain_available_for_location_with_raster() {
    let scene = terrain_scene(1.5);
    assert!(scene.settings().terrain_available);
    assert!(!scene.settings().terrain);
    assert!(!scene.scene().terrain_mode);
}

#[test]
fn test_terrain_toggle_lifts_buildings_to_sampled_height() {
    let mut scene = terrain_scene(1.5);
    scene.wait_for_growth();
    let flat_heights: Vec<f32> = scene
        .scene()
        .buildings
        .iter()
        .map(|b| b.mesh.bounds().size().y)
        .collect();

    scene.send(ViewerCommand::SetTerrain(true));
    scene.tick(1);

    assert!(scene.settings().terrain);
    let state = scene.scene();
    assert!(state.terrain_mode);
    for (building, height) in state.buildings.iter().zip(&flat_heights) {
        let bounds = building.mesh.bounds();
        assert!((bounds.min.y - 1.5).abs() < 1e-4, "base {}", bounds.min.y);
        assert!((bounds.size().y - height).abs() < 1e-5);
    }
    let (batch, _) = state.batch().unwrap();
    assert!((batch.bounds().min.y - 1.5).abs() < 1e-4);

    // Growth restarts from zero.
    let growth = &scene.growth().buildings.state;
    assert!(growth.is_growing());
    assert!(growth.progress() < 0.05);
}

#[test]
fn test_terrain_toggle_drapes_roads_and_trees() {
    let mut scene = terrain_scene(1.5);
    scene.send(ViewerCommand::SetTerrain(true));
    scene.tick(1);

    let state = scene.scene();
    for road in state.roads() {
        assert!(road.points.iter().all(|p| (p.y - 1.5).abs() < 1e-4));
    }
    let trees = state.trees().unwrap();
    let (_, tree) = trees.iter().next().unwrap();
    assert!((tree.base - 1.5).abs() < 1e-4);
}

#[test]
fn test_terrain_off_returns_to_flat() {
    let mut scene = terrain_scene(2.0);
    scene.send(ViewerCommand::SetTerrain(true));
    scene.tick(1);
    scene.send(ViewerCommand::SetTerrain(false));
    scene.tick(1);

    let state = scene.scene();
    assert!(!state.terrain_mode);
    for building in &state.buildings {
        assert!(building.mesh.bounds().min.y.abs() < 1e-5);
    }
    assert!(state.roads().all(|r| r.points.iter().all(|p| p.y == 0.0)));
}

#[test]
fn test_terrain_toggle_ignored_without_raster() {
    let mut scene = TestScene::with_features(PARIS, block(PARIS));
    scene.wait_for_load();
    assert!(!scene.settings().terrain_available);

    scene.send(ViewerCommand::SetTerrain(true));
    scene.tick(1);
    assert!(!scene.settings().terrain);
    assert!(!scene.scene().terrain_mode);
}

#[test]
fn test_switch_to_location_without_raster_forces_flat() {
    let mut scene = terrain_scene(1.5);
    scene.send(ViewerCommand::SetTerrain(true));
    scene.tick(1);
    scene.send(ViewerCommand::SelectLocation("paris".into()));
    scene.tick(1);
    scene.wait_for_load();

    let settings = scene.settings();
    assert_eq!(settings.location, "paris");
    assert!(!settings.terrain_available);
    assert!(!settings.terrain);
    let state = scene.scene();
    assert!(!state.terrain_mode);
    assert!(state.terrain.is_none());
    for building in &state.buildings {
        assert!(building.mesh.bounds().min.y.abs() < 1e-5);
    }
}
