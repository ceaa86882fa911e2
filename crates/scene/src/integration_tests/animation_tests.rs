use crate::arena::{SceneGroup, SceneObject};
use crate::config::OVERLAY_DASH_SPEED;
use crate::growth::{GrowthPhase, TREE_LEAVES_OPACITY};
use crate::road_overlay::RoadOverlay;
use crate::settings::ViewerCommand;
use crate::test_harness::TestScene;

use super::{block, LA};

fn overlay(scene: &TestScene) -> RoadOverlay {
    match scene.scene().arena.group(SceneGroup::AnimatedRoads).first() {
        Some(SceneObject::Overlay(o)) => o.clone(),
        other => panic!("expected an overlay, got {other:?}"),
    }
}

fn loaded() -> TestScene {
    let mut scene = TestScene::with_features(LA, block(LA));
    scene.wait_for_load();
    scene
}

// ====================================================================
// Visibility pause
// ====================================================================

#[test]
fn test_hidden_window_freezes_animation() {
    let mut scene = loaded();
    scene.tick(5);
    scene.set_visible(false);
    scene.tick(1);

    let steps = scene.clock().steps();
    let elapsed = scene.clock().elapsed();
    let progress = scene.growth().buildings.state.progress();
    let dash = overlay(&scene).dash;

    scene.tick(30);
    assert!(scene.clock().is_paused());
    assert_eq!(scene.clock().steps(), steps);
    assert_eq!(scene.clock().elapsed(), elapsed);
    assert_eq!(scene.growth().buildings.state.progress(), progress);
    assert_eq!(overlay(&scene).dash, dash);

    scene.set_visible(true);
    scene.tick(1);
    assert_eq!(scene.clock().steps(), steps + 1);
    assert!(scene.clock().elapsed() >= elapsed);
    assert!(scene.growth().buildings.state.progress() > progress);
}

// ====================================================================
// Road overlay
// ====================================================================

#[test]
fn test_overlay_dash_advances_each_step() {
    let mut scene = loaded();
    let before = overlay(&scene).dash;
    scene.tick(10);
    let after = overlay(&scene).dash;
    assert!((after - before - 10.0 * OVERLAY_DASH_SPEED).abs() < 1e-4);
}

#[test]
fn test_overlay_frozen_when_road_animation_off() {
    let mut scene = loaded();
    scene.send(ViewerCommand::SetRoadAnimation(false));
    scene.tick(1);
    let dash = overlay(&scene).dash;
    scene.tick(20);
    assert_eq!(overlay(&scene).dash, dash);
}

#[test]
fn test_overlay_restarts_after_full_length() {
    let mut scene = loaded();
    let length = overlay(&scene).length;
    let steps = (length / OVERLAY_DASH_SPEED).ceil() as u32 + 10;
    scene.tick(steps);
    let o = overlay(&scene);
    assert!(o.dash <= length + OVERLAY_DASH_SPEED);
    assert!(o.dash < length * 0.5, "dash should have wrapped, got {}", o.dash);
}

// ====================================================================
// Water and trees
// ====================================================================

#[test]
fn test_water_time_only_runs_for_rendered_water() {
    let mut scene = loaded();
    scene.tick(3);
    let t = scene.clock().water_time;
    assert!(t > 0.0);

    scene.send(ViewerCommand::SetRenderedWater(false));
    scene.tick(5);
    assert_eq!(scene.clock().water_time, t);
}

#[test]
fn test_trees_grow_with_buildings_and_hide_on_toggle() {
    let mut scene = loaded();
    scene.tick_until("trees grown", |world| {
        let growth = world.resource::<crate::Growth>();
        growth.trees.state.progress() >= 1.0 && growth.trees.leaves_opacity >= TREE_LEAVES_OPACITY
    });

    scene.send(ViewerCommand::SetTrees(false));
    scene.tick(1);
    assert_eq!(scene.growth().trees.state.phase(), GrowthPhase::Degrowing);
    assert!(scene.growth().tree_scale() >= 0.75);

    scene.tick_until("trees hidden", |world| {
        world.resource::<crate::Growth>().trees.state.progress() == 0.0
    });
    assert_eq!(scene.growth().trees.leaves_opacity, 0.0);
}
