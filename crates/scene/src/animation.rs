//! The per-frame animation step.

use bevy::prelude::*;

use crate::arena::{SceneGroup, SceneObject};
use crate::clock::AnimationClock;
use crate::composer::SceneState;
use crate::growth::Growth;
use crate::settings::ViewerSettings;

/// Shared road material opacity change per road and step.
const ROAD_FADE_PER_ROAD: f32 = 0.00005;

/// One animation step: trees, buildings, roads and overlays, then water.
pub fn step_animation(
    time: Res<Time>,
    settings: Res<ViewerSettings>,
    mut clock: ResMut<AnimationClock>,
    mut growth: ResMut<Growth>,
    mut scene: ResMut<SceneState>,
) {
    clock.advance(time.delta_secs());
    let growth = &mut *growth;

    growth.trees_fading_out = growth.trees.step(growth.buildings.state.phase(), settings.trees);
    growth.buildings.step();

    let growing = growth.buildings.state.is_growing();
    let degrowing = growth.buildings.state.is_degrowing();
    let roads = scene.arena.len(SceneGroup::Roads) as f32;
    if growing {
        growth.road_opacity = (growth.road_opacity + ROAD_FADE_PER_ROAD * roads).min(1.0);
    } else if degrowing {
        growth.road_opacity = (growth.road_opacity - ROAD_FADE_PER_ROAD * roads).max(0.0);
    }

    for object in scene.arena.group_mut(SceneGroup::AnimatedRoads) {
        if let SceneObject::Overlay(overlay) = object {
            overlay.fade_with_buildings(growing, degrowing, settings.road_animation);
            if !degrowing {
                overlay.step(settings.road_animation);
            }
        }
    }

    if settings.rendered_water {
        clock.advance_water();
    }
}
