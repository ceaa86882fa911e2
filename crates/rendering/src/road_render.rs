use bevy::prelude::*;

use scene::arena::{SceneGroup, SceneObject};
use scene::road_overlay::polyline_prefix;
use scene::{Growth, SceneState};

use crate::materials::{OVERLAY_COLOR, ROAD_COLOR};

/// Lines sit just above the surface they were draped on.
const LINE_LIFT: f32 = 0.002;

fn lifted(points: &[Vec3]) -> impl Iterator<Item = Vec3> + '_ {
    points.iter().map(|p| *p + Vec3::Y * LINE_LIFT)
}

/// Draws every road polyline with the shared road opacity.
pub fn draw_roads(scene: Res<SceneState>, growth: Res<Growth>, mut gizmos: Gizmos) {
    if growth.road_opacity <= 0.0 {
        return;
    }
    let color = ROAD_COLOR.with_alpha(growth.road_opacity.min(1.0));
    for road in scene.roads() {
        if road.points.len() >= 2 {
            gizmos.linestrip(lifted(&road.points), color);
        }
    }
}

/// Draws the animated pulse of each overlay: the prefix of its road up to
/// the current dash length.
pub fn draw_road_overlays(scene: Res<SceneState>, mut gizmos: Gizmos) {
    let roads = scene.arena.group(SceneGroup::Roads);
    for object in scene.arena.group(SceneGroup::AnimatedRoads) {
        let SceneObject::Overlay(overlay) = object else {
            continue;
        };
        if overlay.opacity <= 0.0 || overlay.dash <= 0.0 {
            continue;
        }
        let Some(SceneObject::Road(road)) = roads.get(overlay.road) else {
            continue;
        };
        let prefix = polyline_prefix(&road.points, overlay.dash);
        if prefix.len() >= 2 {
            gizmos.linestrip(
                lifted(&prefix),
                OVERLAY_COLOR.with_alpha(overlay.opacity.min(1.0)),
            );
        }
    }
}
