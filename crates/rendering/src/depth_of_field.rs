//! Depth-of-field focus tracking.
//!
//! While the effect is on, a ray through the cursor is cast into the scene
//! every frame. The tracked focal distance eases toward the hit distance (or
//! toward [`FOCUS_MISS_DISTANCE`] on a miss) and is converted into the focus
//! distance of the camera's `DepthOfField` component.

use bevy::core_pipeline::dof::{DepthOfField, DepthOfFieldMode};
use bevy::core_pipeline::prepass::DepthPrepass;
use bevy::prelude::*;

use scene::clock::AnimationClock;
use scene::config::{CAMERA_FAR, CAMERA_NEAR};
use scene::{SceneState, ViewerSettings};

/// Focal distance used when the cursor ray hits nothing.
pub const FOCUS_MISS_DISTANCE: f32 = 1000.0;
/// Fraction of the remaining distance covered each step.
pub const FOCUS_EASING: f32 = 0.03;

#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct FocusTracker {
    pub focal: f32,
}

impl Default for FocusTracker {
    fn default() -> Self {
        Self {
            focal: FOCUS_MISS_DISTANCE,
        }
    }
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Converts a normalized depth-buffer value into a view distance.
pub fn linearize(depth: f32) -> f32 {
    -CAMERA_FAR * CAMERA_NEAR / (depth * (CAMERA_FAR - CAMERA_NEAR) - CAMERA_FAR)
}

impl FocusTracker {
    /// Eases the focal distance toward the latest ray hit.
    pub fn step(&mut self, hit: Option<f32>) {
        let goal = hit.unwrap_or(FOCUS_MISS_DISTANCE);
        self.focal += (goal - self.focal) * FOCUS_EASING;
    }

    /// Focus distance handed to the post-process effect.
    pub fn focus_distance(&self) -> f32 {
        linearize(1.0 - smoothstep(CAMERA_NEAR, CAMERA_FAR, self.focal))
    }
}

/// Adds or removes the effect on the camera when the toggle flips.
pub fn toggle_depth_of_field(
    mut commands: Commands,
    settings: Res<ViewerSettings>,
    cameras: Query<(Entity, Has<DepthOfField>), With<Camera3d>>,
) {
    if !settings.is_changed() {
        return;
    }
    for (entity, has_effect) in &cameras {
        match (settings.depth_of_field, has_effect) {
            (true, false) => {
                commands.entity(entity).insert((
                    DepthOfField {
                        mode: DepthOfFieldMode::Gaussian,
                        focal_distance: FocusTracker::default().focus_distance(),
                        ..default()
                    },
                    DepthPrepass,
                ));
            }
            (false, true) => {
                commands.entity(entity).remove::<(DepthOfField, DepthPrepass)>();
            }
            _ => {}
        }
    }
}

/// Casts the cursor ray and moves the focus toward what it hits.
pub fn track_focus(
    settings: Res<ViewerSettings>,
    clock: Res<AnimationClock>,
    scene: Res<SceneState>,
    windows: Query<&Window>,
    mut tracker: ResMut<FocusTracker>,
    mut cameras: Query<(&Camera, &GlobalTransform, &mut DepthOfField), With<Camera3d>>,
) {
    if !settings.depth_of_field || clock.is_paused() {
        return;
    }
    let Ok(window) = windows.get_single() else {
        return;
    };
    let Ok((camera, cam_transform, mut dof)) = cameras.get_single_mut() else {
        return;
    };

    let hit = window
        .cursor_position()
        .and_then(|pos| camera.viewport_to_world(cam_transform, pos).ok())
        .and_then(|ray| scene.ray_hit(ray.origin, *ray.direction, FOCUS_MISS_DISTANCE));
    tracker.step(hit);

    let distance = tracker.focus_distance();
    if dof.focal_distance != distance {
        dof.focal_distance = distance;
    }
}
