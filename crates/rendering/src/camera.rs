use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::prelude::*;

use scene::config::{
    CAMERA_FAR, CAMERA_FOV_DEG, CAMERA_MAX_DISTANCE, CAMERA_MIN_DISTANCE, CAMERA_NEAR,
    CAMERA_PITCH_MAX_DEG, CAMERA_YAW_MAX_DEG, GRID_SIZE,
};
use scene::{SceneState, ViewerSettings};

use crate::egui_input_guard::egui_wants_pointer;

const PAN_SPEED: f32 = 0.6;
const DRAG_PAN_SCALE: f32 = 0.0015;
const ZOOM_SPEED: f32 = 0.1;

/// Orbital camera model: the camera orbits a target point on the ground.
///
/// Rotation only comes from the pitch/yaw sliders; mouse and keyboard move
/// the target and the radius.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    /// Point the camera looks at.
    pub target: Vec3,
    /// Elevation angle in radians, [0, 80°].
    pub pitch: f32,
    /// Horizontal rotation in radians, [0, 360°].
    pub yaw: f32,
    /// Distance from the target, at most [`CAMERA_MAX_DISTANCE`].
    pub radius: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        let mut orbit = Self {
            target: Vec3::ZERO,
            pitch: 0.0,
            yaw: 0.0,
            radius: CAMERA_MAX_DISTANCE,
        };
        let settings = ViewerSettings::default();
        orbit.set_orientation(settings.pitch, settings.yaw);
        orbit
    }
}

impl OrbitCamera {
    /// Sets both angles (degrees, clamped to the slider ranges).
    pub fn set_orientation(&mut self, pitch_deg: f32, yaw_deg: f32) {
        self.pitch = pitch_deg.clamp(0.0, CAMERA_PITCH_MAX_DEG).to_radians();
        self.yaw = yaw_deg.clamp(0.0, CAMERA_YAW_MAX_DEG).to_radians();
    }

    /// Camera position on the orbit sphere around the target.
    pub fn position(&self) -> Vec3 {
        let x = self.radius * self.yaw.sin() * self.pitch.cos();
        let y = self.radius * self.pitch.sin();
        let z = self.radius * self.yaw.cos() * self.pitch.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position()).looking_at(self.target, Vec3::Y)
    }

    /// The target moved inside the play area and rested on `ground_height`.
    pub fn clamped_target(&self, ground_height: f32) -> Vec3 {
        let half = GRID_SIZE * 0.5;
        Vec3::new(
            self.target.x.clamp(-half, half),
            ground_height,
            self.target.z.clamp(-half, half),
        )
    }

    pub fn clamp_target(&mut self, ground_height: f32) {
        self.target = self.clamped_target(ground_height);
    }

    pub fn zoom(&mut self, factor: f32) {
        self.radius = (self.radius * factor).clamp(CAMERA_MIN_DISTANCE, CAMERA_MAX_DISTANCE);
    }

    /// Moves the target along the ground, relative to the current yaw.
    pub fn pan(&mut self, right: f32, forward: f32) {
        let (sin, cos) = self.yaw.sin_cos();
        self.target.x += right * cos - forward * sin;
        self.target.z += -right * sin - forward * cos;
    }
}

#[derive(Resource, Default)]
pub struct CameraDrag {
    pub dragging: bool,
    pub last_pos: Vec2,
}

pub fn setup_camera(mut commands: Commands, settings: Res<ViewerSettings>) {
    let mut orbit = OrbitCamera::default();
    orbit.set_orientation(settings.pitch, settings.yaw);

    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: CAMERA_FOV_DEG.to_radians(),
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
            ..default()
        }),
        orbit.transform(),
    ));
    commands.insert_resource(orbit);
}

/// Slider changes re-aim the camera.
pub fn sync_orientation(settings: Res<ViewerSettings>, mut orbit: ResMut<OrbitCamera>) {
    if settings.is_changed() {
        let (pitch, yaw) = (settings.pitch, settings.yaw);
        let current = (orbit.pitch.to_degrees(), orbit.yaw.to_degrees());
        if (current.0 - pitch).abs() > 1e-3 || (current.1 - yaw).abs() > 1e-3 {
            orbit.set_orientation(pitch, yaw);
        }
    }
}

/// WASD/Arrow keys: pan the target.
pub fn camera_pan_keyboard(
    keys: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut orbit: ResMut<OrbitCamera>,
) {
    let mut dir = Vec2::ZERO;
    if keys.pressed(KeyCode::KeyW) || keys.pressed(KeyCode::ArrowUp) {
        dir.y += 1.0;
    }
    if keys.pressed(KeyCode::KeyS) || keys.pressed(KeyCode::ArrowDown) {
        dir.y -= 1.0;
    }
    if keys.pressed(KeyCode::KeyA) || keys.pressed(KeyCode::ArrowLeft) {
        dir.x -= 1.0;
    }
    if keys.pressed(KeyCode::KeyD) || keys.pressed(KeyCode::ArrowRight) {
        dir.x += 1.0;
    }
    if dir != Vec2::ZERO {
        let delta = dir.normalize() * PAN_SPEED * (orbit.radius / 10.0) * time.delta_secs();
        orbit.pan(delta.x, delta.y);
    }
}

/// Left-mouse drag: pan the target.
pub fn camera_pan_drag(
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window>,
    mut contexts: bevy_egui::EguiContexts,
    mut drag: ResMut<CameraDrag>,
    mut orbit: ResMut<OrbitCamera>,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };

    if buttons.just_pressed(MouseButton::Left) && !egui_wants_pointer(&mut contexts) {
        if let Some(pos) = window.cursor_position() {
            drag.dragging = true;
            drag.last_pos = pos;
        }
    }
    if buttons.just_released(MouseButton::Left) {
        drag.dragging = false;
    }

    if drag.dragging {
        if let Some(pos) = window.cursor_position() {
            let delta = (pos - drag.last_pos) * DRAG_PAN_SCALE * orbit.radius;
            orbit.pan(-delta.x, delta.y);
            drag.last_pos = pos;
        }
    }
}

/// Scroll wheel: zoom.
pub fn camera_zoom(
    mut scroll_evts: EventReader<MouseWheel>,
    mut contexts: bevy_egui::EguiContexts,
    mut orbit: ResMut<OrbitCamera>,
) {
    if egui_wants_pointer(&mut contexts) {
        scroll_evts.clear();
        return;
    }
    for evt in scroll_evts.read() {
        let dy = match evt.unit {
            MouseScrollUnit::Line => evt.y,
            MouseScrollUnit::Pixel => evt.y / 100.0,
        };
        orbit.zoom(1.0 - dy * ZOOM_SPEED);
    }
}

/// Clamps the target to the play area and walks it over the terrain.
pub fn snap_target(scene: Res<SceneState>, mut orbit: ResMut<OrbitCamera>) {
    let height = scene.target_height(orbit.target.x, orbit.target.z);
    let target = orbit.clamped_target(height);
    if target != orbit.target {
        orbit.target = target;
    }
}

/// Applies the orbit model to the camera transform.
pub fn apply_orbit_camera(
    orbit: Res<OrbitCamera>,
    mut query: Query<&mut Transform, With<Camera3d>>,
) {
    if !orbit.is_changed() {
        return;
    }
    let Ok(mut transform) = query.get_single_mut() else {
        return;
    };
    *transform = orbit.transform();
}
