//! Viewer toggles and the commands the control panel sends.
//!
//! Every panel control maps to exactly one [`ViewerCommand`]; the scene
//! systems apply them in one place so no other code writes the settings.

use bevy::prelude::*;

use crate::composer::SceneState;
use crate::growth::Growth;
use crate::rebuild::RebuildHandshake;

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct ViewerSettings {
    pub road_animation: bool,
    pub map_2d: bool,
    pub depth_of_field: bool,
    pub rendered_lighting: bool,
    pub rendered_water: bool,
    pub trees: bool,
    pub terrain: bool,
    /// Whether the active location has an elevation raster.
    pub terrain_available: bool,
    /// Building transparency in [0, 1].
    pub transparency: f32,
    /// Camera pitch in degrees, [0, 80].
    pub pitch: f32,
    /// Camera yaw in degrees, [0, 360].
    pub yaw: f32,
    pub location: String,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            road_animation: true,
            map_2d: false,
            depth_of_field: false,
            rendered_lighting: true,
            rendered_water: true,
            trees: true,
            terrain: false,
            terrain_available: false,
            transparency: 0.0,
            pitch: 25.0,
            yaw: 45.0,
            location: String::new(),
        }
    }
}

/// One control-panel action.
#[derive(Event, Debug, Clone, PartialEq)]
pub enum ViewerCommand {
    SetRoadAnimation(bool),
    SetMap2d(bool),
    SetDepthOfField(bool),
    SetRenderedLighting(bool),
    SetRenderedWater(bool),
    SetTrees(bool),
    SetTerrain(bool),
    SetTransparency(f32),
    SetCameraAngles { pitch: f32, yaw: f32 },
    SelectLocation(String),
}

/// Applies queued panel commands.
pub fn apply_viewer_commands(
    mut commands: EventReader<ViewerCommand>,
    mut settings: ResMut<ViewerSettings>,
    mut growth: ResMut<Growth>,
    mut scene: ResMut<SceneState>,
    mut rebuild: ResMut<RebuildHandshake>,
) {
    for command in commands.read() {
        match command {
            ViewerCommand::SetRoadAnimation(on) => settings.road_animation = *on,
            ViewerCommand::SetMap2d(on) => settings.map_2d = *on,
            ViewerCommand::SetDepthOfField(on) => settings.depth_of_field = *on,
            ViewerCommand::SetRenderedLighting(on) => settings.rendered_lighting = *on,
            ViewerCommand::SetRenderedWater(on) => settings.rendered_water = *on,
            ViewerCommand::SetTrees(on) => {
                settings.trees = *on;
                if *on {
                    growth.trees.state.request_show();
                } else {
                    growth.trees.state.request_hide();
                }
            }
            ViewerCommand::SetTerrain(on) => {
                if *on && !settings.terrain_available {
                    warn!("Terrain is not available for {}", settings.location);
                    continue;
                }
                if rebuild.is_busy() {
                    continue;
                }
                settings.terrain = *on;
                // Without a surface yet the request waits for the terrain load.
                if scene.terrain.is_some() || !*on {
                    scene.set_terrain_mode(*on);
                    growth.buildings.state.restart();
                }
            }
            ViewerCommand::SetTransparency(t) => {
                settings.transparency = t.clamp(0.0, 1.0);
                growth.buildings.set_transparency(settings.transparency);
            }
            ViewerCommand::SetCameraAngles { pitch, yaw } => {
                settings.pitch = pitch.clamp(0.0, crate::config::CAMERA_PITCH_MAX_DEG);
                settings.yaw = yaw.clamp(0.0, crate::config::CAMERA_YAW_MAX_DEG);
            }
            ViewerCommand::SelectLocation(key) => {
                if rebuild.is_busy() {
                    continue;
                }
                rebuild.request(key.clone(), &mut growth);
            }
        }
    }
}
