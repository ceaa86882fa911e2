use bevy::prelude::*;

use scene::SceneSet;

pub mod camera;
pub mod depth_of_field;
pub mod egui_input_guard;
pub mod ground;
pub mod lighting;
pub mod materials;
pub mod road_render;
pub mod scene_objects;

use camera::CameraDrag;
use depth_of_field::FocusTracker;

pub struct RenderingPlugin;

impl Plugin for RenderingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraDrag>()
            .init_resource::<FocusTracker>()
            .add_systems(
                Startup,
                (
                    materials::setup_materials,
                    camera::setup_camera,
                    lighting::setup_lighting,
                ),
            )
            .add_systems(
                Update,
                (
                    camera::sync_orientation,
                    camera::camera_pan_keyboard,
                    camera::camera_pan_drag,
                    camera::camera_zoom,
                    camera::snap_target,
                    camera::apply_orbit_camera,
                )
                    .chain()
                    .after(SceneSet::Animate),
            )
            .add_systems(
                Update,
                (
                    scene_objects::despawn_stale_objects,
                    scene_objects::spawn_scene_objects,
                    scene_objects::refresh_building_batch,
                    scene_objects::refresh_tree_instances,
                    scene_objects::apply_growth_scale,
                    materials::apply_growth_opacity,
                    materials::animate_water,
                )
                    .chain()
                    .after(SceneSet::Animate),
            )
            .add_systems(
                Update,
                (
                    ground::sync_terrain_mesh,
                    ground::terrain_visibility,
                    lighting::toggle_rendered_lighting,
                    depth_of_field::toggle_depth_of_field,
                )
                    .after(SceneSet::Animate),
            )
            .add_systems(
                Update,
                (
                    ground::draw_grid,
                    ground::draw_map_2d,
                    road_render::draw_roads,
                    road_render::draw_road_overlays,
                    depth_of_field::track_focus.after(camera::apply_orbit_camera),
                )
                    .after(SceneSet::Animate),
            );
    }
}
