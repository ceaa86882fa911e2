//! Shared materials and meshes for the scene entities.
//!
//! Opacity animates on the shared materials, so every building, tree crown
//! and trunk fades together in one asset update per frame.

use bevy::prelude::*;

use scene::clock::AnimationClock;
use scene::config::TREE_HEIGHT;
use scene::{Growth, ViewerSettings};

pub const BACKGROUND: Color = Color::srgb(0.129, 0.102, 0.149);
pub const BUILDING_COLOR: Color = Color::srgb(0.847, 0.831, 0.886);
pub const ROAD_COLOR: Color = Color::srgb(0.106, 0.275, 0.525);
pub const OVERLAY_COLOR: Color = Color::srgb(0.000, 1.000, 1.000);
pub const LEAVES_COLOR: Color = Color::srgb(0.510, 0.749, 0.286);
pub const TRUNK_COLOR: Color = Color::srgb(0.298, 0.208, 0.153);
pub const WATER_COLOR: Color = Color::srgb(0.310, 0.561, 0.788);
pub const SIMPLE_WATER_COLOR: Color = Color::srgb(0.145, 0.145, 0.200);
pub const TERRAIN_COLOR: Color = Color::srgb(0.600, 0.600, 0.600);
pub const GRID_CENTER_COLOR: Color = Color::srgb(0.333, 0.333, 0.333);
pub const GRID_COLOR: Color = Color::srgb(0.200, 0.200, 0.200);

#[derive(Resource)]
pub struct SceneMaterials {
    pub building: Handle<StandardMaterial>,
    pub leaves: Handle<StandardMaterial>,
    pub trunk: Handle<StandardMaterial>,
    pub water: Handle<StandardMaterial>,
    pub simple_water: Handle<StandardMaterial>,
    pub terrain: Handle<StandardMaterial>,
    pub crown_mesh: Handle<Mesh>,
    pub trunk_mesh: Handle<Mesh>,
}

fn translucent(color: Color, alpha: f32) -> StandardMaterial {
    StandardMaterial {
        base_color: color.with_alpha(alpha),
        alpha_mode: AlphaMode::Blend,
        perceptual_roughness: 0.8,
        ..default()
    }
}

pub fn setup_materials(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.insert_resource(ClearColor(BACKGROUND));
    commands.insert_resource(SceneMaterials {
        building: materials.add(translucent(BUILDING_COLOR, 0.0)),
        leaves: materials.add(translucent(LEAVES_COLOR, 0.0)),
        trunk: materials.add(translucent(TRUNK_COLOR, 0.0)),
        water: materials.add(StandardMaterial {
            base_color: WATER_COLOR,
            perceptual_roughness: 0.1,
            reflectance: 0.8,
            ..default()
        }),
        simple_water: materials.add(StandardMaterial {
            base_color: SIMPLE_WATER_COLOR,
            unlit: true,
            ..default()
        }),
        terrain: materials.add(StandardMaterial {
            base_color: TERRAIN_COLOR,
            perceptual_roughness: 1.0,
            double_sided: true,
            cull_mode: None,
            ..default()
        }),
        crown_mesh: meshes.add(Sphere::new(TREE_HEIGHT / 2.0).mesh().uv(6, 4)),
        trunk_mesh: meshes.add(
            Cone {
                radius: TREE_HEIGHT / 10.0,
                height: TREE_HEIGHT,
            }
            .mesh()
            .resolution(4),
        ),
    });
}

/// Pushes the animated opacities into the shared materials.
pub fn apply_growth_opacity(
    growth: Res<Growth>,
    handles: Res<SceneMaterials>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    if !growth.is_changed() {
        return;
    }
    let updates = [
        (&handles.building, growth.buildings.opacity),
        (&handles.leaves, growth.trees.leaves_opacity),
        (&handles.trunk, growth.trees.trunk_opacity),
    ];
    for (handle, alpha) in updates {
        if let Some(material) = materials.get_mut(handle) {
            material.base_color.set_alpha(alpha.clamp(0.0, 1.0));
        }
    }
}

/// Ripples the rendered water with the animation clock.
pub fn animate_water(
    clock: Res<AnimationClock>,
    settings: Res<ViewerSettings>,
    handles: Res<SceneMaterials>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    if !settings.rendered_water || !clock.is_changed() {
        return;
    }
    let Some(material) = materials.get_mut(&handles.water) else {
        return;
    };
    let wave = (clock.water_time * std::f32::consts::TAU).sin() * 0.5 + 0.5;
    material.perceptual_roughness = 0.05 + 0.15 * wave;
    material.emissive = LinearRgba::from(WATER_COLOR) * (0.05 + 0.05 * wave);
}
