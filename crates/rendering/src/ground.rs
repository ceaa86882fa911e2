//! Ground surfaces: the flat grid helper, the terrain mesh and the 2D map
//! outlines.

use bevy::prelude::*;

use scene::config::{GRID_DIVISIONS, GRID_SIZE};
use scene::coords::PlanarCoord;
use scene::mesh_data::Aabb;
use scene::{SceneState, ViewerSettings};

use crate::materials::{
    SceneMaterials, BUILDING_COLOR, GRID_CENTER_COLOR, GRID_COLOR, WATER_COLOR,
};

/// Height of the 2D map outlines above the ground plane.
const MAP_LIFT: f32 = 0.001;

/// Entity showing the loaded terrain surface.
#[derive(Component, Debug, Clone, Copy)]
pub struct TerrainMesh {
    /// Bounds of the surface the mesh was built from.
    pub bounds: Aabb,
}

/// Grid helper, drawn only in flat mode. The two lines through the origin use
/// the brighter centre colour.
pub fn draw_grid(scene: Res<SceneState>, mut gizmos: Gizmos) {
    if scene.terrain_mode {
        return;
    }
    let half = GRID_SIZE * 0.5;
    let step = GRID_SIZE / GRID_DIVISIONS as f32;
    let center_line = GRID_DIVISIONS / 2;
    for i in 0..=GRID_DIVISIONS {
        let k = -half + i as f32 * step;
        let color = if i == center_line {
            GRID_CENTER_COLOR
        } else {
            GRID_COLOR
        };
        gizmos.line(Vec3::new(-half, 0.0, k), Vec3::new(half, 0.0, k), color);
        gizmos.line(Vec3::new(k, 0.0, -half), Vec3::new(k, 0.0, half), color);
    }
}

/// Keeps one terrain mesh entity matching the scene's surface. A new surface
/// (location change) replaces the mesh; a dropped one despawns it.
pub fn sync_terrain_mesh(
    mut commands: Commands,
    scene: Res<SceneState>,
    handles: Res<SceneMaterials>,
    mut meshes: ResMut<Assets<Mesh>>,
    existing: Query<(Entity, &TerrainMesh, &Mesh3d)>,
) {
    if !scene.is_changed() {
        return;
    }
    let wanted = scene.terrain.as_ref().map(|t| t.bounds());
    let mut current = None;
    for (entity, mesh, handle) in &existing {
        if Some(mesh.bounds) == wanted {
            current = Some(entity);
        } else {
            meshes.remove(&handle.0);
            commands.entity(entity).despawn();
        }
    }
    if current.is_some() {
        return;
    }
    let Some(terrain) = scene.terrain.as_ref() else {
        return;
    };
    let mesh = terrain.to_mesh_data();
    info!("Spawning terrain mesh ({} vertices)", mesh.vertex_count());
    commands.spawn((
        Mesh3d(meshes.add(mesh.to_mesh())),
        MeshMaterial3d(handles.terrain.clone()),
        Transform::default(),
        Visibility::Hidden,
        TerrainMesh {
            bounds: terrain.bounds(),
        },
    ));
}

/// Terrain is shown only in terrain mode.
pub fn terrain_visibility(
    scene: Res<SceneState>,
    mut terrain: Query<&mut Visibility, With<TerrainMesh>>,
) {
    let wanted = if scene.terrain_mode {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    for mut visibility in &mut terrain {
        visibility.set_if_neq(wanted);
    }
}

fn ring_points(ring: &[PlanarCoord]) -> impl Iterator<Item = Vec3> + '_ {
    let first = ring.first().copied();
    ring.iter()
        .copied()
        .chain(first)
        .map(|p| {
            let g = p.ground();
            Vec3::new(g.x, MAP_LIFT, g.y)
        })
}

/// Flat outlines of every building and water footprint.
pub fn draw_map_2d(
    scene: Res<SceneState>,
    settings: Res<ViewerSettings>,
    mut gizmos: Gizmos,
) {
    if !settings.map_2d {
        return;
    }
    let shapes = scene
        .buildings
        .iter()
        .map(|b| (&b.footprint, BUILDING_COLOR))
        .chain(
            scene
                .water_footprints
                .iter()
                .map(|w| (w, WATER_COLOR)),
        );
    for (shape, color) in shapes {
        if shape.is_degenerate() {
            continue;
        }
        gizmos.linestrip(ring_points(&shape.outer), color);
        for hole in &shape.holes {
            gizmos.linestrip(ring_points(hole), color);
        }
    }
}
