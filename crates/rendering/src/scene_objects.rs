//! Mirrors the scene arena into Bevy entities.
//!
//! Each drawable object gets one entity tagged with its arena handle. When a
//! rebuild stales the handle the entity is despawned, and entities for new
//! handles are spawned on the next frame. Roads and overlays are drawn as
//! gizmo lines and need no entities.

use bevy::prelude::*;

use scene::arena::{ObjectHandle, SceneGroup, SceneObject};
use scene::{Growth, SceneState, ViewerSettings};

use crate::materials::SceneMaterials;

/// Growth scale never collapses to exactly zero so the transform stays
/// invertible.
const MIN_SCALE: f32 = 1e-4;

/// Entity drawing one arena object.
#[derive(Component, Debug, Clone, Copy)]
pub struct SceneObjectEntity {
    pub handle: ObjectHandle,
}

/// The merged building mesh, tagged with the batch revision it shows.
#[derive(Component, Debug, Clone, Copy)]
pub struct BuildingBatchMesh {
    pub revision: u64,
}

/// Parent of every tree crown and trunk.
#[derive(Component)]
pub struct TreeGroupRoot;

/// Crown of the tree in instance slot `.0`.
#[derive(Component)]
pub struct TreeCrown(pub usize);

#[derive(Component)]
pub struct TreeTrunk(pub usize);

const DRAWN_GROUPS: [SceneGroup; 4] = [
    SceneGroup::Buildings,
    SceneGroup::WaterShader,
    SceneGroup::WaterSimple,
    SceneGroup::Trees,
];

/// Despawns entities whose handle went stale.
pub fn despawn_stale_objects(
    mut commands: Commands,
    scene: Res<SceneState>,
    objects: Query<(Entity, &SceneObjectEntity)>,
) {
    if !scene.is_changed() {
        return;
    }
    for (entity, object) in &objects {
        if !scene.arena.is_live(object.handle) {
            commands.entity(entity).despawn_recursive();
        }
    }
}

/// Spawns entities for live handles that have none yet.
pub fn spawn_scene_objects(
    mut commands: Commands,
    scene: Res<SceneState>,
    handles: Res<SceneMaterials>,
    objects: Query<&SceneObjectEntity>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    if !scene.is_changed() {
        return;
    }
    let existing: std::collections::HashSet<ObjectHandle> =
        objects.iter().map(|o| o.handle).collect();

    for group in DRAWN_GROUPS {
        for handle in scene.arena.handles(group) {
            if existing.contains(&handle) {
                continue;
            }
            let Some(object) = scene.arena.get(handle) else {
                continue;
            };
            let tag = SceneObjectEntity { handle };
            match object {
                SceneObject::BuildingBatch { mesh, revision } => {
                    commands.spawn((
                        Mesh3d(meshes.add(mesh.to_mesh())),
                        MeshMaterial3d(handles.building.clone()),
                        Transform::from_scale(Vec3::new(1.0, MIN_SCALE, 1.0)),
                        BuildingBatchMesh {
                            revision: *revision,
                        },
                        tag,
                    ));
                }
                SceneObject::Water(mesh) => {
                    let material = if group == SceneGroup::WaterShader {
                        handles.water.clone()
                    } else {
                        handles.simple_water.clone()
                    };
                    commands.spawn((
                        Mesh3d(meshes.add(mesh.to_mesh())),
                        MeshMaterial3d(material),
                        Transform::default(),
                        Visibility::Hidden,
                        tag,
                    ));
                }
                SceneObject::Trees(trees) => {
                    commands
                        .spawn((
                            Transform::from_scale(Vec3::new(1.0, MIN_SCALE, 1.0)),
                            Visibility::default(),
                            TreeGroupRoot,
                            tag,
                        ))
                        .with_children(|parent| {
                            for (slot, tree) in trees.iter() {
                                parent.spawn((
                                    Mesh3d(handles.crown_mesh.clone()),
                                    MeshMaterial3d(handles.leaves.clone()),
                                    Transform::from_matrix(tree.crown_transform()),
                                    TreeCrown(slot),
                                ));
                                parent.spawn((
                                    Mesh3d(handles.trunk_mesh.clone()),
                                    MeshMaterial3d(handles.trunk.clone()),
                                    Transform::from_matrix(tree.trunk_transform()),
                                    TreeTrunk(slot),
                                ));
                            }
                        });
                }
                SceneObject::Road(_) | SceneObject::Overlay(_) => {}
            }
        }
    }
}

/// Re-uploads the batch mesh after a re-merge (terrain toggle).
pub fn refresh_building_batch(
    scene: Res<SceneState>,
    mut batches: Query<(&mut Mesh3d, &mut BuildingBatchMesh)>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    let Some((mesh, revision)) = scene.batch() else {
        return;
    };
    for (mut handle, mut batch) in &mut batches {
        if batch.revision != revision {
            meshes.remove(&handle.0);
            handle.0 = meshes.add(mesh.to_mesh());
            batch.revision = revision;
        }
    }
}

/// Re-places tree instances after they were re-draped.
pub fn refresh_tree_instances(
    scene: Res<SceneState>,
    mut crowns: Query<(&TreeCrown, &mut Transform), Without<TreeTrunk>>,
    mut trunks: Query<(&TreeTrunk, &mut Transform), Without<TreeCrown>>,
) {
    if !scene.is_changed() {
        return;
    }
    let Some(trees) = scene.trees() else {
        return;
    };
    for (crown, mut transform) in &mut crowns {
        if let Some(tree) = trees.get(crown.0) {
            transform.set_if_neq(Transform::from_matrix(tree.crown_transform()));
        }
    }
    for (trunk, mut transform) in &mut trunks {
        if let Some(tree) = trees.get(trunk.0) {
            transform.set_if_neq(Transform::from_matrix(tree.trunk_transform()));
        }
    }
}

/// Applies the growth scale and the visibility toggles.
#[allow(clippy::type_complexity)]
pub fn apply_growth_scale(
    growth: Res<Growth>,
    settings: Res<ViewerSettings>,
    mut batches: Query<&mut Transform, (With<BuildingBatchMesh>, Without<TreeGroupRoot>)>,
    mut trees: Query<&mut Transform, (With<TreeGroupRoot>, Without<BuildingBatchMesh>)>,
    mut water: Query<(&SceneObjectEntity, &mut Visibility), Without<TreeGroupRoot>>,
) {
    let building_scale = growth.buildings.scale().max(MIN_SCALE);
    for mut transform in &mut batches {
        if transform.scale.y != building_scale {
            transform.scale.y = building_scale;
        }
    }
    let tree_scale = growth.tree_scale().max(MIN_SCALE);
    for mut transform in &mut trees {
        if transform.scale.y != tree_scale {
            transform.scale.y = tree_scale;
        }
    }
    for (object, mut visibility) in &mut water {
        let shown = match object.handle.group {
            SceneGroup::WaterShader => settings.rendered_water,
            SceneGroup::WaterSimple => !settings.rendered_water,
            _ => continue,
        };
        let wanted = if shown {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
        if *visibility != wanted {
            *visibility = wanted;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::setup_materials;
    use scene::coords::PlanarCoord;
    use scene::loader::BuildingGeometry;
    use scene::shape::{extrude, Shape2D};

    fn square(x: f32) -> Shape2D {
        Shape2D {
            outer: vec![
                PlanarCoord::new(x, 0.0),
                PlanarCoord::new(x + 1.0, 0.0),
                PlanarCoord::new(x + 1.0, 1.0),
                PlanarCoord::new(x, 1.0),
            ],
            holes: Vec::new(),
        }
    }

    fn building(x: f32) -> BuildingGeometry {
        let footprint = square(x);
        BuildingGeometry {
            mesh: extrude(&footprint, 0.1, 1),
            footprint,
            levels: 2.0,
            depth: 0.1,
        }
    }

    fn test_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()));
        app.init_asset::<Mesh>();
        app.init_asset::<StandardMaterial>();
        app.init_resource::<Growth>();
        app.init_resource::<ViewerSettings>();

        let mut state = SceneState::default();
        state.buildings = vec![building(0.0), building(2.0)];
        state.rebuild_batch();
        let water = extrude(&square(5.0), 0.001, 2);
        state
            .arena
            .insert(SceneGroup::WaterShader, SceneObject::Water(water.clone()));
        state
            .arena
            .insert(SceneGroup::WaterSimple, SceneObject::Water(water));
        app.insert_resource(state);

        app.add_systems(Startup, setup_materials);
        app.add_systems(
            Update,
            (
                despawn_stale_objects,
                spawn_scene_objects,
                refresh_building_batch,
                apply_growth_scale,
            )
                .chain(),
        );
        app.update();
        app.update();
        app
    }

    fn count<C: Component>(app: &mut App) -> usize {
        let mut query = app.world_mut().query_filtered::<Entity, With<C>>();
        query.iter(app.world()).count()
    }

    fn water_visibility(app: &mut App, group: SceneGroup) -> Visibility {
        let mut query = app
            .world_mut()
            .query::<(&SceneObjectEntity, &Visibility)>();
        query
            .iter(app.world())
            .find(|(o, _)| o.handle.group == group)
            .map(|(_, v)| *v)
            .unwrap_or_else(|| panic!("no entity for {group:?}"))
    }

    #[test]
    fn test_one_entity_per_drawn_object() {
        let mut app = test_app();
        assert_eq!(count::<BuildingBatchMesh>(&mut app), 1);
        assert_eq!(count::<SceneObjectEntity>(&mut app), 3);

        // Further frames do not duplicate anything
        app.world_mut().resource_mut::<SceneState>().set_changed();
        app.update();
        assert_eq!(count::<SceneObjectEntity>(&mut app), 3);
    }

    #[test]
    fn test_rendered_water_toggle_picks_one_group() {
        let mut app = test_app();
        assert_eq!(
            water_visibility(&mut app, SceneGroup::WaterShader),
            Visibility::Inherited
        );
        assert_eq!(
            water_visibility(&mut app, SceneGroup::WaterSimple),
            Visibility::Hidden
        );

        app.world_mut()
            .resource_mut::<ViewerSettings>()
            .rendered_water = false;
        app.update();
        assert_eq!(
            water_visibility(&mut app, SceneGroup::WaterShader),
            Visibility::Hidden
        );
        assert_eq!(
            water_visibility(&mut app, SceneGroup::WaterSimple),
            Visibility::Inherited
        );
    }

    #[test]
    fn test_batch_follows_building_growth() {
        let mut app = test_app();
        {
            let mut growth = app.world_mut().resource_mut::<Growth>();
            growth.buildings.state.request_show();
            for _ in 0..10 {
                growth.buildings.step();
            }
        }
        app.update();
        let expected = app.world().resource::<Growth>().buildings.scale();
        assert!(expected > MIN_SCALE);

        let mut query = app
            .world_mut()
            .query_filtered::<&Transform, With<BuildingBatchMesh>>();
        let scale = query.single(app.world()).scale;
        assert_eq!(scale.y, expected);
        assert_eq!(scale.x, 1.0);
    }

    #[test]
    fn test_remerge_swaps_mesh_in_place() {
        let mut app = test_app();
        let mut query = app
            .world_mut()
            .query::<(Entity, &Mesh3d, &BuildingBatchMesh)>();
        let (entity, mesh, batch) = query.single(app.world());
        let (entity, mesh, revision) = (entity, mesh.0.clone(), batch.revision);

        app.world_mut().resource_mut::<SceneState>().rebuild_batch();
        app.update();

        let mut query = app
            .world_mut()
            .query::<(Entity, &Mesh3d, &BuildingBatchMesh)>();
        let (after, new_mesh, batch) = query.single(app.world());
        assert_eq!(after, entity);
        assert_ne!(new_mesh.0, mesh);
        assert!(batch.revision > revision);
    }

    #[test]
    fn test_cleared_scene_despawns_entities() {
        let mut app = test_app();
        app.world_mut().resource_mut::<SceneState>().clear();
        app.update();
        assert_eq!(count::<SceneObjectEntity>(&mut app), 0);
    }
}
