//! Scene composer: owns the loaded geometry and keeps the arena in sync.

use bevy::log::info;
use bevy::math::Vec3;
use bevy::prelude::Resource;

use crate::arena::{SceneArena, SceneGroup, SceneObject};
use crate::coords::GeoCoord;
use crate::loader::{overlays_for, BuildingGeometry, Collider, ColliderSet, LoadStats, SceneData};
use crate::mesh_data::MeshData;
use crate::road_overlay::RoadPolyline;
use crate::shape::{placement_helper, Shape2D};
use crate::config::{PROBE_CEILING, TARGET_PROBE_FLOOR};
use crate::terrain::{GroundSampler, Layered, NoGround, ProbeWindow, TerrainSurface};
use crate::trees::TreeInstances;

/// The explicit scene state every system reads and writes.
#[derive(Resource, Debug, Default)]
pub struct SceneState {
    pub center: GeoCoord,
    pub buildings: Vec<BuildingGeometry>,
    pub colliders: Vec<Collider>,
    pub water_footprints: Vec<Shape2D>,
    pub terrain: Option<TerrainSurface>,
    pub terrain_mode: bool,
    pub arena: SceneArena,
    pub stats: LoadStats,
    batch_revision: u64,
}

impl SceneState {
    /// Replaces the whole scene with a freshly loaded dataset.
    pub fn compose(&mut self, data: SceneData) {
        self.arena.invalidate();
        self.center = data.center;
        self.buildings = data.buildings;
        self.colliders = data.colliders;
        self.water_footprints = data.water_footprints;
        self.stats = data.stats;

        self.rebuild_batch();
        self.install_roads(data.roads);
        for mesh in data.water {
            self.arena.insert(SceneGroup::WaterShader, SceneObject::Water(mesh.clone()));
            self.arena.insert(SceneGroup::WaterSimple, SceneObject::Water(mesh));
        }
        self.arena.insert(SceneGroup::Trees, SceneObject::Trees(data.trees));

        info!(
            "Scene composed around {} {}: {} buildings, {} roads, {} overlays",
            self.center.lat,
            self.center.lon,
            self.buildings.len(),
            self.arena.len(SceneGroup::Roads),
            self.arena.len(SceneGroup::AnimatedRoads)
        );
    }

    /// Drops every object (rebuild teardown). Terrain stays; it belongs to
    /// the location, not the dataset.
    pub fn clear(&mut self) {
        self.arena.invalidate();
        self.buildings.clear();
        self.colliders.clear();
        self.water_footprints.clear();
        self.stats = LoadStats::default();
    }

    /// Merges every building into the single batch object. Calling it again
    /// without changes yields an identical batch.
    pub fn rebuild_batch(&mut self) {
        let mesh = MeshData::merge(self.buildings.iter().map(|b| &b.mesh));
        self.batch_revision += 1;
        let batch = SceneObject::BuildingBatch {
            mesh,
            revision: self.batch_revision,
        };
        match self.arena.group_mut(SceneGroup::Buildings).first_mut() {
            Some(slot) => *slot = batch,
            None => {
                self.arena.insert(SceneGroup::Buildings, batch);
            }
        }
    }

    pub fn batch(&self) -> Option<(&MeshData, u64)> {
        match self.arena.group(SceneGroup::Buildings).first() {
            Some(SceneObject::BuildingBatch { mesh, revision }) => Some((mesh, *revision)),
            _ => None,
        }
    }

    pub fn has_batch(&self) -> bool {
        self.batch().is_some()
    }

    pub fn roads(&self) -> impl Iterator<Item = &RoadPolyline> {
        self.arena.group(SceneGroup::Roads).iter().filter_map(|o| match o {
            SceneObject::Road(r) => Some(r),
            _ => None,
        })
    }

    pub fn trees(&self) -> Option<&TreeInstances> {
        self.arena.group(SceneGroup::Trees).iter().find_map(|o| match o {
            SceneObject::Trees(t) => Some(t),
            _ => None,
        })
    }

    fn install_roads(&mut self, roads: Vec<RoadPolyline>) {
        self.arena.reset_group(SceneGroup::Roads);
        self.arena.reset_group(SceneGroup::AnimatedRoads);
        for overlay in overlays_for(&roads) {
            self.arena.insert(SceneGroup::AnimatedRoads, SceneObject::Overlay(overlay));
        }
        for road in roads {
            self.arena.insert(SceneGroup::Roads, SceneObject::Road(road));
        }
    }

    /// Switches terrain mode using the loaded terrain surface.
    pub fn set_terrain_mode(&mut self, on: bool) {
        let terrain = self.terrain.take();
        match (&terrain, on) {
            (Some(t), true) => self.apply_terrain_mode(true, t),
            _ => self.apply_terrain_mode(on, &NoGround),
        }
        self.terrain = terrain;
    }

    /// Re-anchors buildings, roads and trees for the given mode.
    ///
    /// In terrain mode each building is moved so its base sits at the height
    /// `ground` reports under its centroid; in flat mode its base returns to
    /// zero. The batch is re-merged and roads are rebuilt from their ground
    /// positions. The caller restarts the growth animation.
    pub fn apply_terrain_mode(&mut self, on: bool, ground: &dyn GroundSampler) {
        self.terrain_mode = on;

        for building in &mut self.buildings {
            anchor_building(building, on, ground);
        }
        for collider in &mut self.colliders {
            if let Some(aabb) = self.buildings.get(collider.building).and_then(|b| placement_helper(&b.mesh)) {
                collider.aabb = aabb;
            }
        }
        self.rebuild_batch();

        let mut roads: Vec<RoadPolyline> = self.roads().cloned().collect();
        {
            let colliders = ColliderSet(&self.colliders);
            let layered = Layered(vec![ground, &colliders as &dyn GroundSampler]);
            let road_ground: &dyn GroundSampler = if on { &layered } else { &NoGround };
            for road in &mut roads {
                road.drape(road_ground);
            }
        }
        self.install_roads(roads);

        let tree_ground: &dyn GroundSampler = if on { ground } else { &NoGround };
        for object in self.arena.group_mut(SceneGroup::Trees) {
            if let SceneObject::Trees(trees) = object {
                trees.drape(tree_ground);
            }
        }

        info!("Terrain mode {}", if on { "on" } else { "off" });
    }

    /// Height the orbit target rests at over (x, z): the terrain or a
    /// building reached by a probe starting at [`TARGET_PROBE_FLOOR`]. Zero in
    /// flat mode or when the probe misses.
    pub fn target_height(&self, x: f32, z: f32) -> f32 {
        if !self.terrain_mode {
            return 0.0;
        }
        let window = ProbeWindow {
            floor: TARGET_PROBE_FLOOR,
            ceiling: PROBE_CEILING,
        };
        let terrain = self.terrain.as_ref().and_then(|t| t.probe(x, z, window));
        let buildings = self
            .colliders
            .iter()
            .filter_map(|c| c.probe(x, z, window))
            .min_by(|a, b| a.total_cmp(b));
        match (terrain, buildings) {
            (Some(a), Some(b)) => a.min(b),
            (a, b) => a.or(b).unwrap_or(0.0),
        }
    }

    /// Distance along a ray to the nearest building or terrain hit.
    pub fn ray_hit(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<f32> {
        let buildings = self
            .colliders
            .iter()
            .filter_map(|c| c.aabb.ray_hit(origin, dir))
            .filter(|t| *t <= max_distance);
        let terrain = self
            .terrain
            .as_ref()
            .filter(|_| self.terrain_mode)
            .and_then(|t| t.ray_hit(origin, dir, max_distance));
        buildings.chain(terrain).min_by(|a, b| a.total_cmp(b))
    }
}

fn anchor_building(building: &mut BuildingGeometry, on: bool, ground: &dyn GroundSampler) {
    let bounds = building.mesh.bounds();
    if !bounds.is_finite() {
        return;
    }
    // Back to the flat reference first so repeated toggles do not stack.
    let mut offset = -bounds.min.y;
    if on {
        let c = bounds.center();
        if let Some(h) = ground.ground_height_at(c.x, c.z) {
            offset += h;
        }
    }
    if offset != 0.0 {
        building.mesh.translate(Vec3::new(0.0, offset, 0.0));
    }
}
