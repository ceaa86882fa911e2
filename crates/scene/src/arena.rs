//! Scene objects addressed by generation-checked handles.
//!
//! A rebuild does not patch groups in place: it bumps the generation, which
//! drops every object and makes every outstanding handle stale at once.

use crate::mesh_data::MeshData;
use crate::road_overlay::{RoadOverlay, RoadPolyline};
use crate::trees::TreeInstances;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SceneGroup {
    Buildings,
    Roads,
    AnimatedRoads,
    WaterShader,
    WaterSimple,
    Trees,
}

impl SceneGroup {
    pub const ALL: [SceneGroup; 6] = [
        SceneGroup::Buildings,
        SceneGroup::Roads,
        SceneGroup::AnimatedRoads,
        SceneGroup::WaterShader,
        SceneGroup::WaterSimple,
        SceneGroup::Trees,
    ];

    fn slot(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            SceneGroup::Buildings => "Buildings",
            SceneGroup::Roads => "Roads",
            SceneGroup::AnimatedRoads => "Animated Roads",
            SceneGroup::WaterShader => "Water",
            SceneGroup::WaterSimple => "Water (simple)",
            SceneGroup::Trees => "Trees",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SceneObject {
    /// The merged building mesh; `revision` changes whenever it is re-merged.
    BuildingBatch { mesh: MeshData, revision: u64 },
    Road(RoadPolyline),
    Overlay(RoadOverlay),
    Water(MeshData),
    Trees(TreeInstances),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle {
    pub group: SceneGroup,
    pub index: u32,
    pub generation: u32,
}

#[derive(Debug, Clone, Default)]
pub struct SceneArena {
    generations: [u32; 6],
    groups: [Vec<SceneObject>; 6],
}

impl SceneArena {
    pub fn generation(&self, group: SceneGroup) -> u32 {
        self.generations[group.slot()]
    }

    pub fn insert(&mut self, group: SceneGroup, object: SceneObject) -> ObjectHandle {
        let objects = &mut self.groups[group.slot()];
        objects.push(object);
        ObjectHandle {
            group,
            index: (objects.len() - 1) as u32,
            generation: self.generations[group.slot()],
        }
    }

    pub fn is_live(&self, handle: ObjectHandle) -> bool {
        handle.generation == self.generation(handle.group)
            && (handle.index as usize) < self.groups[handle.group.slot()].len()
    }

    pub fn get(&self, handle: ObjectHandle) -> Option<&SceneObject> {
        if !self.is_live(handle) {
            return None;
        }
        self.groups[handle.group.slot()].get(handle.index as usize)
    }

    pub fn get_mut(&mut self, handle: ObjectHandle) -> Option<&mut SceneObject> {
        if !self.is_live(handle) {
            return None;
        }
        self.groups[handle.group.slot()].get_mut(handle.index as usize)
    }

    pub fn group(&self, group: SceneGroup) -> &[SceneObject] {
        &self.groups[group.slot()]
    }

    pub fn group_mut(&mut self, group: SceneGroup) -> &mut [SceneObject] {
        &mut self.groups[group.slot()]
    }

    /// Live handles of a group, in insertion order.
    pub fn handles(&self, group: SceneGroup) -> impl Iterator<Item = ObjectHandle> + '_ {
        let generation = self.generation(group);
        (0..self.groups[group.slot()].len()).map(move |i| ObjectHandle {
            group,
            index: i as u32,
            generation,
        })
    }

    pub fn len(&self, group: SceneGroup) -> usize {
        self.groups[group.slot()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(Vec::is_empty)
    }

    /// Drops one group and stales its handles.
    pub fn reset_group(&mut self, group: SceneGroup) {
        self.generations[group.slot()] = self.generations[group.slot()].wrapping_add(1);
        self.groups[group.slot()].clear();
    }

    /// Drops every group and stales every handle.
    pub fn invalidate(&mut self) {
        for group in SceneGroup::ALL {
            self.reset_group(group);
        }
    }
}
