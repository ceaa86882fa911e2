//! Instanced tree transforms.
//!
//! Trees share two instanced meshes (crown and trunk). The instance table has
//! one slot per dataset feature so a tree's slot index is its feature index;
//! rejected trees leave their slot empty.

use bevy::math::{Mat4, Quat, Vec2, Vec3};
use rand::Rng;

use crate::config::{TREE_CROWN_LIFT_DIVISOR, TREE_HEIGHT};
use crate::terrain::GroundSampler;

/// Crown center height above the tree base.
pub fn crown_offset(height_tag: f32) -> f32 {
    TREE_HEIGHT / 4.0 + TREE_HEIGHT / 2.25 + height_tag / TREE_CROWN_LIFT_DIVISOR
}

/// Trunk center height above the tree base.
pub const TRUNK_OFFSET: f32 = TREE_HEIGHT / 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct TreeInstance {
    /// Ground position (world X, Z).
    pub ground: Vec2,
    /// Base height.
    pub base: f32,
    pub height_tag: f32,
    /// Random crown rotations about X and Y, radians in [0, PI).
    pub spin: Vec2,
}

impl TreeInstance {
    pub fn crown_transform(&self) -> Mat4 {
        let translation = Vec3::new(self.ground.x, self.base + crown_offset(self.height_tag), self.ground.y);
        let rotation = Quat::from_rotation_y(self.spin.y) * Quat::from_rotation_x(self.spin.x);
        Mat4::from_rotation_translation(rotation, translation)
    }

    pub fn trunk_transform(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(self.ground.x, self.base + TRUNK_OFFSET, self.ground.y))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeInstances {
    slots: Vec<Option<TreeInstance>>,
}

impl TreeInstances {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn get(&self, index: usize) -> Option<&TreeInstance> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &TreeInstance)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|t| (i, t)))
    }

    /// Fills slot `index` with a tree at `ground`, drawing its two crown
    /// rotations from `rng`. Out-of-range indices are ignored.
    pub fn place(&mut self, index: usize, ground: Vec2, base: f32, height_tag: f32, rng: &mut impl Rng) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            return false;
        };
        let spin = Vec2::new(
            rng.gen::<f32>() * std::f32::consts::PI,
            rng.gen::<f32>() * std::f32::consts::PI,
        );
        *slot = Some(TreeInstance {
            ground,
            base,
            height_tag,
            spin,
        });
        true
    }

    /// Re-anchors every tree on `ground`, falling back to zero where the
    /// probe misses.
    pub fn drape(&mut self, ground: &dyn GroundSampler) {
        for tree in self.slots.iter_mut().flatten() {
            tree.base = ground.ground_height_at(tree.ground.x, tree.ground.y).unwrap_or(0.0);
        }
    }
}
