//! Common components used across multiple entity types.

use bitflags::bitflags;
use delver_logic::geometry::{Aabb, LocalBox, Pose};
use glam::Vec3;

/// World placement of an entity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transform {
    pub pose: Pose,
}

impl Transform {
    pub fn new(pose: Pose) -> Self {
        Self { pose }
    }

    pub fn at(position: Vec3) -> Self {
        Self {
            pose: Pose::from_position(position),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.pose.position
    }
}

bitflags! {
    /// Collision classification. Spatial queries take a mask of these.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Layer: u32 {
        /// Placed (or candidate) dungeon modules.
        const MODULE = 1 << 0;
        /// Doors, locked doors and fillers.
        const CONNECTOR = 1 << 1;
        /// Static level geometry the generator must build around.
        const SCENERY = 1 << 2;
    }
}

impl Layer {
    /// Layers a new module must not intrude into.
    pub const BLOCKING: Layer = Layer::MODULE.union(Layer::SCENERY);
}

/// Local collision box plus its classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub shape: LocalBox,
    pub layer: Layer,
}

impl Collider {
    pub fn new(shape: LocalBox, layer: Layer) -> Self {
        Self { shape, layer }
    }

    /// Bounds computed from the current pose, never cached.
    pub fn world_bounds(&self, pose: &Pose) -> Aabb {
        self.shape.world_bounds(pose)
    }
}

/// Whether a module is currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visible(pub bool);

impl Default for Visible {
    fn default() -> Self {
        Visible(true)
    }
}
