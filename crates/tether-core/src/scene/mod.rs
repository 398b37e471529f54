// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The scene-graph contract consumed by loaders and the slot runtime.
//!
//! Loaders only need to create entities, parent them and set their local
//! transforms. Everything richer (skeletons, slot storage, notifications)
//! lives on the concrete scene type in `tether-data`.

mod definition;

pub use definition::{NodeDefinition, SceneDefinition, TransformDefinition};

use crate::ecs::EntityId;
use crate::math::{Mat4, Quaternion, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SCENE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a scene instance.
///
/// Loaders remember the scene they are bound to so that results produced for
/// one scene are never instantiated into another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneId(u64);

impl SceneId {
    /// Allocates a process-unique id.
    pub fn next() -> Self {
        Self(NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw value, for logging.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scene#{}", self.0)
    }
}

/// Minimal structural access to a live scene.
///
/// All methods tolerate dead ids: queries return `None` or an empty slice,
/// mutations return `false` or do nothing.
pub trait SceneGraph {
    /// The identity of this scene instance.
    fn scene_id(&self) -> SceneId;

    /// Creates a new root-level entity with the given name.
    fn spawn_entity(&mut self, name: &str) -> EntityId;

    /// Whether `entity` still refers to a live entity.
    fn is_alive(&self, entity: EntityId) -> bool;

    /// Makes `child` the last child of `parent`, detaching it from any
    /// previous parent. Returns `false` if either id is dead or the move
    /// would create a cycle.
    fn add_child(&mut self, parent: EntityId, child: EntityId) -> bool;

    /// Detaches `child` from its parent and destroys it with its whole subtree.
    fn remove_child(&mut self, child: EntityId) -> bool;

    /// The parent of `entity`, if any.
    fn parent(&self, entity: EntityId) -> Option<EntityId>;

    /// The ordered children of `entity`.
    fn children(&self, entity: EntityId) -> &[EntityId];

    /// The display name of `entity`.
    fn name(&self, entity: EntityId) -> Option<&str>;

    /// Renames `entity`.
    fn set_name(&mut self, entity: EntityId, name: &str);

    /// The transform of `entity` relative to its parent.
    fn local_transform(&self, entity: EntityId) -> Option<Mat4>;

    /// Replaces the transform of `entity` relative to its parent.
    fn set_local_transform(&mut self, entity: EntityId, transform: Mat4);
}

/// Object-space pose of a skeleton joint: position, orientation and a
/// uniform scale factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointTransform {
    /// Joint origin in the skeleton owner's object space.
    pub position: Vec3,
    /// Joint orientation, expected to be normalized.
    pub orientation: Quaternion,
    /// Uniform scale.
    pub scale: f32,
}

impl JointTransform {
    /// The rest pose: origin, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        orientation: Quaternion::IDENTITY,
        scale: 1.0,
    };

    /// Creates a joint pose.
    pub fn new(position: Vec3, orientation: Quaternion, scale: f32) -> Self {
        Self {
            position,
            orientation,
            scale,
        }
    }

    /// Returns `UniformScale(scale) * Translate(position) * Rotate(orientation)`.
    ///
    /// The scale is applied last, so it also scales the joint origin.
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_uniform_scale(self.scale)
            * Mat4::from_translation(self.position)
            * Mat4::from_quat(self.orientation)
    }
}

impl Default for JointTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Vec4, FRAC_PI_2};

    #[test]
    fn scene_ids_are_unique() {
        let a = SceneId::next();
        let b = SceneId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn joint_matrix_scales_the_posed_point_and_origin() {
        let joint = JointTransform::new(
            Vec3::new(0.0, 1.0, 0.0),
            Quaternion::from_axis_angle(Vec3::Y, FRAC_PI_2),
            3.0,
        );
        let m = joint.to_mat4();
        // +X rotated to -Z, lifted by one unit, then everything scaled by 3.
        let p = m * Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert!((p.x - 0.0).abs() < 1e-5);
        assert!((p.y - 3.0).abs() < 1e-5);
        assert!((p.z + 3.0).abs() < 1e-5);
    }
}
