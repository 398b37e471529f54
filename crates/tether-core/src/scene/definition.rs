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

//! A stable, serializable description of a loadable sub-scene.

use super::SceneGraph;
use crate::ecs::EntityId;
use crate::math::{Mat4, Quaternion, Vec3};
use serde::{Deserialize, Serialize};

/// The root container for an item's scene file.
///
/// A definition always has exactly one root node, so instantiating it under a
/// container produces exactly one direct child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDefinition {
    /// The node instantiated directly under the load container.
    pub root: NodeDefinition,
}

/// A node of a scene definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDefinition {
    /// Name given to the spawned entity.
    pub name: String,
    /// Local transform relative to the parent node.
    #[serde(default)]
    pub transform: TransformDefinition,
    /// Child nodes, in order.
    #[serde(default)]
    pub children: Vec<NodeDefinition>,
}

/// Serializable translation/rotation/scale triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformDefinition {
    /// Local translation.
    pub translation: Vec3,
    /// Local rotation.
    pub rotation: Quaternion,
    /// Local, possibly non-uniform, scale.
    pub scale: Vec3,
}

impl Default for TransformDefinition {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quaternion::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl TransformDefinition {
    /// Converts to a local matrix.
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_trs(self.translation, self.rotation, self.scale)
    }
}

impl SceneDefinition {
    /// Parses a definition from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    /// A definition made of a single, empty node.
    pub fn single(name: impl Into<String>) -> Self {
        Self {
            root: NodeDefinition {
                name: name.into(),
                transform: TransformDefinition::default(),
                children: Vec::new(),
            },
        }
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        fn count(node: &NodeDefinition) -> usize {
            1 + node.children.iter().map(count).sum::<usize>()
        }
        count(&self.root)
    }

    /// Spawns the node tree under `parent` and returns the root entity.
    pub fn instantiate(&self, scene: &mut dyn SceneGraph, parent: EntityId) -> EntityId {
        instantiate_node(&self.root, scene, parent)
    }
}

fn instantiate_node(node: &NodeDefinition, scene: &mut dyn SceneGraph, parent: EntityId) -> EntityId {
    let entity = scene.spawn_entity(&node.name);
    scene.set_local_transform(entity, node.transform.to_mat4());
    scene.add_child(parent, entity);
    for child in &node.children {
        instantiate_node(child, scene, entity);
    }
    entity
}
