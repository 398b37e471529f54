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

//! Named joints with object-space poses.

use serde::{Deserialize, Deserializer, Serialize};
use tether_core::JointTransform;

/// Sentinel used by skeleton formats for "no joint". Never returned by
/// [`SkeletonComponent::joint_index`].
pub const INVALID_JOINT_INDEX: u16 = u16::MAX;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Joint {
    name: String,
    #[serde(default)]
    object_space: JointTransform,
}

/// The skeleton of an animated entity.
///
/// Poses are stored in the owner's object space, which is what slot
/// attachments are expressed against. An animation driver updates them with
/// [`set_object_space_transform`](Self::set_object_space_transform).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkeletonComponent {
    #[serde(deserialize_with = "bounded_joints")]
    joints: Vec<Joint>,
}

fn bounded_joints<'de, D>(deserializer: D) -> Result<Vec<Joint>, D::Error>
where
    D: Deserializer<'de>,
{
    let joints = Vec::<Joint>::deserialize(deserializer)?;
    if joints.len() > INVALID_JOINT_INDEX as usize {
        return Err(serde::de::Error::invalid_length(
            joints.len(),
            &"at most 65535 joints",
        ));
    }
    Ok(joints)
}

impl SkeletonComponent {
    /// Creates a skeleton with no joints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a joint and returns its index.
    ///
    /// # Panics
    /// Panics if the skeleton already holds `INVALID_JOINT_INDEX` joints.
    pub fn add_joint(&mut self, name: impl Into<String>, pose: JointTransform) -> u16 {
        let index = self.joints.len();
        assert!(
            index < INVALID_JOINT_INDEX as usize,
            "skeleton joint capacity exceeded"
        );
        self.joints.push(Joint {
            name: name.into(),
            object_space: pose,
        });
        index as u16
    }

    /// Builder form of [`add_joint`](Self::add_joint).
    pub fn with_joint(mut self, name: impl Into<String>, pose: JointTransform) -> Self {
        self.add_joint(name, pose);
        self
    }

    /// Index of the first joint called `name`.
    pub fn joint_index(&self, name: &str) -> Option<u16> {
        self.joints
            .iter()
            .position(|joint| joint.name == name)
            .and_then(|index| u16::try_from(index).ok())
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn joint_name(&self, index: u16) -> Option<&str> {
        self.joints.get(index as usize).map(|joint| joint.name.as_str())
    }

    /// The current object-space pose of joint `index`.
    pub fn object_space_transform(&self, index: u16) -> Option<JointTransform> {
        self.joints.get(index as usize).map(|joint| joint.object_space)
    }

    /// Replaces the pose of joint `index`. Returns `false` for an unknown index.
    pub fn set_object_space_transform(&mut self, index: u16, pose: JointTransform) -> bool {
        match self.joints.get_mut(index as usize) {
            Some(joint) => {
                joint.object_space = pose;
                true
            }
            None => false,
        }
    }
}
