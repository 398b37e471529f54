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

//! Declaration of a named attachment point on an entity.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use tether_core::math::Mat4;

/// Declares a slot: a named point on its owner where catalog items can be
/// attached.
///
/// The component describes *where* and *what kind of* item may go; it never
/// stores the entity currently occupying the slot. That association is owned
/// by the slot registry, which tracks components by `SlotId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotComponent {
    slot_name: String,
    #[serde(default)]
    attachment_transform: Mat4,
    #[serde(default)]
    joint_name: Option<String>,
    #[serde(default)]
    config_path: PathBuf,
    #[serde(default, deserialize_with = "bounded_filters")]
    type_filters: Vec<String>,
    #[serde(skip)]
    loaded_item_name: String,
}

impl SlotComponent {
    /// Maximum number of type filters a slot can carry.
    pub const MAX_TYPE_FILTERS: usize = 8;

    /// Creates a slot with an identity attachment and no joint.
    pub fn new(slot_name: impl Into<String>) -> Self {
        Self {
            slot_name: slot_name.into(),
            attachment_transform: Mat4::IDENTITY,
            joint_name: None,
            config_path: PathBuf::new(),
            type_filters: Vec::new(),
            loaded_item_name: String::new(),
        }
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = path.into();
        self
    }

    pub fn with_joint(mut self, joint_name: impl Into<String>) -> Self {
        self.joint_name = Some(joint_name.into());
        self
    }

    pub fn with_attachment_transform(mut self, transform: Mat4) -> Self {
        self.attachment_transform = transform;
        self
    }

    /// Builder form of [`add_type_filter`](Self::add_type_filter); filters
    /// past the capacity are dropped with a warning.
    pub fn with_type_filter(mut self, item_type: impl Into<String>) -> Self {
        let item_type = item_type.into();
        if !self.add_type_filter(item_type.clone()) {
            log::warn!(
                "Slot '{}' already has {} type filters, dropping '{}'",
                self.slot_name,
                Self::MAX_TYPE_FILTERS,
                item_type
            );
        }
        self
    }

    pub fn slot_name(&self) -> &str {
        &self.slot_name
    }

    pub fn set_slot_name(&mut self, name: impl Into<String>) {
        self.slot_name = name.into();
    }

    /// Local offset of the attached item, relative to the joint (if any) or
    /// to the owner.
    pub fn attachment_transform(&self) -> Mat4 {
        self.attachment_transform
    }

    pub fn set_attachment_transform(&mut self, transform: Mat4) {
        self.attachment_transform = transform;
    }

    pub fn joint_name(&self) -> Option<&str> {
        self.joint_name.as_deref()
    }

    pub fn set_joint_name(&mut self, joint_name: Option<String>) {
        self.joint_name = joint_name;
    }

    /// Path of the item catalog consulted when attaching by name.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn set_config_path(&mut self, path: impl Into<PathBuf>) {
        self.config_path = path.into();
    }

    pub fn type_filters(&self) -> &[String] {
        &self.type_filters
    }

    /// Adds a type tag. Returns `false` when the slot already holds
    /// [`MAX_TYPE_FILTERS`](Self::MAX_TYPE_FILTERS) filters.
    #[must_use]
    pub fn add_type_filter(&mut self, item_type: impl Into<String>) -> bool {
        if self.type_filters.len() >= Self::MAX_TYPE_FILTERS {
            return false;
        }
        self.type_filters.push(item_type.into());
        true
    }

    pub fn remove_type_filter(&mut self, index: usize) -> Option<String> {
        (index < self.type_filters.len()).then(|| self.type_filters.remove(index))
    }

    /// Whether an item of `item_type` fits this slot. A slot without filters
    /// accepts everything.
    pub fn accepts_type(&self, item_type: &str) -> bool {
        self.type_filters.is_empty() || self.type_filters.iter().any(|t| t == item_type)
    }

    /// Name of the item currently loaded or loading; empty when none.
    pub fn loaded_item_name(&self) -> &str {
        &self.loaded_item_name
    }

    pub fn set_loaded_item_name(&mut self, name: impl Into<String>) {
        self.loaded_item_name = name.into();
    }
}

fn bounded_filters<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let filters = Vec::<String>::deserialize(deserializer)?;
    if filters.len() > SlotComponent::MAX_TYPE_FILTERS {
        return Err(serde::de::Error::invalid_length(
            filters.len(),
            &"at most 8 type filters",
        ));
    }
    Ok(filters)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ninth_filter_is_rejected() {
        let mut slot = SlotComponent::new("Belt");
        for i in 0..SlotComponent::MAX_TYPE_FILTERS {
            assert!(slot.add_type_filter(format!("type{i}")));
        }
        assert!(!slot.add_type_filter("overflow"));
        assert_eq!(slot.type_filters().len(), SlotComponent::MAX_TYPE_FILTERS);
    }

    #[test]
    fn empty_filters_accept_any_type() {
        let open = SlotComponent::new("Hand");
        assert!(open.accepts_type("Sword"));

        let picky = SlotComponent::new("Head").with_type_filter("Hat");
        assert!(picky.accepts_type("Hat"));
        assert!(!picky.accepts_type("Sword"));
    }

    #[test]
    fn remove_filter_out_of_range_is_none() {
        let mut slot = SlotComponent::new("Back").with_type_filter("Cape");
        assert_eq!(slot.remove_type_filter(3), None);
        assert_eq!(slot.remove_type_filter(0).as_deref(), Some("Cape"));
        assert!(slot.type_filters().is_empty());
    }

    #[test]
    fn declaration_parses_from_ron() {
        let slot: SlotComponent = ron::from_str(
            r#"(slot_name: "Head", joint_name: Some("head"), config_path: "items.yaml", type_filters: ["Hat"])"#,
        )
        .unwrap();
        assert_eq!(slot.slot_name(), "Head");
        assert_eq!(slot.joint_name(), Some("head"));
        assert_eq!(slot.attachment_transform(), Mat4::IDENTITY);
        assert!(slot.loaded_item_name().is_empty());
    }

    #[test]
    fn declaration_with_too_many_filters_fails() {
        let text = r#"(slot_name: "X", type_filters: ["a","b","c","d","e","f","g","h","i"])"#;
        assert!(ron::from_str::<SlotComponent>(text).is_err());
    }
}
