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

//! The `GameWorld` facade: one scene and the slot system that serves it.
//!
//! Every structural change made through `GameWorld` is reported to the slot
//! system before the call returns, so slot states read right after a despawn
//! or a component removal are already up to date.

use crate::config::{GameWorldConfig, LoaderKind};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tether_agents::{SlotError, SlotState, SlotSystem};
use tether_core::math::Mat4;
use tether_core::{EntityId, ExternalLoader, SceneDefinition, SlotId};
use tether_data::{Scene, SkeletonComponent, SlotComponent};
use tether_io::{AsyncSceneLoader, CatalogItem, ImmediateSceneLoader, ItemCatalog, SceneSource};

/// A scene with slot attachment built in.
///
/// # Examples
///
/// ```rust,ignore
/// let mut world = GameWorld::new(GameWorldConfig::default())?;
/// let knight = world.spawn("Knight");
/// let hand = world
///     .add_slot_component(knight, SlotComponent::new("Hand").with_config_path("weapons.yaml"))
///     .unwrap();
/// world.attach_item(hand, "Sword")?;
/// world.update(1.0 / 60.0);
/// ```
pub struct GameWorld {
    scene: Scene,
    slots: SlotSystem,
    source: SceneSource,
}

impl GameWorld {
    /// Creates an empty world with the loader described by `config`.
    pub fn new(config: GameWorldConfig) -> Result<Self> {
        Self::with_catalog(config, Arc::new(ItemCatalog::new()))
    }

    /// Creates an empty world whose slot system shares `catalog`.
    pub fn with_catalog(config: GameWorldConfig, catalog: Arc<ItemCatalog>) -> Result<Self> {
        let source = SceneSource::new();
        let loader: Box<dyn ExternalLoader> = match config.loader_kind {
            LoaderKind::Background => Box::new(
                AsyncSceneLoader::new(config.loader.clone(), source.clone())
                    .context("Failed to start the scene loader workers")?,
            ),
            LoaderKind::Immediate => Box::new(ImmediateSceneLoader::new(source.clone())),
        };

        let mut scene = Scene::new();
        let mut slots = SlotSystem::with_catalog(loader, catalog);
        slots.set_catalog_root(config.catalog_root.clone());
        slots.set_scene(Some(&mut scene));
        log::info!("Game world created ({:?} loading).", config.loader_kind);

        Ok(Self {
            scene,
            slots,
            source,
        })
    }

    /// Read access to the scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn slot_system(&self) -> &SlotSystem {
        &self.slots
    }

    /// Makes `definition` loadable from `path` without a file on disk.
    pub fn register_scene(&self, path: impl Into<std::path::PathBuf>, definition: SceneDefinition) {
        self.source.register(path, definition);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Frame
    // ─────────────────────────────────────────────────────────────────────

    /// Advances the world by one frame.
    pub fn update(&mut self, dt: f32) {
        self.slots.process(&mut self.scene, dt);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Entity Lifecycle
    // ─────────────────────────────────────────────────────────────────────

    pub fn spawn(&mut self, name: &str) -> EntityId {
        self.scene.spawn(name)
    }

    pub fn spawn_child(&mut self, parent: EntityId, name: &str) -> EntityId {
        self.scene.spawn_child(parent, name)
    }

    /// Instantiates `definition` as a child of `parent`.
    pub fn instantiate(&mut self, definition: &SceneDefinition, parent: EntityId) -> EntityId {
        let root = definition.instantiate(&mut self.scene, parent);
        self.slots.sync(&mut self.scene);
        root
    }

    /// Removes `entity` and its subtree. Slots inside it are forgotten and
    /// any slot it occupied becomes empty.
    pub fn despawn(&mut self, entity: EntityId) -> bool {
        let removed = self.scene.despawn(entity);
        self.slots.sync(&mut self.scene);
        removed
    }

    /// Reparents `child` under `parent`.
    ///
    /// Moving a slot's occupant away from the slot owner releases the slot
    /// first; the entity then lives on under `parent` as a plain entity.
    pub fn add_child(&mut self, parent: EntityId, child: EntityId) -> bool {
        let occupied = self.slots.lookup_slot_for_entity(child);
        if !self.scene.add_child(parent, child) {
            return false;
        }
        if let Some(slot) = occupied {
            if self.scene.slot_owner(slot) != Some(parent) {
                self.slots.detach_entity(&mut self.scene, child);
                log::debug!("{} left {} by being reparented.", child, slot);
            }
        }
        true
    }

    pub fn set_local_transform(&mut self, entity: EntityId, transform: Mat4) {
        self.scene.set_local_transform(entity, transform);
    }

    pub fn set_skeleton(&mut self, entity: EntityId, skeleton: SkeletonComponent) -> bool {
        self.scene.set_skeleton(entity, skeleton)
    }

    /// Mutable access to a skeleton, for animation drivers.
    pub fn skeleton_mut(&mut self, entity: EntityId) -> Option<&mut SkeletonComponent> {
        self.scene.skeleton_mut(entity)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Slot Components
    // ─────────────────────────────────────────────────────────────────────

    /// Adds a slot to `owner`. It is tracked, `NotLoaded`, on return.
    pub fn add_slot_component(&mut self, owner: EntityId, component: SlotComponent) -> Option<SlotId> {
        let slot = self.scene.add_slot_component(owner, component);
        self.slots.sync(&mut self.scene);
        slot
    }

    /// Removes a slot. Its item is removed on the next [`update`](Self::update).
    pub fn remove_slot_component(&mut self, slot: SlotId) -> Option<SlotComponent> {
        let component = self.scene.remove_slot_component(slot);
        self.slots.sync(&mut self.scene);
        component
    }

    pub fn slot_component(&self, slot: SlotId) -> Option<&SlotComponent> {
        self.scene.slot_component(slot)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Attachment
    // ─────────────────────────────────────────────────────────────────────

    pub fn attach_item(&mut self, slot: SlotId, item_name: &str) -> Result<EntityId, SlotError> {
        self.slots.attach_item(&mut self.scene, slot, item_name)
    }

    /// Attaches `item_name` to every slot named `slot_name` under `root`.
    /// Returns how many loads were started.
    pub fn attach_item_to_slot(&mut self, root: EntityId, slot_name: &str, item_name: &str) -> usize {
        self.slots
            .attach_item_to_slot(&mut self.scene, root, slot_name, item_name)
    }

    pub fn attach_entity_to_slot(
        &mut self,
        slot: SlotId,
        entity: EntityId,
        item_name: &str,
    ) -> Result<(), SlotError> {
        self.slots
            .attach_entity_to_slot(&mut self.scene, slot, entity, item_name)
    }

    pub fn unload_item(&mut self, slot: SlotId) -> Option<EntityId> {
        self.slots.unload_item(&mut self.scene, slot)
    }

    pub fn set_attachment_transform(&mut self, slot: SlotId, transform: Mat4) {
        self.slots
            .set_attachment_transform(&mut self.scene, slot, transform);
    }

    pub fn slot_state(&self, slot: SlotId) -> Option<SlotState> {
        self.slots.try_slot_state(slot)
    }

    pub fn lookup_loaded_entity(&self, slot: SlotId) -> Option<EntityId> {
        self.slots.lookup_loaded_entity(slot)
    }

    pub fn lookup_slot_for_entity(&self, entity: EntityId) -> Option<SlotId> {
        self.slots.lookup_slot_for_entity(entity)
    }

    pub fn catalog_items(&self, config_path: &Path) -> Vec<CatalogItem> {
        self.slots.catalog_items(config_path)
    }

    pub fn suitable_item_name(&self, slot: SlotId) -> Option<String> {
        self.slots.suitable_item_name(&self.scene, slot)
    }
}
