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

//! The per-frame façade over the slot registry.

use super::registry::{Completion, SlotRegistry, SlotState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tether_core::math::Mat4;
use tether_core::{EntityId, ExternalLoader, LoadResult, SceneId, SlotId};
use tether_data::{Scene, SceneEvent};
use tether_io::{CatalogItem, ItemCatalog};
use thiserror::Error;

/// Why an attach request was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlotError {
    /// The catalog of the slot has no item with that name.
    #[error("item '{item}' not found in catalog {config_path}")]
    ItemNotFound {
        /// The requested item.
        item: String,
        /// The catalog that was searched.
        config_path: PathBuf,
    },
    /// The slot is not tracked by this system.
    #[error("{0} is not tracked by the slot system")]
    UntrackedSlot(SlotId),
    /// The slot component no longer exists in the scene.
    #[error("{0} has no owner in the scene")]
    MissingOwner(SlotId),
    /// The entity is dead or cannot be parented under the slot owner.
    #[error("{0} cannot be attached to this slot")]
    InvalidEntity(EntityId),
}

/// A finished load, sent back by the loader callback.
struct LoadCompletion {
    slot: SlotId,
    ticket: u64,
    result: LoadResult,
}

/// Attaches catalog items to slots and keeps them in place.
///
/// The system learns about slot components through the scene's event
/// journal: every public method that touches a scene first calls
/// [`sync`](Self::sync). Loads are started through the configured
/// [`ExternalLoader`]; their callbacks only carry `(SlotId, ticket)` back over
/// a channel, and the registry decides whether the result still matters.
pub struct SlotSystem {
    registry: SlotRegistry,
    loader: Box<dyn ExternalLoader>,
    catalog: Arc<ItemCatalog>,
    catalog_root: Option<PathBuf>,
    completion_tx: flume::Sender<LoadCompletion>,
    completion_rx: flume::Receiver<LoadCompletion>,
    scene: Option<SceneId>,
}

impl SlotSystem {
    /// Creates a system with its own catalog cache.
    pub fn new(loader: Box<dyn ExternalLoader>) -> Self {
        Self::with_catalog(loader, Arc::new(ItemCatalog::new()))
    }

    /// Creates a system that shares `catalog` with others.
    pub fn with_catalog(loader: Box<dyn ExternalLoader>, catalog: Arc<ItemCatalog>) -> Self {
        let (completion_tx, completion_rx) = flume::unbounded();
        Self {
            registry: SlotRegistry::new(),
            loader,
            catalog,
            catalog_root: None,
            completion_tx,
            completion_rx,
            scene: None,
        }
    }

    /// Directory that relative slot config paths are resolved against.
    pub fn set_catalog_root(&mut self, root: Option<PathBuf>) {
        self.catalog_root = root;
    }

    pub fn catalog(&self) -> &Arc<ItemCatalog> {
        &self.catalog
    }

    /// Read access to the state machine, mostly for diagnostics.
    pub fn registry(&self) -> &SlotRegistry {
        &self.registry
    }

    /// The scene this system is bound to.
    pub fn scene_id(&self) -> Option<SceneId> {
        self.scene
    }

    // ─────────────────────────────────────────────────────────────────────
    // Binding
    // ─────────────────────────────────────────────────────────────────────

    /// Swaps the loader. Loads in flight on the old one will never report
    /// back, so their slots are marked failed.
    pub fn set_loader(&mut self, mut loader: Box<dyn ExternalLoader>) {
        let loading: Vec<SlotId> = self
            .registry
            .slots()
            .iter()
            .copied()
            .filter(|slot| self.registry.try_state(*slot) == Some(SlotState::Loading))
            .collect();
        for slot in loading {
            log::warn!("Loader replaced while {} was loading; marking it failed.", slot);
            self.registry.mark_failed(slot);
        }
        self.loader.set_scene(None);
        loader.set_scene(self.scene);
        self.loader = loader;
    }

    /// Binds the system to `scene`, or unbinds it with `None`.
    ///
    /// Changing scene forgets every tracked slot (the old scene's entities
    /// are not touched) and registers the slots that already exist in the
    /// new one. Rebinding to the same scene does nothing.
    pub fn set_scene(&mut self, scene: Option<&mut Scene>) {
        let new_id = scene.as_ref().map(|s| s.id());
        if new_id == self.scene {
            return;
        }
        if !self.registry.is_empty() {
            log::info!("Slot system leaving scene; forgetting {} slot(s).", self.registry.len());
        }
        self.registry.clear();
        while self.completion_rx.try_recv().is_ok() {}
        self.scene = new_id;
        self.loader.set_scene(new_id);

        if let Some(scene) = scene {
            // Slots added before binding are picked up below.
            scene.drain_events();
            for slot in scene.all_slots() {
                self.registry.register(slot);
            }
            log::info!(
                "Slot system bound to {} with {} slot(s).",
                scene.id(),
                self.registry.len()
            );
        }
    }

    /// Applies the scene's pending structural events to the registry.
    pub fn sync(&mut self, scene: &mut Scene) {
        if self.scene != Some(scene.id()) {
            self.set_scene(Some(scene));
            return;
        }
        for event in scene.drain_events() {
            match event {
                SceneEvent::SlotAdded { slot, .. } => {
                    if !self.registry.contains(slot) {
                        self.registry.register(slot);
                    }
                }
                SceneEvent::SlotRemoved { slot, .. } => {
                    if let Some(occupant) = self.registry.unregister(slot) {
                        log::debug!("{} removed; {} scheduled for deletion.", slot, occupant);
                    }
                }
                SceneEvent::EntityRemoved(entity) => {
                    if let Some(slot) = self.registry.on_entity_removed(entity) {
                        log::debug!("{} was removed from the scene; {} is empty.", entity, slot);
                        if let Some(component) = scene.slot_component_mut(slot) {
                            component.set_loaded_item_name("");
                        }
                    }
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Frame
    // ─────────────────────────────────────────────────────────────────────

    /// Runs one frame: deferred removals, transform updates, loader work and
    /// completion delivery.
    pub fn process(&mut self, scene: &mut Scene, dt: f32) {
        self.sync(scene);

        // Removing an item can remove slots nested in it, which releases
        // their own items; keep going until nothing new is released.
        loop {
            let pending = self.registry.take_delete_pending();
            if pending.is_empty() {
                break;
            }
            for entity in pending {
                if scene.is_alive(entity) {
                    scene.remove_child(entity);
                }
            }
            self.sync(scene);
        }

        let occupied: Vec<(SlotId, EntityId)> = self.registry.occupied().collect();
        for (slot, entity) in occupied {
            if let Some(transform) = self.compute_result_transform(scene, slot) {
                scene.set_local_transform(entity, transform);
            }
        }

        self.loader.process(scene, dt);
        self.deliver_completions(scene);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Attach / detach
    // ─────────────────────────────────────────────────────────────────────

    /// Attaches `item_name` to every slot called `slot_name` under `root`
    /// (root included), depth first: an entity's own slots in declaration
    /// order, then its children in order.
    ///
    /// Returns how many loads were started. A failure on one slot does not
    /// stop the others.
    pub fn attach_item_to_slot(
        &mut self,
        scene: &mut Scene,
        root: EntityId,
        slot_name: &str,
        item_name: &str,
    ) -> usize {
        self.sync(scene);
        let mut matches = Vec::new();
        collect_slots(scene, root, slot_name, &mut matches);
        matches
            .into_iter()
            .filter(|slot| self.attach_item(scene, *slot, item_name).is_ok())
            .count()
    }

    /// Replaces the content of `slot` with the catalog item `item_name`.
    ///
    /// On success the slot is `Loading` and the returned container is already
    /// a child of the slot owner; the item's scene is loaded into it. If the
    /// item is unknown the slot becomes `LoadingFailed` and nothing is
    /// created.
    pub fn attach_item(
        &mut self,
        scene: &mut Scene,
        slot: SlotId,
        item_name: &str,
    ) -> Result<EntityId, SlotError> {
        self.sync(scene);
        let owner = self.prepare(scene, slot)?;

        let Some(component) = scene.slot_component(slot) else {
            return Err(SlotError::MissingOwner(slot));
        };
        let config_path = self.resolve_config_path(component.config_path());
        let slot_name = component.slot_name().to_owned();

        let Some(item) = self.catalog.lookup_item(&config_path, item_name) else {
            log::error!(
                "Slot '{}' ({}): item '{}' not found in {}",
                slot_name,
                slot,
                item_name,
                config_path.display()
            );
            self.registry.mark_failed(slot);
            return Err(SlotError::ItemNotFound {
                item: item_name.to_owned(),
                config_path,
            });
        };

        if cfg!(debug_assertions) && !component.accepts_type(&item.item_type) {
            log::warn!(
                "Item '{}' of type '{}' does not match the type filters of slot '{}'",
                item.name,
                item.item_type,
                slot_name
            );
        }

        let container = scene.spawn(&slot_name);
        self.loader.add_entity(scene, owner, container);
        if let Some(transform) = self.compute_result_transform(scene, slot) {
            scene.set_local_transform(container, transform);
        }
        let ticket = self.registry.issue_ticket();
        self.registry.begin_loading(slot, container, ticket);
        if let Some(component) = scene.slot_component_mut(slot) {
            component.set_loaded_item_name(item_name);
        }
        log::debug!("Loading '{}' into slot '{}' ({}).", item_name, slot_name, container);

        let tx = self.completion_tx.clone();
        self.loader.load(
            scene,
            container,
            &item.scene_path,
            Box::new(move |result| {
                // The system may be gone; nothing to report to then.
                let _ = tx.send(LoadCompletion {
                    slot,
                    ticket,
                    result,
                });
            }),
        );
        // Synchronous loaders have already reported.
        self.deliver_completions(scene);
        Ok(container)
    }

    /// Puts an existing `entity` into `slot` as a complete item.
    ///
    /// The entity is renamed after the slot and parented under the slot's
    /// owner. If it occupied another slot, that slot is emptied without
    /// deleting the entity.
    pub fn attach_entity_to_slot(
        &mut self,
        scene: &mut Scene,
        slot: SlotId,
        entity: EntityId,
        item_name: &str,
    ) -> Result<(), SlotError> {
        self.sync(scene);
        let owner = self.require_owner(scene, slot)?;
        if !scene.is_alive(entity) || scene.is_ancestor_of(entity, owner) {
            return Err(SlotError::InvalidEntity(entity));
        }
        if self.registry.find_loaded_entity(slot) != Some(entity) {
            if let Some(previous_slot) = self.detach_entity(scene, entity) {
                log::debug!("{} moves from {} to {}.", entity, previous_slot, slot);
            }
            self.prepare(scene, slot)?;
        }

        let slot_name = scene
            .slot_component(slot)
            .map(|c| c.slot_name().to_owned())
            .unwrap_or_default();
        scene.set_name(entity, &slot_name);
        self.loader.add_entity(scene, owner, entity);
        if let Some(transform) = self.compute_result_transform(scene, slot) {
            scene.set_local_transform(entity, transform);
        }
        self.registry.bind_loaded(slot, entity);
        if let Some(component) = scene.slot_component_mut(slot) {
            component.set_loaded_item_name(item_name);
        }
        Ok(())
    }

    /// Empties `slot`. Its occupant is removed on the next
    /// [`process`](Self::process).
    pub fn unload_item(&mut self, scene: &mut Scene, slot: SlotId) -> Option<EntityId> {
        self.sync(scene);
        let released = self.registry.release(slot);
        if let Some(component) = scene.slot_component_mut(slot) {
            component.set_loaded_item_name("");
        }
        released
    }

    /// Releases the slot `entity` occupies without deleting the entity.
    ///
    /// The slot goes back to `NotLoaded` and is returned. From then on the
    /// entity belongs to the caller: its transform is no longer driven and it
    /// is not removed by later unloads.
    pub fn detach_entity(&mut self, scene: &mut Scene, entity: EntityId) -> Option<SlotId> {
        self.sync(scene);
        let slot = self.registry.on_entity_removed(entity)?;
        if let Some(component) = scene.slot_component_mut(slot) {
            component.set_loaded_item_name("");
        }
        Some(slot)
    }

    /// Changes the attachment offset of `slot` and moves its occupant now.
    pub fn set_attachment_transform(&mut self, scene: &mut Scene, slot: SlotId, transform: Mat4) {
        self.sync(scene);
        let Some(component) = scene.slot_component_mut(slot) else {
            return;
        };
        component.set_attachment_transform(transform);
        if let Some(entity) = self.registry.find_loaded_entity(slot) {
            if let Some(result) = self.compute_result_transform(scene, slot) {
                scene.set_local_transform(entity, result);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    /// Where the occupant of `slot` sits relative to the slot owner.
    ///
    /// For a slot bound to a joint of the owner's skeleton this is
    /// `attachment * JointPose`: the attachment is applied in the owner's
    /// frame after the joint pose. Otherwise it is the attachment transform.
    /// Returns `None` when the slot component does not exist.
    pub fn compute_result_transform(&self, scene: &Scene, slot: SlotId) -> Option<Mat4> {
        let component = scene.slot_component(slot)?;
        let attachment = component.attachment_transform();
        let Some(joint_name) = component.joint_name() else {
            return Some(attachment);
        };

        let joint_pose = scene
            .slot_owner(slot)
            .and_then(|owner| scene.skeleton(owner))
            .and_then(|skeleton| {
                skeleton
                    .joint_index(joint_name)
                    .and_then(|index| skeleton.object_space_transform(index))
            });
        match joint_pose {
            Some(pose) => Some(attachment * pose.to_mat4()),
            None => {
                log::trace!(
                    "Joint '{}' of slot '{}' not found; using the attachment transform.",
                    joint_name,
                    component.slot_name()
                );
                Some(attachment)
            }
        }
    }

    /// The state of a tracked slot.
    ///
    /// # Panics
    /// Panics if `slot` is not tracked.
    pub fn slot_state(&self, slot: SlotId) -> SlotState {
        self.registry.state(slot)
    }

    pub fn try_slot_state(&self, slot: SlotId) -> Option<SlotState> {
        self.registry.try_state(slot)
    }

    /// The entity currently in `slot`, loading or loaded.
    pub fn lookup_loaded_entity(&self, slot: SlotId) -> Option<EntityId> {
        self.registry.find_loaded_entity(slot)
    }

    /// The slot that `entity` occupies.
    pub fn lookup_slot_for_entity(&self, entity: EntityId) -> Option<SlotId> {
        self.registry.find_slot_for_entity(entity)
    }

    /// Every item of the catalog at `config_path`, sorted by name.
    pub fn catalog_items(&self, config_path: &Path) -> Vec<CatalogItem> {
        self.catalog.items(&self.resolve_config_path(config_path))
    }

    /// The first catalog item, by name, whose type passes the filters of
    /// `slot`. Tools use it to fill empty slots with something sensible.
    pub fn suitable_item_name(&self, scene: &Scene, slot: SlotId) -> Option<String> {
        let component = scene.slot_component(slot)?;
        self.catalog_items(component.config_path())
            .into_iter()
            .find(|item| component.accepts_type(&item.item_type))
            .map(|item| item.name)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    fn resolve_config_path(&self, config_path: &Path) -> PathBuf {
        match &self.catalog_root {
            Some(root) if config_path.is_relative() => root.join(config_path),
            _ => config_path.to_path_buf(),
        }
    }

    fn require_owner(&self, scene: &Scene, slot: SlotId) -> Result<EntityId, SlotError> {
        if !self.registry.contains(slot) {
            return Err(SlotError::UntrackedSlot(slot));
        }
        scene.slot_owner(slot).ok_or(SlotError::MissingOwner(slot))
    }

    /// Validates `slot` and empties it. Returns the slot owner.
    fn prepare(&mut self, scene: &mut Scene, slot: SlotId) -> Result<EntityId, SlotError> {
        let owner = self.require_owner(scene, slot)?;
        if let Some(previous) = self.registry.release(slot) {
            log::trace!("{} unloaded from {} before attaching.", previous, slot);
        }
        if let Some(component) = scene.slot_component_mut(slot) {
            component.set_loaded_item_name("");
        }
        Ok(owner)
    }

    fn deliver_completions(&mut self, scene: &mut Scene) {
        while let Ok(completion) = self.completion_rx.try_recv() {
            let outcome = self
                .registry
                .complete(completion.slot, completion.ticket, &completion.result);
            match (outcome, &completion.result) {
                (Completion::Stale, _) => {
                    log::trace!("Ignoring stale load completion for {}.", completion.slot);
                }
                (Completion::Loaded(entity), _) => {
                    log::debug!("{} loaded into {}.", completion.slot, entity);
                    if let Some(transform) = self.compute_result_transform(scene, completion.slot) {
                        scene.set_local_transform(entity, transform);
                    }
                }
                (Completion::Failed(container), Err(message)) => {
                    let slot_name = scene
                        .slot_component(completion.slot)
                        .map(|c| c.slot_name().to_owned())
                        .unwrap_or_default();
                    log::error!(
                        "Loading into slot '{}' ({}) failed: {}",
                        slot_name,
                        completion.slot,
                        message
                    );
                    log::trace!("{} scheduled for deletion.", container);
                    if let Some(component) = scene.slot_component_mut(completion.slot) {
                        component.set_loaded_item_name("");
                    }
                }
                (Completion::Failed(container), Ok(())) => {
                    log::error!("{} reported failure without a message.", container);
                }
            }
        }
    }
}

/// Depth-first collection of slots named `slot_name` under `entity`.
fn collect_slots(scene: &Scene, entity: EntityId, slot_name: &str, out: &mut Vec<SlotId>) {
    out.extend(
        scene
            .slot_components(entity)
            .iter()
            .copied()
            .filter(|slot| {
                scene
                    .slot_component(*slot)
                    .is_some_and(|c| c.slot_name() == slot_name)
            }),
    );
    for child in scene.children(entity) {
        collect_slots(scene, *child, slot_name, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::math::{Quaternion, Vec3};
    use tether_core::{JointTransform, SceneDefinition};
    use tether_data::{SkeletonComponent, SlotComponent};
    use tether_io::{ImmediateSceneLoader, SceneSource};

    fn immediate_system() -> SlotSystem {
        let source = SceneSource::new();
        source.register("hat.ron", SceneDefinition::single("Hat"));
        SlotSystem::new(Box::new(ImmediateSceneLoader::new(source)))
    }

    fn with_hat_catalog(system: &SlotSystem) {
        system.catalog().insert(
            Path::new("items.yaml"),
            vec![CatalogItem {
                name: "Hat".into(),
                item_type: "Head".into(),
                scene_path: "hat.ron".into(),
                params: Default::default(),
            }],
        );
    }

    #[test]
    fn immediate_loader_reaches_loaded_within_attach() {
        let mut scene = Scene::new();
        let owner = scene.spawn("Character");
        let slot = scene
            .add_slot_component(owner, SlotComponent::new("Head").with_config_path("items.yaml"))
            .unwrap();
        let mut system = immediate_system();
        with_hat_catalog(&system);

        let container = system.attach_item(&mut scene, slot, "Hat").unwrap();

        assert_eq!(system.slot_state(slot), SlotState::Loaded);
        assert_eq!(scene.name(container), Some("Head"));
        assert_eq!(scene.slot_component(slot).unwrap().loaded_item_name(), "Hat");
    }

    #[test]
    fn untracked_slot_is_refused() {
        let mut scene = Scene::new();
        let mut system = immediate_system();
        system.set_scene(Some(&mut scene));
        let ghost = SlotId::new(42, 0);
        assert_eq!(
            system.attach_item(&mut scene, ghost, "Hat"),
            Err(SlotError::UntrackedSlot(ghost))
        );
    }

    #[test]
    fn joint_relative_transform_composes_pose_and_attachment() {
        let mut scene = Scene::new();
        let owner = scene.spawn("Character");
        let pose = JointTransform::new(
            Vec3::new(0.0, 1.5, 0.0),
            Quaternion::from_axis_angle(Vec3::Z, std::f32::consts::FRAC_PI_2),
            2.0,
        );
        scene.set_skeleton(owner, SkeletonComponent::new().with_joint("hand", pose));
        let offset = Mat4::from_translation(Vec3::new(0.5, 0.0, 0.0));
        let slot = scene
            .add_slot_component(
                owner,
                SlotComponent::new("Hand")
                    .with_joint("hand")
                    .with_attachment_transform(offset),
            )
            .unwrap();
        let system = immediate_system();

        let result = system.compute_result_transform(&scene, slot).unwrap();
        // Joint origin lifted by 1.5, scaled by 2, then offset 0.5 along X.
        let p = result.transform_point(Vec3::ZERO);
        assert!((p.x - 0.5).abs() < 1e-5);
        assert!((p.y - 3.0).abs() < 1e-5);
        // The joint rotation does not turn the owner-frame offset.
        let tip = result.transform_point(Vec3::new(1.0, 0.0, 0.0));
        assert!((tip.x - 0.5).abs() < 1e-5);
        assert!((tip.y - 5.0).abs() < 1e-5);
    }

    #[test]
    fn unknown_joint_falls_back_to_attachment() {
        let mut scene = Scene::new();
        let owner = scene.spawn("Character");
        let offset = Mat4::from_translation(Vec3::new(0.0, 0.0, 3.0));
        let slot = scene
            .add_slot_component(
                owner,
                SlotComponent::new("Back")
                    .with_joint("spine_03")
                    .with_attachment_transform(offset),
            )
            .unwrap();
        let system = immediate_system();
        assert_eq!(system.compute_result_transform(&scene, slot), Some(offset));
    }

    #[test]
    fn relative_config_paths_use_the_catalog_root() {
        let mut system = immediate_system();
        system.set_catalog_root(Some(PathBuf::from("assets/catalogs")));
        system.catalog().insert(
            Path::new("assets/catalogs/items.yaml"),
            vec![CatalogItem {
                name: "Cape".into(),
                item_type: "Back".into(),
                scene_path: "cape.ron".into(),
                params: Default::default(),
            }],
        );
        let items = system.catalog_items(Path::new("items.yaml"));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Cape");
    }

    #[test]
    fn detached_occupant_is_not_deleted_by_later_unloads() {
        let mut scene = Scene::new();
        let owner = scene.spawn("Character");
        let slot = scene
            .add_slot_component(owner, SlotComponent::new("Head").with_config_path("items.yaml"))
            .unwrap();
        let mut system = immediate_system();
        with_hat_catalog(&system);
        let hat = system.attach_item(&mut scene, slot, "Hat").unwrap();

        assert_eq!(system.detach_entity(&mut scene, hat), Some(slot));
        assert_eq!(system.detach_entity(&mut scene, hat), None);
        system.unload_item(&mut scene, slot);
        system.process(&mut scene, 0.016);

        assert!(scene.is_alive(hat));
        assert_eq!(system.slot_state(slot), SlotState::NotLoaded);
        assert!(scene.slot_component(slot).unwrap().loaded_item_name().is_empty());
        assert!(system.registry().invariants_hold());
    }
}
