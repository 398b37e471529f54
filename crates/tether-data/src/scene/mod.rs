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

//! The concrete scene: entities, hierarchy, skeletons and slot components.

mod events;

pub use events::SceneEvent;

use crate::ecs::arena::Arena;
use crate::ecs::components::{SkeletonComponent, SlotComponent};
use tether_core::math::Mat4;
use tether_core::{EntityId, SceneGraph, SceneId, SlotId};

/// Everything the scene knows about one live entity.
#[derive(Debug, Clone)]
struct EntityRecord {
    name: String,
    parent: Option<EntityId>,
    children: Vec<EntityId>,
    local: Mat4,
    skeleton: Option<SkeletonComponent>,
    slots: Vec<SlotId>,
}

impl EntityRecord {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            parent: None,
            children: Vec::new(),
            local: Mat4::IDENTITY,
            skeleton: None,
            slots: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct SlotRecord {
    owner: EntityId,
    component: SlotComponent,
}

/// A live scene graph.
///
/// Entities and slot components are stored in generational arenas, so a
/// handle to something that was destroyed stops resolving instead of
/// pointing at whatever reused its storage. Every structural change that the
/// slot runtime cares about is appended to an event journal; consumers
/// collect it with [`drain_events`](Scene::drain_events).
#[derive(Debug)]
pub struct Scene {
    id: SceneId,
    entities: Arena<EntityRecord>,
    slots: Arena<SlotRecord>,
    events: Vec<SceneEvent>,
}

impl Scene {
    /// Creates an empty scene with a fresh [`SceneId`].
    pub fn new() -> Self {
        Self {
            id: SceneId::next(),
            entities: Arena::new(),
            slots: Arena::new(),
            events: Vec::new(),
        }
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    // ─────────────────────────────────────────────────────────────────────
    // Entities & hierarchy
    // ─────────────────────────────────────────────────────────────────────

    /// Spawns a root entity.
    pub fn spawn(&mut self, name: &str) -> EntityId {
        let (index, generation) = self.entities.insert(EntityRecord::new(name));
        EntityId::new(index, generation)
    }

    /// Spawns an entity as the last child of `parent`.
    ///
    /// If `parent` is dead the entity is left at the root.
    pub fn spawn_child(&mut self, parent: EntityId, name: &str) -> EntityId {
        let child = self.spawn(name);
        self.add_child(parent, child);
        child
    }

    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.record(entity).is_some()
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Live entities without a parent, in storage order.
    pub fn roots(&self) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, _, record)| record.parent.is_none())
            .map(|(index, generation, _)| EntityId::new(index, generation))
            .collect()
    }

    pub fn parent(&self, entity: EntityId) -> Option<EntityId> {
        self.record(entity).and_then(|record| record.parent)
    }

    pub fn children(&self, entity: EntityId) -> &[EntityId] {
        self.record(entity)
            .map(|record| record.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn name(&self, entity: EntityId) -> Option<&str> {
        self.record(entity).map(|record| record.name.as_str())
    }

    pub fn set_name(&mut self, entity: EntityId, name: &str) {
        if let Some(record) = self.record_mut(entity) {
            record.name = name.to_owned();
        }
    }

    /// Finds the first direct child of `parent` called `name`.
    pub fn find_child(&self, parent: EntityId, name: &str) -> Option<EntityId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|child| self.name(*child) == Some(name))
    }

    /// Whether `ancestor` is `entity` or one of its ancestors.
    pub fn is_ancestor_of(&self, ancestor: EntityId, entity: EntityId) -> bool {
        let mut current = Some(entity);
        while let Some(e) = current {
            if e == ancestor {
                return true;
            }
            current = self.parent(e);
        }
        false
    }

    /// Makes `child` the last child of `parent`, detaching it first.
    pub fn add_child(&mut self, parent: EntityId, child: EntityId) -> bool {
        if !self.is_alive(parent) || !self.is_alive(child) {
            return false;
        }
        if self.is_ancestor_of(child, parent) {
            log::warn!("Refusing to parent {} under its own descendant {}", child, parent);
            return false;
        }
        self.detach(child);
        if let Some(record) = self.record_mut(child) {
            record.parent = Some(parent);
        }
        if let Some(record) = self.record_mut(parent) {
            record.children.push(child);
        }
        true
    }

    /// Unlinks `entity` from its parent, leaving it as a root.
    pub fn detach(&mut self, entity: EntityId) {
        let Some(parent) = self.record_mut(entity).and_then(|record| record.parent.take()) else {
            return;
        };
        if let Some(record) = self.record_mut(parent) {
            record.children.retain(|c| *c != entity);
        }
    }

    /// Detaches `child` from its parent and destroys its subtree.
    pub fn remove_child(&mut self, child: EntityId) -> bool {
        self.despawn(child)
    }

    /// Destroys `entity` and all its descendants.
    ///
    /// Children are destroyed before their parents. For each destroyed
    /// entity the journal receives one `SlotRemoved` per slot component,
    /// followed by `EntityRemoved`.
    pub fn despawn(&mut self, entity: EntityId) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        self.detach(entity);
        self.despawn_subtree(entity);
        true
    }

    fn despawn_subtree(&mut self, entity: EntityId) {
        let children = self.children(entity).to_vec();
        for child in children {
            self.despawn_subtree(child);
        }
        let Some(record) = self.entities.remove(entity.index, entity.generation) else {
            return;
        };
        for slot in record.slots {
            if self.slots.remove(slot.index, slot.generation).is_some() {
                self.events.push(SceneEvent::SlotRemoved { slot, owner: entity });
            }
        }
        log::trace!("Despawned {} '{}'", entity, record.name);
        self.events.push(SceneEvent::EntityRemoved(entity));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Transforms
    // ─────────────────────────────────────────────────────────────────────

    pub fn local_transform(&self, entity: EntityId) -> Option<Mat4> {
        self.record(entity).map(|record| record.local)
    }

    pub fn set_local_transform(&mut self, entity: EntityId, transform: Mat4) {
        if let Some(record) = self.record_mut(entity) {
            record.local = transform;
        }
    }

    /// Product of local transforms from the root down to `entity`.
    pub fn world_transform(&self, entity: EntityId) -> Option<Mat4> {
        let mut world = self.local_transform(entity)?;
        let mut current = self.parent(entity);
        while let Some(parent) = current {
            world = self.local_transform(parent)? * world;
            current = self.parent(parent);
        }
        Some(world)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Skeletons
    // ─────────────────────────────────────────────────────────────────────

    /// Gives `entity` a skeleton, replacing any previous one.
    pub fn set_skeleton(&mut self, entity: EntityId, skeleton: SkeletonComponent) -> bool {
        match self.record_mut(entity) {
            Some(record) => {
                record.skeleton = Some(skeleton);
                true
            }
            None => false,
        }
    }

    pub fn skeleton(&self, entity: EntityId) -> Option<&SkeletonComponent> {
        self.record(entity).and_then(|record| record.skeleton.as_ref())
    }

    pub fn skeleton_mut(&mut self, entity: EntityId) -> Option<&mut SkeletonComponent> {
        self.record_mut(entity).and_then(|record| record.skeleton.as_mut())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Slot components
    // ─────────────────────────────────────────────────────────────────────

    /// Adds a slot component to `owner`. Returns `None` if `owner` is dead.
    pub fn add_slot_component(&mut self, owner: EntityId, component: SlotComponent) -> Option<SlotId> {
        if !self.is_alive(owner) {
            return None;
        }
        let (index, generation) = self.slots.insert(SlotRecord { owner, component });
        let slot = SlotId::new(index, generation);
        if let Some(record) = self.record_mut(owner) {
            record.slots.push(slot);
        }
        self.events.push(SceneEvent::SlotAdded { slot, owner });
        Some(slot)
    }

    /// Removes a slot component from its owner.
    pub fn remove_slot_component(&mut self, slot: SlotId) -> Option<SlotComponent> {
        let record = self.slots.remove(slot.index, slot.generation)?;
        if let Some(owner) = self.record_mut(record.owner) {
            owner.slots.retain(|s| *s != slot);
        }
        self.events.push(SceneEvent::SlotRemoved {
            slot,
            owner: record.owner,
        });
        Some(record.component)
    }

    pub fn slot_component(&self, slot: SlotId) -> Option<&SlotComponent> {
        self.slots
            .get(slot.index, slot.generation)
            .map(|record| &record.component)
    }

    pub fn slot_component_mut(&mut self, slot: SlotId) -> Option<&mut SlotComponent> {
        self.slots
            .get_mut(slot.index, slot.generation)
            .map(|record| &mut record.component)
    }

    pub fn slot_owner(&self, slot: SlotId) -> Option<EntityId> {
        self.slots.get(slot.index, slot.generation).map(|record| record.owner)
    }

    /// The slot components of `owner`, in declaration order.
    pub fn slot_components(&self, owner: EntityId) -> &[SlotId] {
        self.record(owner)
            .map(|record| record.slots.as_slice())
            .unwrap_or(&[])
    }

    /// Every live slot component, in storage order.
    pub fn all_slots(&self) -> Vec<SlotId> {
        self.slots
            .iter()
            .map(|(index, generation, _)| SlotId::new(index, generation))
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Journal
    // ─────────────────────────────────────────────────────────────────────

    /// Takes every structural event recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    fn record(&self, entity: EntityId) -> Option<&EntityRecord> {
        self.entities.get(entity.index, entity.generation)
    }

    fn record_mut(&mut self, entity: EntityId) -> Option<&mut EntityRecord> {
        self.entities.get_mut(entity.index, entity.generation)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph for Scene {
    fn scene_id(&self) -> SceneId {
        self.id
    }

    fn spawn_entity(&mut self, name: &str) -> EntityId {
        self.spawn(name)
    }

    fn is_alive(&self, entity: EntityId) -> bool {
        Scene::is_alive(self, entity)
    }

    fn add_child(&mut self, parent: EntityId, child: EntityId) -> bool {
        Scene::add_child(self, parent, child)
    }

    fn remove_child(&mut self, child: EntityId) -> bool {
        Scene::remove_child(self, child)
    }

    fn parent(&self, entity: EntityId) -> Option<EntityId> {
        Scene::parent(self, entity)
    }

    fn children(&self, entity: EntityId) -> &[EntityId] {
        Scene::children(self, entity)
    }

    fn name(&self, entity: EntityId) -> Option<&str> {
        Scene::name(self, entity)
    }

    fn set_name(&mut self, entity: EntityId, name: &str) {
        Scene::set_name(self, entity, name)
    }

    fn local_transform(&self, entity: EntityId) -> Option<Mat4> {
        Scene::local_transform(self, entity)
    }

    fn set_local_transform(&mut self, entity: EntityId, transform: Mat4) {
        Scene::set_local_transform(self, entity, transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::math::Vec3;

    #[test]
    fn stale_handle_does_not_resolve_after_reuse() {
        let mut scene = Scene::new();
        let a = scene.spawn("a");
        scene.despawn(a);
        let b = scene.spawn("b");
        assert_eq!(a.index, b.index);
        assert!(!scene.is_alive(a));
        assert_eq!(scene.name(a), None);
        assert_eq!(scene.name(b), Some("b"));
    }

    #[test]
    fn add_child_reparents_and_rejects_cycles() {
        let mut scene = Scene::new();
        let a = scene.spawn("a");
        let b = scene.spawn_child(a, "b");
        let c = scene.spawn("c");

        assert!(scene.add_child(c, b));
        assert!(scene.children(a).is_empty());
        assert_eq!(scene.children(c), &[b]);
        assert_eq!(scene.parent(b), Some(c));

        assert!(!scene.add_child(b, c));
        assert!(!scene.add_child(b, b));
    }

    #[test]
    fn world_transform_composes_parents() {
        let mut scene = Scene::new();
        let a = scene.spawn("a");
        let b = scene.spawn_child(a, "b");
        scene.set_local_transform(a, Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)));
        scene.set_local_transform(b, Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)));
        let world = scene.world_transform(b).unwrap();
        assert_eq!(world.translation(), Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn despawn_journals_slots_before_their_owner_and_children_first() {
        let mut scene = Scene::new();
        let root = scene.spawn("root");
        let child = scene.spawn_child(root, "child");
        let slot = scene
            .add_slot_component(root, SlotComponent::new("Hand"))
            .unwrap();
        scene.drain_events();

        scene.despawn(root);
        let events = scene.drain_events();
        assert_eq!(
            events,
            vec![
                SceneEvent::EntityRemoved(child),
                SceneEvent::SlotRemoved { slot, owner: root },
                SceneEvent::EntityRemoved(root),
            ]
        );
        assert!(scene.slot_component(slot).is_none());
        assert_eq!(scene.entity_count(), 0);
    }

    #[test]
    fn removing_a_slot_component_updates_owner_and_journal() {
        let mut scene = Scene::new();
        let owner = scene.spawn("owner");
        let first = scene.add_slot_component(owner, SlotComponent::new("A")).unwrap();
        let second = scene.add_slot_component(owner, SlotComponent::new("B")).unwrap();
        assert_eq!(scene.slot_components(owner), &[first, second]);

        let removed = scene.remove_slot_component(first).unwrap();
        assert_eq!(removed.slot_name(), "A");
        assert_eq!(scene.slot_components(owner), &[second]);
        assert_eq!(scene.slot_owner(second), Some(owner));
        assert!(scene.remove_slot_component(first).is_none());
        assert_eq!(
            scene.drain_events().last(),
            Some(&SceneEvent::SlotRemoved { slot: first, owner })
        );
    }

    #[test]
    fn slot_on_dead_owner_is_refused() {
        let mut scene = Scene::new();
        let owner = scene.spawn("owner");
        scene.despawn(owner);
        assert!(scene.add_slot_component(owner, SlotComponent::new("A")).is_none());
    }
}
