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

//! The slot state machine.
//!
//! Tracked slots live in index-aligned arrays. The first
//! `loaded_entities.len()` entries are exactly the slots that have an
//! occupying entity (state `Loading` or `Loaded`); every other entry is
//! `NotLoaded` or `LoadingFailed`. Moving a slot across that boundary is a
//! swap with the boundary entry, so occupancy changes are O(1) once the
//! slot's index is known.

use tether_core::{EntityId, LoadResult, SlotId};

/// Lifecycle of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotState {
    /// Nothing attached.
    NotLoaded,
    /// A container is attached and its content is being loaded.
    Loading,
    /// The item is attached and complete.
    Loaded,
    /// The last attach failed; the slot is empty.
    LoadingFailed,
}

impl SlotState {
    /// Whether a slot in this state has an occupying entity.
    pub fn is_occupied(self) -> bool {
        matches!(self, SlotState::Loading | SlotState::Loaded)
    }
}

/// What a load completion did to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The slot is gone, was re-attached since, or is no longer loading.
    Stale,
    /// The slot is now `Loaded` with this entity.
    Loaded(EntityId),
    /// The slot is now `LoadingFailed`; this container awaits deletion.
    Failed(EntityId),
}

/// Tracks slot components, their states and their occupants.
#[derive(Debug, Default)]
pub struct SlotRegistry {
    components: Vec<SlotId>,
    states: Vec<SlotState>,
    loaded_entities: Vec<EntityId>,
    tickets: Vec<u64>,
    delete_pending: Vec<EntityId>,
    next_ticket: u64,
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked slots.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Number of slots with an occupying entity.
    pub fn occupied_len(&self) -> usize {
        self.loaded_entities.len()
    }

    pub fn contains(&self, slot: SlotId) -> bool {
        self.index_of(slot).is_some()
    }

    /// Tracked slots in registry order.
    pub fn slots(&self) -> &[SlotId] {
        &self.components
    }

    /// `(slot, occupant)` for every slot that is `Loading` or `Loaded`.
    pub fn occupied(&self) -> impl Iterator<Item = (SlotId, EntityId)> + '_ {
        self.components
            .iter()
            .copied()
            .zip(self.loaded_entities.iter().copied())
    }

    /// Entities released since the last call, awaiting structural removal.
    pub fn take_delete_pending(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.delete_pending)
    }

    pub fn delete_pending(&self) -> &[EntityId] {
        &self.delete_pending
    }

    /// A fresh ticket identifying one attach.
    pub fn issue_ticket(&mut self) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        ticket
    }

    // --- Registration ---

    /// Starts tracking `slot` in state `NotLoaded`.
    ///
    /// Registering a slot twice is a caller bug; it asserts in debug builds
    /// and is ignored otherwise.
    pub fn register(&mut self, slot: SlotId) {
        let already = self.contains(slot);
        debug_assert!(!already, "{} registered twice", slot);
        if already {
            return;
        }
        self.components.push(slot);
        self.states.push(SlotState::NotLoaded);
        self.check_invariants();
    }

    /// Stops tracking `slot`. Its occupant, if any, is scheduled for
    /// deletion and returned.
    pub fn unregister(&mut self, slot: SlotId) -> Option<EntityId> {
        let mut index = self.index_of(slot)?;
        let mut released = None;
        if index < self.loaded_entities.len() {
            let (entity, new_index) = self.move_out_of_prefix(index);
            self.delete_pending.push(entity);
            released = Some(entity);
            index = new_index;
        }
        // Everything after the boundary is unoccupied, so the swapped-in
        // last entry keeps the partition intact.
        self.components.swap_remove(index);
        self.states.swap_remove(index);
        self.check_invariants();
        released
    }

    /// Forgets every slot and every pending deletion.
    pub fn clear(&mut self) {
        self.components.clear();
        self.states.clear();
        self.loaded_entities.clear();
        self.tickets.clear();
        self.delete_pending.clear();
    }

    // --- Transitions ---

    /// `slot` is now occupied by `container`, whose content is loading.
    pub fn begin_loading(&mut self, slot: SlotId, container: EntityId, ticket: u64) -> bool {
        self.occupy(slot, container, ticket, SlotState::Loading)
    }

    /// `slot` is now occupied by a complete `entity`.
    pub fn bind_loaded(&mut self, slot: SlotId, entity: EntityId) -> bool {
        let ticket = self.issue_ticket();
        self.occupy(slot, entity, ticket, SlotState::Loaded)
    }

    /// Empties `slot`, scheduling its occupant for deletion.
    ///
    /// A `LoadingFailed` slot goes back to `NotLoaded` as well.
    pub fn release(&mut self, slot: SlotId) -> Option<EntityId> {
        let index = self.index_of(slot)?;
        if index < self.loaded_entities.len() {
            let (entity, index) = self.move_out_of_prefix(index);
            self.states[index] = SlotState::NotLoaded;
            self.delete_pending.push(entity);
            self.check_invariants();
            return Some(entity);
        }
        self.states[index] = SlotState::NotLoaded;
        None
    }

    /// Marks `slot` as failed, scheduling any occupant for deletion.
    pub fn mark_failed(&mut self, slot: SlotId) -> bool {
        let Some(index) = self.index_of(slot) else {
            return false;
        };
        let index = if index < self.loaded_entities.len() {
            let (entity, index) = self.move_out_of_prefix(index);
            self.delete_pending.push(entity);
            index
        } else {
            index
        };
        self.states[index] = SlotState::LoadingFailed;
        self.check_invariants();
        true
    }

    /// Applies the outcome of the load started with `ticket`.
    ///
    /// Only a slot that is still tracked, still `Loading` and still carrying
    /// the same ticket is affected; anything else is stale and ignored.
    pub fn complete(&mut self, slot: SlotId, ticket: u64, result: &LoadResult) -> Completion {
        let Some(index) = self.index_of(slot) else {
            return Completion::Stale;
        };
        if index >= self.loaded_entities.len()
            || self.tickets[index] != ticket
            || self.states[index] != SlotState::Loading
        {
            return Completion::Stale;
        }

        match result {
            Ok(()) => {
                self.states[index] = SlotState::Loaded;
                Completion::Loaded(self.loaded_entities[index])
            }
            Err(_) => {
                let (container, index) = self.move_out_of_prefix(index);
                self.states[index] = SlotState::LoadingFailed;
                self.delete_pending.push(container);
                self.check_invariants();
                Completion::Failed(container)
            }
        }
    }

    /// Reacts to `entity` having been destroyed outside the slot API.
    ///
    /// If it occupied a slot, that slot goes back to `NotLoaded` and is
    /// returned. The entity is not scheduled for deletion since it is gone.
    pub fn on_entity_removed(&mut self, entity: EntityId) -> Option<SlotId> {
        let index = self.loaded_entities.iter().position(|e| *e == entity)?;
        let slot = self.components[index];
        let (_, index) = self.move_out_of_prefix(index);
        self.states[index] = SlotState::NotLoaded;
        self.check_invariants();
        Some(slot)
    }

    // --- Lookups ---

    pub fn find_loaded_entity(&self, slot: SlotId) -> Option<EntityId> {
        let index = self.index_of(slot)?;
        self.loaded_entities.get(index).copied()
    }

    pub fn find_slot_for_entity(&self, entity: EntityId) -> Option<SlotId> {
        self.loaded_entities
            .iter()
            .position(|e| *e == entity)
            .map(|index| self.components[index])
    }

    /// The state of a tracked slot.
    ///
    /// # Panics
    /// Panics if `slot` is not tracked; asking about an unknown slot is a
    /// caller bug. Use [`try_state`](Self::try_state) when unsure.
    pub fn state(&self, slot: SlotId) -> SlotState {
        match self.try_state(slot) {
            Some(state) => state,
            None => panic!("{} is not tracked by the slot registry", slot),
        }
    }

    pub fn try_state(&self, slot: SlotId) -> Option<SlotState> {
        self.index_of(slot).map(|index| self.states[index])
    }

    /// The ticket of the current occupant of `slot`.
    pub fn ticket(&self, slot: SlotId) -> Option<u64> {
        let index = self.index_of(slot)?;
        self.tickets.get(index).copied()
    }

    /// Whether the array invariants hold. Checked after every mutation in
    /// debug builds.
    pub fn invariants_hold(&self) -> bool {
        let occupied = self.loaded_entities.len();
        self.states.len() == self.components.len()
            && self.tickets.len() == occupied
            && occupied <= self.components.len()
            && self
                .states
                .iter()
                .enumerate()
                .all(|(index, state)| state.is_occupied() == (index < occupied))
    }

    // --- Internals ---

    fn index_of(&self, slot: SlotId) -> Option<usize> {
        self.components.iter().position(|s| *s == slot)
    }

    fn occupy(&mut self, slot: SlotId, entity: EntityId, ticket: u64, state: SlotState) -> bool {
        let Some(mut index) = self.index_of(slot) else {
            return false;
        };
        if index < self.loaded_entities.len() {
            let (previous, new_index) = self.move_out_of_prefix(index);
            if previous != entity {
                self.delete_pending.push(previous);
            }
            index = new_index;
        }
        let index = self.move_into_prefix(index, entity, ticket);
        self.states[index] = state;
        self.check_invariants();
        true
    }

    /// Swaps the entry at `index` (outside the prefix) to the boundary and
    /// grows the prefix over it.
    fn move_into_prefix(&mut self, index: usize, entity: EntityId, ticket: u64) -> usize {
        let boundary = self.loaded_entities.len();
        debug_assert!(index >= boundary);
        self.components.swap(index, boundary);
        self.states.swap(index, boundary);
        self.loaded_entities.push(entity);
        self.tickets.push(ticket);
        boundary
    }

    /// Swaps the entry at `index` (inside the prefix) with the last prefix
    /// entry and shrinks the prefix. Returns the removed occupant and the
    /// slot's new index, which the caller must give a non-occupied state.
    fn move_out_of_prefix(&mut self, index: usize) -> (EntityId, usize) {
        let last = self.loaded_entities.len() - 1;
        debug_assert!(index <= last);
        self.components.swap(index, last);
        self.states.swap(index, last);
        self.tickets.swap_remove(index);
        let entity = self.loaded_entities.swap_remove(index);
        self.states[last] = SlotState::NotLoaded;
        (entity, last)
    }

    fn check_invariants(&self) {
        debug_assert!(self.invariants_hold(), "slot registry invariants violated: {:?}", self);
    }
}
