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

//! Generation-checked handles for entities and slot components.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique identifier for an entity in a scene.
///
/// It combines an index with a generation count to solve the "ABA problem".
/// When an entity is despawned, its index can be recycled for a new entity,
/// but the generation is incremented. Old handles pointing to a recycled
/// index stop resolving instead of silently aliasing the new entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    /// The index of the entity's record in the scene's entity table.
    pub index: u32,
    /// A generation counter that is incremented each time the index is recycled.
    pub generation: u32,
}

impl EntityId {
    /// Creates an id from its raw parts.
    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

/// A handle to a slot component stored in a scene.
///
/// Slot components live in their own arena, so a `SlotId` keeps its meaning
/// across registry reorderings. A completion callback that holds a `SlotId`
/// whose component has been removed (and whose arena cell was reused) will
/// simply fail to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId {
    /// The index of the component's cell in the slot arena.
    pub index: u32,
    /// Incremented every time the cell is reused.
    pub generation: u32,
}

impl SlotId {
    /// Creates an id from its raw parts.
    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slot({}v{})", self.index, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_distinguishes_recycled_indices() {
        let old = EntityId::new(3, 0);
        let new = EntityId::new(3, 1);
        assert_ne!(old, new);
        assert_eq!(old.index, new.index);
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(SlotId::new(2, 5).to_string(), "Slot(2v5)");
        assert_eq!(EntityId::new(0, 1).to_string(), "Entity(0v1)");
    }
}
