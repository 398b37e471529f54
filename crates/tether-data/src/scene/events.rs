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

use tether_core::{EntityId, SlotId};

/// A structural change recorded by the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneEvent {
    /// A slot component was added to `owner`.
    SlotAdded {
        /// The new component.
        slot: SlotId,
        /// The entity it was added to.
        owner: EntityId,
    },
    /// A slot component was removed, either directly or with its owner.
    SlotRemoved {
        /// The removed component. It no longer resolves.
        slot: SlotId,
        /// The entity it belonged to. May already be dead.
        owner: EntityId,
    },
    /// An entity was destroyed.
    EntityRemoved(EntityId),
}
