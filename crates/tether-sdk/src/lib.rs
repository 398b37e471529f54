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

//! The public-facing API of the Tether slot runtime.
//! Applications build a [`GameWorld`] from a [`GameWorldConfig`] and drive it
//! one frame at a time.

mod config;
mod game_world;

pub use config::{GameWorldConfig, LoaderKind};
pub use game_world::GameWorld;

pub mod prelude {
    pub use crate::{GameWorld, GameWorldConfig, LoaderKind};
    pub use tether_agents::{SlotError, SlotState};
    pub use tether_core::math::{Mat4, Quaternion, Vec3};
    pub use tether_core::{EntityId, JointTransform, SceneDefinition, SlotId};
    pub use tether_data::{SkeletonComponent, SlotComponent};
    pub use tether_io::{CatalogItem, ItemCatalog, LoaderConfig};
}
