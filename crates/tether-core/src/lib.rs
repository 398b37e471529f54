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

//! Foundational crate of the Tether slot runtime.
//!
//! `tether-core` holds the vocabulary every other crate speaks: the math
//! primitives, the generation-checked identifiers for entities, slots and
//! scenes, and the narrow contracts (`SceneGraph`, `ExternalLoader`) through
//! which the slot system talks to its collaborators. It has no knowledge of
//! how a scene is stored or how files are read.

pub mod ecs;
pub mod loader;
pub mod math;
pub mod scene;

pub use ecs::{EntityId, SlotId};
pub use loader::{ExternalLoader, LoadCallback, LoadResult};
pub use scene::{JointTransform, SceneDefinition, SceneGraph, SceneId};
