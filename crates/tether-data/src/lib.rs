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

//! Data layer of the slot runtime.
//!
//! This crate owns the concrete [`Scene`]: a generation-checked entity store
//! with hierarchy, local transforms, skeletons and an arena of slot
//! components. Structural changes are recorded in a journal of
//! [`SceneEvent`]s so the slot system can react to them without holding
//! references into the scene.

pub mod ecs;
pub mod scene;

pub use ecs::components::{SkeletonComponent, SlotComponent, Transform, INVALID_JOINT_INDEX};
pub use scene::{Scene, SceneEvent};
