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

//! Attachment of catalog items onto slots.
//!
//! [`SlotRegistry`] is the state machine: which slot components are tracked,
//! what state each is in and which entity occupies it. [`SlotSystem`] is the
//! façade the game loop talks to: it feeds scene notifications into the
//! registry, starts loads and applies per-frame transforms.

mod registry;
mod system;

pub use registry::{Completion, SlotRegistry, SlotState};
pub use system::{SlotError, SlotSystem};
