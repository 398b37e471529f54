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

//! The contract between the slot runtime and whatever builds item sub-scenes.

use crate::ecs::EntityId;
use crate::scene::{SceneGraph, SceneId};
use std::path::Path;

/// Outcome of a load: `Err` carries a human-readable message.
pub type LoadResult = Result<(), String>;

/// Invoked once when a load finishes. Loads discarded by a scene rebind never
/// invoke their callback.
pub type LoadCallback = Box<dyn FnOnce(LoadResult) + Send + 'static>;

/// Loads item scenes into a container entity.
///
/// Implementations may do their parsing on other threads, but every callback
/// and every scene mutation happens on the thread that calls [`load`] or
/// [`process`].
///
/// [`load`]: ExternalLoader::load
/// [`process`]: ExternalLoader::process
pub trait ExternalLoader: Send {
    /// Binds the loader to a scene. Rebinding to a different scene (or to
    /// none) discards every in-flight load without firing its callback.
    fn set_scene(&mut self, scene: Option<SceneId>);

    /// Starts loading `scene_path` under `container`.
    ///
    /// The callback may fire before this returns (synchronous loaders) or
    /// during a later [`process`](ExternalLoader::process) call. It must be
    /// safe to run after the requester has forgotten the container.
    fn load(
        &mut self,
        scene: &mut dyn SceneGraph,
        container: EntityId,
        scene_path: &Path,
        on_complete: LoadCallback,
    );

    /// Attaches `child` under `parent` synchronously.
    fn add_entity(&mut self, scene: &mut dyn SceneGraph, parent: EntityId, child: EntityId) {
        if !scene.add_child(parent, child) {
            log::warn!("Could not attach {} under {}", child, parent);
        }
    }

    /// Advances background work and delivers finished loads.
    fn process(&mut self, scene: &mut dyn SceneGraph, dt: f32);
}
