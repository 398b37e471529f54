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

use super::SceneSource;
use std::path::Path;
use tether_core::{EntityId, ExternalLoader, LoadCallback, SceneGraph, SceneId};

/// A loader that resolves and instantiates inside [`load`](ExternalLoader::load).
///
/// The callback fires before `load` returns. Meant for tools and tests where
/// determinism matters more than frame time.
#[derive(Debug, Default)]
pub struct ImmediateSceneLoader {
    source: SceneSource,
    scene: Option<SceneId>,
}

impl ImmediateSceneLoader {
    pub fn new(source: SceneSource) -> Self {
        Self { source, scene: None }
    }

    /// The definitions this loader resolves from.
    pub fn source(&self) -> &SceneSource {
        &self.source
    }
}

impl ExternalLoader for ImmediateSceneLoader {
    fn set_scene(&mut self, scene: Option<SceneId>) {
        self.scene = scene;
    }

    fn load(
        &mut self,
        scene: &mut dyn SceneGraph,
        container: EntityId,
        scene_path: &Path,
        on_complete: LoadCallback,
    ) {
        if self.scene.is_some_and(|bound| bound != scene.scene_id()) {
            on_complete(Err(format!(
                "loader is not bound to {}",
                scene.scene_id()
            )));
            return;
        }
        if !scene.is_alive(container) {
            on_complete(Err(format!("container {} no longer exists", container)));
            return;
        }
        match self.source.resolve(scene_path) {
            Ok(definition) => {
                definition.instantiate(scene, container);
                on_complete(Ok(()));
            }
            Err(e) => on_complete(Err(e.to_string())),
        }
    }

    fn process(&mut self, _scene: &mut dyn SceneGraph, _dt: f32) {}
}
