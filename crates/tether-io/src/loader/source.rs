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

//! Resolution of scene paths into parsed definitions.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tether_core::SceneDefinition;
use thiserror::Error;

/// Errors raised while resolving a scene path.
#[derive(Debug, Error)]
pub enum SceneSourceError {
    /// The file could not be read.
    #[error("failed to read scene {path}: {source}")]
    Io {
        /// The scene path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not a valid RON scene definition.
    #[error("failed to parse scene {path}: {source}")]
    Parse {
        /// The scene path.
        path: PathBuf,
        /// The RON error, with position.
        #[source]
        source: ron::error::SpannedError,
    },
}

/// Reads `.ron` scene files, with optional in-memory definitions that take
/// precedence over the filesystem.
///
/// Cloning is cheap; clones share the registered definitions, which lets
/// worker threads resolve paths registered on the main thread.
#[derive(Debug, Clone, Default)]
pub struct SceneSource {
    registered: Arc<RwLock<HashMap<PathBuf, Arc<SceneDefinition>>>>,
}

impl SceneSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `definition` for `path` without reading any file.
    pub fn register(&self, path: impl Into<PathBuf>, definition: SceneDefinition) {
        self.registered
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), Arc::new(definition));
    }

    /// Returns the definition for `path`.
    pub fn resolve(&self, path: &Path) -> Result<Arc<SceneDefinition>, SceneSourceError> {
        if let Some(found) = self
            .registered
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
        {
            return Ok(Arc::clone(found));
        }

        let text = std::fs::read_to_string(path).map_err(|source| SceneSourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let definition =
            SceneDefinition::from_ron_str(&text).map_err(|source| SceneSourceError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        log::debug!("Parsed scene {} ({} nodes)", path.display(), definition.node_count());
        Ok(Arc::new(definition))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_definition_wins_over_disk() {
        let source = SceneSource::new();
        source.register("virtual/hat.ron", SceneDefinition::single("Hat"));
        let def = source.resolve(Path::new("virtual/hat.ron")).unwrap();
        assert_eq!(def.root.name, "Hat");
    }

    #[test]
    fn clones_share_registrations() {
        let source = SceneSource::new();
        let clone = source.clone();
        source.register("a.ron", SceneDefinition::single("A"));
        assert!(clone.resolve(Path::new("a.ron")).is_ok());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SceneSource::new()
            .resolve(Path::new("no/such/scene.ron"))
            .unwrap_err();
        assert!(matches!(err, SceneSourceError::Io { .. }));
        assert!(err.to_string().contains("no/such/scene.ron"));
    }
}
