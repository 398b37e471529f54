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

//! Configuration of a [`GameWorld`](crate::GameWorld), read from RON.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tether_io::LoaderConfig;

/// Which loader the world's slot system uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoaderKind {
    /// Worker threads; items finish loading on a later frame.
    #[default]
    Background,
    /// Items are instantiated inside the attach call.
    Immediate,
}

/// Settings for building a [`GameWorld`](crate::GameWorld).
///
/// Every field has a default, so an empty `()` document is valid.
///
/// ```ron
/// (
///     loader_kind: Background,
///     loader: (worker_threads: 4, max_completions_per_frame: 8),
///     catalog_root: Some("assets/catalogs"),
/// )
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameWorldConfig {
    pub loader_kind: LoaderKind,
    pub loader: LoaderConfig,
    /// Directory that relative slot catalog paths are resolved against.
    pub catalog_root: Option<PathBuf>,
}

impl GameWorldConfig {
    /// Parses a config from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        ron::from_str(text).context("Failed to parse game world config")
    }

    /// Reads a config file.
    ///
    /// A relative `catalog_root` is taken relative to the file's directory.
    pub fn from_ron_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_ron_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        if let (Some(root), Some(dir)) = (&config.catalog_root, path.parent()) {
            if root.is_relative() {
                config.catalog_root = Some(dir.join(root));
            }
        }
        log::debug!("Loaded game world config from {}: {:?}", path.display(), config);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = GameWorldConfig::from_ron_str("()").unwrap();
        assert_eq!(config, GameWorldConfig::default());
        assert_eq!(config.loader.worker_threads, 2);
        assert_eq!(config.loader_kind, LoaderKind::Background);
    }

    #[test]
    fn partial_loader_section_keeps_other_defaults() {
        let config = GameWorldConfig::from_ron_str(
            "(loader_kind: Immediate, loader: (max_completions_per_frame: 3))",
        )
        .unwrap();
        assert_eq!(config.loader_kind, LoaderKind::Immediate);
        assert_eq!(config.loader.max_completions_per_frame, 3);
        assert_eq!(config.loader.worker_threads, 2);
        assert_eq!(config.catalog_root, None);
    }

    #[test]
    fn syntax_error_is_reported_with_context() {
        let err = GameWorldConfig::from_ron_str("(loader: ").unwrap_err();
        assert!(err.to_string().contains("game world config"));
    }

    #[test]
    fn relative_catalog_root_follows_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.ron");
        std::fs::write(&path, r#"(catalog_root: Some("catalogs"))"#).unwrap();

        let config = GameWorldConfig::from_ron_file(&path).unwrap();

        assert_eq!(config.catalog_root, Some(dir.path().join("catalogs")));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = GameWorldConfig::from_ron_file("no/such/world.ron").unwrap_err();
        assert!(err.to_string().contains("no/such/world.ron"));
    }
}
