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

//! Lazily populated cache of parsed catalogs.

use super::{parse_items, CatalogError, CatalogFormat, CatalogItem};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

type ItemsByName = BTreeMap<String, Arc<CatalogItem>>;

/// Parsed catalogs keyed by absolute config path.
///
/// A catalog is read the first time one of its items is requested. A file
/// that cannot be read or parsed is cached as empty, so repeated lookups do
/// not hit the disk again; call [`reload`](Self::reload) after fixing it.
///
/// Relative item scene paths are resolved against the directory of the
/// catalog file they come from.
///
/// The cache is internally synchronized and meant to be shared as
/// `Arc<ItemCatalog>` between slot systems.
#[derive(Debug, Default)]
pub struct ItemCatalog {
    catalogs: RwLock<HashMap<PathBuf, Arc<ItemsByName>>>,
}

impl ItemCatalog {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses catalog text without touching the cache.
    pub fn parse_str(text: &str, format: CatalogFormat) -> Result<Vec<CatalogItem>, CatalogError> {
        parse_items(text, format)
    }

    /// Finds `item_name` in the catalog at `config_path`, loading it if needed.
    pub fn lookup_item(&self, config_path: &Path, item_name: &str) -> Option<Arc<CatalogItem>> {
        self.catalog(config_path).get(item_name).cloned()
    }

    /// A copy of every item of the catalog at `config_path`, sorted by name.
    pub fn items(&self, config_path: &Path) -> Vec<CatalogItem> {
        self.catalog(config_path)
            .values()
            .map(|item| CatalogItem::clone(item))
            .collect()
    }

    /// Installs `items` as the catalog for `config_path`, replacing any cached
    /// one. Duplicate names keep the first occurrence.
    pub fn insert(&self, config_path: &Path, items: Vec<CatalogItem>) {
        let mut by_name = ItemsByName::new();
        for item in items {
            by_name
                .entry(item.name.clone())
                .or_insert_with(|| Arc::new(item));
        }
        self.catalogs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(cache_key(config_path), Arc::new(by_name));
    }

    /// Forgets the cached catalog for `config_path`. Returns whether one was
    /// cached. Items already handed out stay valid.
    pub fn reload(&self, config_path: &Path) -> bool {
        self.catalogs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&cache_key(config_path))
            .is_some()
    }

    /// Number of catalogs currently cached.
    pub fn cached_count(&self) -> usize {
        self.catalogs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn catalog(&self, config_path: &Path) -> Arc<ItemsByName> {
        let key = cache_key(config_path);
        if let Some(found) = self
            .catalogs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Arc::clone(found);
        }

        let items = match load_file(&key) {
            Ok(items) => {
                log::info!("Loaded {} catalog item(s) from {}", items.len(), key.display());
                items
            }
            Err(e) => {
                log::error!("Could not load item catalog {}: {}", key.display(), e);
                Vec::new()
            }
        };
        let mut by_name = ItemsByName::new();
        for item in items {
            by_name.entry(item.name.clone()).or_insert_with(|| Arc::new(item));
        }

        let mut catalogs = self.catalogs.write().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have filled it while the file was being read.
        Arc::clone(catalogs.entry(key).or_insert_with(|| Arc::new(by_name)))
    }
}

fn cache_key(config_path: &Path) -> PathBuf {
    std::path::absolute(config_path).unwrap_or_else(|_| config_path.to_path_buf())
}

fn load_file(path: &Path) -> Result<Vec<CatalogItem>, CatalogError> {
    let format = CatalogFormat::from_path(path)?;
    let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut items = parse_items(&text, format)?;
    if let Some(dir) = path.parent() {
        for item in &mut items {
            if item.scene_path.is_relative() {
                item.scene_path = dir.join(&item.scene_path);
            }
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str) -> CatalogItem {
        CatalogItem {
            name: name.to_string(),
            item_type: String::new(),
            scene_path: PathBuf::from(format!("{name}.ron")),
            params: Default::default(),
        }
    }

    #[test]
    fn inserted_catalog_is_served_sorted() {
        let catalog = ItemCatalog::new();
        let path = Path::new("memory/items.yaml");
        catalog.insert(path, vec![item("b"), item("a"), item("a")]);

        let names: Vec<_> = catalog.items(path).into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(catalog.lookup_item(path, "b").is_some());
        assert!(catalog.lookup_item(path, "c").is_none());
    }

    #[test]
    fn missing_file_is_cached_as_empty() {
        let catalog = ItemCatalog::new();
        let path = Path::new("definitely/not/here.xml");
        assert!(catalog.lookup_item(path, "x").is_none());
        assert_eq!(catalog.cached_count(), 1);
        assert!(catalog.reload(path));
        assert_eq!(catalog.cached_count(), 0);
    }

    #[test]
    fn handed_out_items_survive_reload() {
        let catalog = ItemCatalog::new();
        let path = Path::new("memory/keep.xml");
        catalog.insert(path, vec![item("kept")]);
        let held = catalog.lookup_item(path, "kept").unwrap();
        catalog.reload(path);
        assert_eq!(held.name, "kept");
    }
}
