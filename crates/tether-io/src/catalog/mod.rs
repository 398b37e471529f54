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

//! Item catalogs: the files that map item names to loadable scenes.
//!
//! A catalog is either XML (`<item Name=".." Type=".." Path=".."/>`
//! elements) or YAML (a sequence of string maps with the same keys). Any
//! other attribute or key becomes a free-form parameter of the item.

mod cache;
mod xml;
mod yaml;

pub use cache::ItemCatalog;

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

const NAME_KEY: &str = "Name";
const TYPE_KEY: &str = "Type";
const PATH_KEY: &str = "Path";

/// One entry of a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    /// Unique name within its catalog.
    pub name: String,
    /// Free-form type tag matched against slot type filters.
    pub item_type: String,
    /// Scene file loaded when the item is attached.
    pub scene_path: PathBuf,
    /// Every other attribute of the entry.
    pub params: BTreeMap<String, String>,
}

/// Errors raised while reading a catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The file could not be read.
    #[error("failed to read catalog {path}: {source}")]
    Io {
        /// The catalog path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The extension is neither XML nor YAML.
    #[error("unsupported catalog format: {0}")]
    UnsupportedFormat(PathBuf),
    /// The XML document is malformed.
    #[error("invalid XML catalog: {0}")]
    Xml(#[from] roxmltree::Error),
    /// The YAML document is malformed.
    #[error("invalid YAML catalog: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The YAML document is well formed but is not a list of items.
    #[error("YAML catalog root must be a sequence of items")]
    NotASequence,
}

/// Supported catalog syntaxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    Xml,
    Yaml,
}

impl CatalogFormat {
    /// Picks the format from the file extension, ignoring case.
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("xml") => Ok(Self::Xml),
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            _ => Err(CatalogError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Outcome of parsing one catalog text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogParse {
    /// Valid items, in document order.
    pub items: Vec<CatalogItem>,
    /// Entries dropped for lacking a name or a path.
    pub incomplete: usize,
    /// Entries dropped because an earlier entry had the same name.
    pub duplicates: usize,
}

/// Parses catalog text and reports what was dropped.
///
/// Entries without a name or a path are dropped, and so are repeated names
/// (the first occurrence wins). Both cases are logged as errors; the rest of
/// the text still yields its items.
pub fn parse_catalog(text: &str, format: CatalogFormat) -> Result<CatalogParse, CatalogError> {
    let entries = match format {
        CatalogFormat::Xml => xml::read_entries(text)?,
        CatalogFormat::Yaml => yaml::read_entries(text)?,
    };
    Ok(build_items(entries))
}

/// Parses catalog text into validated items.
pub fn parse_items(text: &str, format: CatalogFormat) -> Result<Vec<CatalogItem>, CatalogError> {
    parse_catalog(text, format).map(|parse| parse.items)
}

/// Attribute map of one raw entry, in document order.
pub(crate) type RawEntry = Vec<(String, String)>;

fn build_items(entries: Vec<RawEntry>) -> CatalogParse {
    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(entries.len());
    let mut incomplete = 0usize;
    let mut duplicates = 0usize;

    for entry in entries {
        let mut name = String::new();
        let mut item_type = String::new();
        let mut scene_path = String::new();
        let mut params = BTreeMap::new();
        for (key, value) in entry {
            match key.as_str() {
                NAME_KEY => name = value,
                TYPE_KEY => item_type = value,
                PATH_KEY => scene_path = value,
                _ => {
                    params.insert(key, value);
                }
            }
        }

        if name.is_empty() || scene_path.is_empty() {
            incomplete += 1;
            continue;
        }
        if !seen.insert(name.clone()) {
            log::error!("Catalog item '{}' is declared more than once, keeping the first", name);
            duplicates += 1;
            continue;
        }
        items.push(CatalogItem {
            name,
            item_type,
            scene_path: PathBuf::from(scene_path),
            params,
        });
    }

    if incomplete > 0 {
        log::error!("Catalog contains {} incomplete item(s) without Name or Path", incomplete);
    }
    if duplicates > 0 {
        log::debug!("Dropped {} duplicated catalog item(s)", duplicates);
    }
    CatalogParse {
        items,
        incomplete,
        duplicates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(pairs: &[(&str, &str)]) -> RawEntry {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn format_from_extension_is_case_insensitive() {
        assert_eq!(CatalogFormat::from_path(Path::new("a/items.XML")).unwrap(), CatalogFormat::Xml);
        assert_eq!(CatalogFormat::from_path(Path::new("items.yml")).unwrap(), CatalogFormat::Yaml);
        assert!(matches!(
            CatalogFormat::from_path(Path::new("items.json")),
            Err(CatalogError::UnsupportedFormat(_))
        ));
        assert!(CatalogFormat::from_path(Path::new("items")).is_err());
    }

    #[test]
    fn build_keeps_first_duplicate_and_drops_incomplete() {
        let parse = build_items(vec![
            entry(&[("Name", "Hat"), ("Path", "hat.ron"), ("Type", "Head")]),
            entry(&[("Name", "Hat"), ("Path", "other.ron")]),
            entry(&[("Name", ""), ("Path", "x.ron")]),
            entry(&[("Name", "NoPath")]),
            entry(&[("Name", "Cape"), ("Path", "cape.ron"), ("Color", "red")]),
        ]);
        assert_eq!(parse.duplicates, 1);
        assert_eq!(parse.incomplete, 2);
        let items = parse.items;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].scene_path, PathBuf::from("hat.ron"));
        assert_eq!(items[0].item_type, "Head");
        assert_eq!(items[1].params.get("Color").map(String::as_str), Some("red"));
        assert!(items[1].item_type.is_empty());
    }
}
