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

use std::fs;
use std::path::Path;
use tether_io::{parse_catalog, CatalogFormat, ItemCatalog};

const XML_CATALOG: &str = r#"<?xml version="1.0"?>
<items>
    <item Name="TestItem1" Type="SimpleItem" Path="scenes/tree.sc2" Color="red"/>
    <item Name="TestItem2" Type="Test" Path="scenes/big.sc2"/>
</items>
"#;

const YAML_CATALOG: &str = r#"
- Name: TestItem1
  Type: SimpleItem
  Path: scenes/tree.sc2
  Color: red
- Name: TestItem2
  Type: Test
  Path: scenes/big.sc2
"#;

fn write(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn test_xml_and_yaml_catalogs_yield_identical_items() {
    // --- 1. ARRANGE ---
    let dir = tempfile::tempdir().unwrap();
    let xml = write(dir.path(), "items.xml", XML_CATALOG);
    let yaml = write(dir.path(), "items.yaml", YAML_CATALOG);
    let catalog = ItemCatalog::new();

    // --- 2. ACT ---
    let from_xml = catalog.items(&xml);
    let from_yaml = catalog.items(&yaml);

    // --- 3. ASSERT ---
    assert_eq!(from_xml.len(), 2);
    assert_eq!(from_xml, from_yaml);
    assert_eq!(from_xml[0].name, "TestItem1");
    assert_eq!(from_xml[0].item_type, "SimpleItem");
    assert_eq!(from_xml[0].params.get("Color").map(String::as_str), Some("red"));
    assert_eq!(from_xml[1].scene_path, dir.path().join("scenes/big.sc2"));
}

#[test]
fn test_lookup_parses_once_and_shares_items() {
    let dir = tempfile::tempdir().unwrap();
    let xml = write(dir.path(), "items.xml", XML_CATALOG);
    let catalog = ItemCatalog::new();

    let first = catalog.lookup_item(&xml, "TestItem2").unwrap();
    // Editing the file is not observed until the cache entry is dropped.
    fs::write(&xml, "<items/>").unwrap();
    let second = catalog.lookup_item(&xml, "TestItem2").unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));

    assert!(catalog.reload(&xml));
    assert!(catalog.lookup_item(&xml, "TestItem2").is_none());
}

#[test]
fn test_duplicate_names_keep_a_single_entry() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = write(
        dir.path(),
        "dupes.yml",
        "- {Name: Ring, Path: first.ron}\n- {Name: Ring, Path: second.ron}\n",
    );
    let items = ItemCatalog::new().items(&yaml);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].scene_path, dir.path().join("first.ron"));
}

#[test]
fn test_duplicate_names_are_reported_as_dropped() {
    // --- 1. ARRANGE ---
    let text = r#"<items>
        <item Name="Ring" Path="first.ron"/>
        <item Name="Ring" Path="second.ron"/>
        <item Name="Amulet" Path="amulet.ron"/>
        <item Name="Ring" Path="third.ron"/>
    </items>"#;

    // --- 2. ACT ---
    let parse = parse_catalog(text, CatalogFormat::Xml).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(parse.duplicates, 2);
    assert_eq!(parse.incomplete, 0);
    let names: Vec<&str> = parse.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["Ring", "Amulet"]);
    assert_eq!(parse.items[0].scene_path, Path::new("first.ron"));
}

#[test]
fn test_numeric_and_boolean_yaml_values_match_xml_attributes() {
    // --- 1. ARRANGE ---
    let xml = r#"<items>
        <item Name="101" Type="Ring" Path="ring.ron"/>
        <item Name="Cape" Path="cape.ron" Weight="3" Dyeable="true"/>
    </items>"#;
    let yaml = "- Name: 101\n  Type: Ring\n  Path: ring.ron\n- Name: Cape\n  Path: cape.ron\n  Weight: 3\n  Dyeable: true\n";

    // --- 2. ACT ---
    let from_xml = ItemCatalog::parse_str(xml, CatalogFormat::Xml).unwrap();
    let from_yaml = ItemCatalog::parse_str(yaml, CatalogFormat::Yaml).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(from_yaml, from_xml);
    assert_eq!(from_yaml.len(), 2);
    assert_eq!(from_yaml[0].name, "101");
    assert_eq!(from_yaml[1].params.get("Weight").map(String::as_str), Some("3"));
    assert_eq!(from_yaml[1].params.get("Dyeable").map(String::as_str), Some("true"));
}

#[test]
fn test_malformed_items_do_not_spoil_the_file() {
    let text = r#"<items><item Name="NoPath"/><item Path="orphan.ron"/><item Name="Ok" Path="ok.ron"/></items>"#;
    let items = ItemCatalog::parse_str(text, CatalogFormat::Xml).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Ok");
}

#[test]
fn test_unreadable_catalogs_are_empty() {
    let dir = tempfile::tempdir().unwrap();
    let broken = write(dir.path(), "broken.xml", "<items><item Name=");
    let unknown = write(dir.path(), "items.json", "[]");
    let catalog = ItemCatalog::new();

    assert!(catalog.items(&broken).is_empty());
    assert!(catalog.items(&unknown).is_empty());
    assert!(catalog.items(&dir.path().join("missing.yaml")).is_empty());
    assert_eq!(catalog.cached_count(), 3);
}

#[test]
fn test_relative_and_absolute_config_paths_share_a_cache_entry() {
    let dir = tempfile::tempdir().unwrap();
    let xml = write(dir.path(), "items.xml", XML_CATALOG);
    let catalog = ItemCatalog::new();

    let _ = catalog.items(&xml);
    let dotted = dir.path().join(".").join("items.xml");
    let _ = catalog.items(&dotted);
    assert_eq!(catalog.cached_count(), 1);
}
