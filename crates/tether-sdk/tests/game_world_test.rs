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

use std::path::Path;
use std::time::{Duration, Instant};
use tether_sdk::prelude::*;

fn immediate_world() -> GameWorld {
    let config = GameWorldConfig {
        loader_kind: LoaderKind::Immediate,
        ..Default::default()
    };
    let world = GameWorld::new(config).unwrap();
    world.slot_system().catalog().insert(
        Path::new("gear.yaml"),
        vec![CatalogItem {
            name: "Helmet".into(),
            item_type: "Head".into(),
            scene_path: "helmet.ron".into(),
            params: Default::default(),
        }],
    );
    world.register_scene("helmet.ron", SceneDefinition::single("Helmet"));
    world
}

#[test]
fn test_despawn_is_observed_before_returning() {
    // --- 1. ARRANGE ---
    let mut world = immediate_world();
    let knight = world.spawn("Knight");
    let head = world
        .add_slot_component(knight, SlotComponent::new("Head").with_config_path("gear.yaml"))
        .unwrap();
    let helmet = world.attach_item(head, "Helmet").unwrap();
    assert_eq!(world.slot_state(head), Some(SlotState::Loaded));

    // --- 2. ACT ---
    world.despawn(helmet);

    // --- 3. ASSERT ---
    assert_eq!(world.slot_state(head), Some(SlotState::NotLoaded));
    assert_eq!(world.lookup_loaded_entity(head), None);
}

#[test]
fn test_slot_added_through_the_world_is_tracked_immediately() {
    let mut world = immediate_world();
    let knight = world.spawn("Knight");

    let head = world
        .add_slot_component(knight, SlotComponent::new("Head"))
        .unwrap();

    assert_eq!(world.slot_state(head), Some(SlotState::NotLoaded));
}

#[test]
fn test_removed_slot_item_disappears_on_update() {
    let mut world = immediate_world();
    let knight = world.spawn("Knight");
    let head = world
        .add_slot_component(knight, SlotComponent::new("Head").with_config_path("gear.yaml"))
        .unwrap();
    let helmet = world.attach_item(head, "Helmet").unwrap();

    world.remove_slot_component(head);
    assert_eq!(world.slot_state(head), None);
    assert!(world.scene().is_alive(helmet));
    world.update(0.016);

    assert!(!world.scene().is_alive(helmet));
    assert!(world.scene().children(knight).is_empty());
}

#[test]
fn test_reparented_occupant_leaves_its_slot() {
    // --- 1. ARRANGE ---
    let mut world = immediate_world();
    let knight = world.spawn("Knight");
    let rack = world.spawn("Rack");
    let head = world
        .add_slot_component(knight, SlotComponent::new("Head").with_config_path("gear.yaml"))
        .unwrap();
    let helmet = world.attach_item(head, "Helmet").unwrap();
    let moved = Mat4::from_translation(Vec3::new(4.0, 0.0, 0.0));

    // --- 2. ACT ---
    assert!(world.add_child(rack, helmet));
    world.set_local_transform(helmet, moved);
    world.update(0.016);
    world.unload_item(head);
    world.update(0.016);

    // --- 3. ASSERT ---
    assert_eq!(world.slot_state(head), Some(SlotState::NotLoaded));
    assert_eq!(world.lookup_slot_for_entity(helmet), None);
    assert_eq!(world.slot_component(head).unwrap().loaded_item_name(), "");
    assert!(world.scene().is_alive(helmet));
    assert_eq!(world.scene().parent(helmet), Some(rack));
    assert_eq!(world.scene().local_transform(helmet), Some(moved));
}

#[test]
fn test_refused_reparent_keeps_the_slot_loaded() {
    let mut world = immediate_world();
    let knight = world.spawn("Knight");
    let head = world
        .add_slot_component(knight, SlotComponent::new("Head").with_config_path("gear.yaml"))
        .unwrap();
    let helmet = world.attach_item(head, "Helmet").unwrap();
    let plume = world.spawn_child(helmet, "Plume");

    assert!(!world.add_child(plume, helmet));

    assert_eq!(world.slot_state(head), Some(SlotState::Loaded));
    assert_eq!(world.lookup_loaded_entity(head), Some(helmet));
}

#[test]
fn test_instantiated_scene_slots_are_usable() {
    let mut world = immediate_world();
    let anchor = world.spawn("Anchor");
    let definition = SceneDefinition::from_ron_str(
        r#"(root: (name: "Mannequin", children: [(name: "Neck")]))"#,
    )
    .unwrap();
    let mannequin = world.instantiate(&definition, anchor);
    let neck = world.scene().find_child(mannequin, "Neck").unwrap();
    world
        .add_slot_component(neck, SlotComponent::new("Head").with_config_path("gear.yaml"))
        .unwrap();

    let started = world.attach_item_to_slot(anchor, "Head", "Helmet");

    assert_eq!(started, 1);
    assert_eq!(world.scene().children(neck).len(), 1);
}

#[test]
fn test_background_world_loads_from_files() {
    // --- 1. ARRANGE ---
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("cloak.ron"), r#"(root: (name: "Cloak"))"#).unwrap();
    std::fs::write(
        dir.path().join("gear.xml"),
        r#"<items><item Name="Cloak" Type="Back" Path="cloak.ron"/></items>"#,
    )
    .unwrap();
    let config = GameWorldConfig {
        catalog_root: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    let mut world = GameWorld::new(config).unwrap();
    let knight = world.spawn("Knight");
    let back = world
        .add_slot_component(knight, SlotComponent::new("Back").with_config_path("gear.xml"))
        .unwrap();

    // --- 2. ACT ---
    let container = world.attach_item(back, "Cloak").unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while world.slot_state(back) == Some(SlotState::Loading) && Instant::now() < deadline {
        world.update(0.016);
        std::thread::sleep(Duration::from_millis(2));
    }

    // --- 3. ASSERT ---
    assert_eq!(world.slot_state(back), Some(SlotState::Loaded));
    let cloak = world.scene().children(container)[0];
    assert_eq!(world.scene().name(cloak), Some("Cloak"));
    assert_eq!(world.catalog_items(Path::new("gear.xml")).len(), 1);
}
