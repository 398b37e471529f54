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

// Tether Sandbox
// Dresses a knight, swings its sword arm for a while, then swaps gear.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tether_sdk::prelude::*;

const FRAME_TIME: f32 = 1.0 / 60.0;
const MAX_LOADING_FRAMES: u32 = 600;

struct Knight {
    root: EntityId,
    head: SlotId,
    right_hand: SlotId,
    left_hand: SlotId,
}

fn assets_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("assets")
}

fn spawn_knight(world: &mut GameWorld) -> Result<Knight> {
    let root = world.spawn("Knight");
    let skeleton = SkeletonComponent::new()
        .with_joint(
            "head",
            JointTransform::new(Vec3::new(0.0, 1.7, 0.0), Quaternion::IDENTITY, 1.0),
        )
        .with_joint(
            "hand_r",
            JointTransform::new(Vec3::new(-0.45, 1.0, 0.1), Quaternion::IDENTITY, 1.0),
        )
        .with_joint(
            "hand_l",
            JointTransform::new(Vec3::new(0.45, 1.0, 0.1), Quaternion::IDENTITY, 1.0),
        );
    world.set_skeleton(root, skeleton);

    let head = world
        .add_slot_component(
            root,
            SlotComponent::new("Head")
                .with_config_path("armor.xml")
                .with_joint("head")
                .with_type_filter("Helmet"),
        )
        .context("Knight entity vanished while adding slots")?;
    let right_hand = world
        .add_slot_component(
            root,
            SlotComponent::new("Hand")
                .with_config_path("weapons.yaml")
                .with_joint("hand_r")
                .with_type_filter("Weapon"),
        )
        .context("Knight entity vanished while adding slots")?;
    let left_hand = world
        .add_slot_component(
            root,
            SlotComponent::new("OffHand")
                .with_config_path("weapons.yaml")
                .with_joint("hand_l")
                .with_attachment_transform(Mat4::from_translation(Vec3::new(0.0, 0.0, 0.05))),
        )
        .context("Knight entity vanished while adding slots")?;

    Ok(Knight {
        root,
        head,
        right_hand,
        left_hand,
    })
}

/// Runs frames until no slot of the knight is loading.
fn settle(world: &mut GameWorld, knight: &Knight) -> Result<u32> {
    for frame in 0..MAX_LOADING_FRAMES {
        let loading = [knight.head, knight.right_hand, knight.left_hand]
            .iter()
            .any(|slot| world.slot_state(*slot) == Some(SlotState::Loading));
        if !loading {
            return Ok(frame);
        }
        world.update(FRAME_TIME);
        std::thread::sleep(Duration::from_millis(1));
    }
    bail!("Items still loading after {MAX_LOADING_FRAMES} frames")
}

fn report(world: &GameWorld, knight: &Knight) {
    for (label, slot) in [
        ("head", knight.head),
        ("right hand", knight.right_hand),
        ("left hand", knight.left_hand),
    ] {
        let item = world
            .slot_component(slot)
            .map(|c| c.loaded_item_name().to_owned())
            .unwrap_or_default();
        let position = world
            .lookup_loaded_entity(slot)
            .and_then(|e| world.scene().world_transform(e))
            .map(|m| m.translation());
        log::info!(
            "  {:<10} {:?} item='{}' at {:?}",
            label,
            world.slot_state(slot),
            item,
            position
        );
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = GameWorldConfig::from_ron_file(assets_dir().join("sandbox.ron"))?;
    let mut world = GameWorld::new(config)?;
    let knight = spawn_knight(&mut world)?;

    // --- Dress up ---
    let helmet = world
        .suitable_item_name(knight.head)
        .context("No helmet in the armor catalog")?;
    world.attach_item(knight.head, &helmet)?;
    let started = world.attach_item_to_slot(knight.root, "Hand", "Longsword");
    log::info!("Started {} sword load(s).", started);
    world.attach_item(knight.left_hand, "Torch")?;

    // Unknown items fail without touching the scene.
    if let Err(e) = world.attach_item(knight.left_hand, "Excalibur") {
        log::warn!("Expected failure: {e}");
    }
    world.attach_item(knight.left_hand, "Torch")?;

    let frames = settle(&mut world, &knight)?;
    log::info!("Gear loaded after {} frame(s):", frames);
    report(&world, &knight);

    // --- Swing ---
    for frame in 0..30 {
        let angle = (frame as f32 / 30.0) * std::f32::consts::PI;
        if let Some(skeleton) = world.skeleton_mut(knight.root) {
            if let Some(hand) = skeleton.joint_index("hand_r") {
                let pose = JointTransform::new(
                    Vec3::new(-0.45, 1.0 + 0.3 * angle.sin(), 0.1),
                    Quaternion::from_axis_angle(Vec3::X, -angle),
                    1.0,
                );
                skeleton.set_object_space_transform(hand, pose);
            }
        }
        world.update(FRAME_TIME);
    }
    log::info!("After the swing:");
    report(&world, &knight);

    // --- Swap and drop ---
    world.attach_item(knight.head, "Hood")?;
    if let Some(torch) = world.lookup_loaded_entity(knight.left_hand) {
        world.despawn(torch);
    }
    settle(&mut world, &knight)?;
    world.update(FRAME_TIME);
    log::info!("After swapping the helmet and dropping the torch:");
    report(&world, &knight);

    let entities = world.scene().entity_count();
    world.despawn(knight.root);
    world.update(FRAME_TIME);
    log::info!(
        "Knight removed; {} of {} entities left.",
        world.scene().entity_count(),
        entities
    );
    Ok(())
}
