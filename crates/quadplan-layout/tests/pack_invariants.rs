//! Property invariants for the packer, the diff engine, and the region
//! controller.
//!
//! Random item lists are packed and diffed; every case checks geometric
//! validity, deterministic replay, and the diff partition laws.

use std::collections::BTreeSet;

use proptest::prelude::*;
use quadplan_layout::{
    Container, ElementRole, Item, ItemId, PackConfig, Packer, Placement, RegionController,
    RegionId, Tag, diff,
};

fn packer() -> Packer {
    Packer::new(PackConfig::default()).expect("default config is valid")
}

fn tag_from(seed: u8) -> Tag {
    Tag::empty()
        .with(ElementRole::Title, &(seed % 4))
        .with(ElementRole::Info, &(seed % 3))
        .with(ElementRole::Indicator, &(seed % 2))
}

/// Items with unique ids `1..=n`.
fn items_strategy(max_len: usize) -> impl Strategy<Value = Vec<Item>> {
    prop::collection::vec((1u32..=240, -3i32..=3, any::<u8>()), 0..=max_len).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (weight, rank, seed))| {
                Item::new(i as u64 + 1, weight).rank(rank).tag(tag_from(seed))
            })
            .collect()
    })
}

/// Items drawn from a fixed id pool so two snapshots overlap partially.
fn pooled_items_strategy() -> impl Strategy<Value = Vec<Item>> {
    prop::collection::btree_map(1u64..=16, (1u32..=240, any::<u8>()), 0..=12).prop_map(|map| {
        map.into_iter()
            .map(|(id, (weight, seed))| Item::new(id, weight).tag(tag_from(seed)))
            .collect()
    })
}

fn container_strategy() -> impl Strategy<Value = Container> {
    (40u16..=500, 40u16..=400).prop_map(|(w, h)| Container::new(w, h))
}

fn assert_valid(placement: &Placement, container: Container, buffer: u16) {
    for placed in placement.entries() {
        assert!(
            placed.rect.fits_in(container),
            "{placed:?} leaves {container:?}"
        );
        assert!(!placed.rect.is_empty(), "{placed:?} is empty");
    }
    // Fallback entries may stack; everything that found a slot must not.
    let settled: Vec<_> = placement
        .entries()
        .iter()
        .filter(|placed| !placed.is_fallback())
        .collect();
    for (i, a) in settled.iter().enumerate() {
        for b in &settled[i + 1..] {
            assert!(
                !a.rect.conflicts_with(&b.rect, buffer),
                "{a:?} overlaps {b:?}"
            );
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn every_item_is_placed_in_bounds(
        container in container_strategy(),
        items in items_strategy(14),
    ) {
        let placement = packer().pack(container, &items).unwrap();
        prop_assert_eq!(placement.len(), items.len());
        let placed: BTreeSet<ItemId> = placement.rects().map(|(id, _)| id).collect();
        let expected: BTreeSet<ItemId> = items.iter().map(|item| item.id).collect();
        prop_assert_eq!(placed, expected);
        assert_valid(&placement, container, 1);
    }

    #[test]
    fn roomy_containers_never_fall_back(
        width in 200u16..=500,
        height in 150u16..=400,
        items in items_strategy(8),
    ) {
        let container = Container::new(width, height);
        let placement = packer().pack(container, &items).unwrap();
        prop_assert_eq!(placement.fallback_count(), 0);
        assert_valid(&placement, container, 1);
    }

    #[test]
    fn fallback_only_when_minimum_slots_run_out(
        width in 20u16..=200,
        height in 20u16..=160,
        items in items_strategy(40),
    ) {
        let container = Container::new(width, height);
        let packer = packer();
        let placement = packer.pack(container, &items).unwrap();
        if items.len() <= packer.min_slot_capacity(container) {
            prop_assert_eq!(placement.fallback_count(), 0);
        }
        assert_valid(&placement, container, 1);
    }

    #[test]
    fn packing_is_deterministic(
        container in container_strategy(),
        items in items_strategy(10),
    ) {
        let first = packer().pack(container, &items).unwrap();
        let second = packer().pack(container, &items).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn input_order_does_not_matter(
        container in container_strategy(),
        items in items_strategy(10),
    ) {
        let mut reversed = items.clone();
        reversed.reverse();
        let forward = packer().pack(container, &items).unwrap();
        let backward = packer().pack(container, &reversed).unwrap();
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn diff_partitions_the_id_union(
        previous in pooled_items_strategy(),
        current in pooled_items_strategy(),
    ) {
        let result = diff(&previous, &current);

        let old: BTreeSet<ItemId> = previous.iter().map(|item| item.id).collect();
        let new: BTreeSet<ItemId> = current.iter().map(|item| item.id).collect();
        let classes = [&result.added, &result.removed, &result.changed, &result.unchanged];

        let mut seen = BTreeSet::new();
        for class in classes {
            for id in class {
                prop_assert!(seen.insert(*id), "{:?} classified twice", id);
            }
        }
        let union: BTreeSet<ItemId> = old.union(&new).copied().collect();
        prop_assert_eq!(seen, union);

        for id in &result.added {
            prop_assert!(new.contains(id) && !old.contains(id));
        }
        for id in &result.removed {
            prop_assert!(old.contains(id) && !new.contains(id));
        }
        for id in &result.reshaped {
            prop_assert!(result.changed.contains(id));
        }
    }

    #[test]
    fn diff_of_identical_snapshots_is_empty(items in pooled_items_strategy()) {
        let result = diff(&items, &items);
        prop_assert!(result.is_empty());
        prop_assert_eq!(result.unchanged.len(), items.len());
    }

    #[test]
    fn tag_only_changes_never_create_or_remove(
        items in items_strategy(10),
        seeds in prop::collection::vec(any::<u8>(), 10),
    ) {
        let container = Container::new(400, 300);
        let mut region = RegionController::new(RegionId(1), PackConfig::default()).unwrap();
        region.apply(container, &items).unwrap();
        let before = region.placement();

        let retagged: Vec<Item> = items
            .iter()
            .zip(seeds.iter().cycle())
            .map(|(item, seed)| item.tag(tag_from(seed.wrapping_add(1))))
            .collect();
        let update = region.apply(container, &retagged).unwrap();

        prop_assert!(!update.repacked);
        prop_assert!(update.ops.iter().all(|op| op.is_update()));
        prop_assert_eq!(region.placement(), before);
        prop_assert_eq!(region.cache().snapshot().len(), items.len());
    }

    #[test]
    fn cache_tracks_exactly_the_current_ids(
        first in pooled_items_strategy(),
        second in pooled_items_strategy(),
    ) {
        let container = Container::new(480, 360);
        let mut region = RegionController::new(RegionId(2), PackConfig::default()).unwrap();
        region.apply(container, &first).unwrap();
        region.apply(container, &second).unwrap();

        let cached: BTreeSet<ItemId> = region.placement().into_iter().map(|(id, _)| id).collect();
        let expected: BTreeSet<ItemId> = second.iter().map(|item| item.id).collect();
        prop_assert_eq!(cached, expected);
    }
}
