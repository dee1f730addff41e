#![no_main]

use libfuzzer_sys::fuzz_target;
use quadplan_core::{Container, Item, PackConfig};
use quadplan_layout::Packer;

fuzz_target!(|data: &[u8]| {
    // First two bytes derive the container (8..263 x 8..263).
    if data.len() < 2 {
        return;
    }
    let container = Container::new(u16::from(data[0]) + 8, u16::from(data[1]) + 8);

    // Every following byte pair becomes one item: weight 1..=256, rank -8..8.
    let items: Vec<Item> = data[2..]
        .chunks_exact(2)
        .take(24)
        .enumerate()
        .map(|(i, pair)| {
            Item::new(i as u64 + 1, u32::from(pair[0]) + 1).rank(i32::from(pair[1] % 16) - 8)
        })
        .collect();

    let Ok(packer) = Packer::new(PackConfig::default()) else {
        return;
    };
    let placement = packer.pack(container, &items).expect("valid input packs");

    // Post-conditions that must always hold:
    assert_eq!(placement.len(), items.len(), "item dropped");
    for placed in placement.entries() {
        assert!(placed.rect.fits_in(container), "{placed:?} out of bounds");
        assert!(!placed.rect.is_empty(), "{placed:?} is empty");
    }
    if placement.fallback_count() > 0 {
        assert!(
            items.len() > packer.min_slot_capacity(container),
            "fallback while minimum-size slots remain"
        );
    }
    let settled: Vec<_> = placement.entries().iter().filter(|p| !p.is_fallback()).collect();
    for (i, a) in settled.iter().enumerate() {
        for b in &settled[i + 1..] {
            assert!(!a.rect.conflicts_with(&b.rect, 1), "{a:?} overlaps {b:?}");
        }
    }
    assert_eq!(
        placement,
        packer.pack(container, &items).expect("valid input packs"),
        "packing is not deterministic"
    );
});
