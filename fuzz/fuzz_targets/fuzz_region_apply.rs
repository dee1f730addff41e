#![no_main]

use std::collections::BTreeSet;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use quadplan_core::{Container, ElementRole, Item, ItemId, PackConfig, Tag};
use quadplan_layout::{RegionController, RegionId, UpdateOp};

#[derive(Debug, Arbitrary)]
struct Step {
    width: u8,
    height: u8,
    items: Vec<(u8, u8, u8)>,
}

fuzz_target!(|steps: Vec<Step>| {
    let Ok(mut region) = RegionController::new(RegionId(1), PackConfig::default()) else {
        return;
    };

    for step in steps.iter().take(16) {
        let container = Container::new(u16::from(step.width) + 16, u16::from(step.height) + 16);
        let mut seen = BTreeSet::new();
        let items: Vec<Item> = step
            .items
            .iter()
            .take(16)
            .filter(|(id, _, _)| seen.insert(*id % 24))
            .map(|(id, weight, title)| {
                Item::new(u64::from(id % 24), u32::from(*weight) + 1)
                    .tag(Tag::empty().with(ElementRole::Title, title))
            })
            .collect();

        let before: BTreeSet<ItemId> = region.placement().into_iter().map(|(id, _)| id).collect();
        let update = region.apply(container, &items).expect("valid input applies");
        let after: BTreeSet<ItemId> = items.iter().map(|item| item.id).collect();

        // Post-conditions that must always hold:
        let mut touched = BTreeSet::new();
        for op in &update.ops {
            assert!(touched.insert(op.id()), "{op:?} emitted twice");
            match op {
                UpdateOp::Create { id, .. } => assert!(!before.contains(id) && after.contains(id)),
                UpdateOp::Remove { id } => assert!(before.contains(id) && !after.contains(id)),
                UpdateOp::Update { id, rect, .. } => {
                    assert!(before.contains(id) && after.contains(id));
                    assert!(rect.fits_in(container) || !update.repacked);
                }
            }
        }
        let cached: BTreeSet<ItemId> = region.placement().into_iter().map(|(id, _)| id).collect();
        assert_eq!(cached, after, "cache out of sync");
    }
});
