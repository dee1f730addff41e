#![forbid(unsafe_code)]

//! Snapshot diff engine.
//!
//! Compares two item snapshots keyed by [`ItemId`] and classifies every id
//! of either snapshot exactly once:
//!
//! | class | meaning |
//! |---|---|
//! | `added` | only in the current snapshot |
//! | `removed` | only in the previous snapshot |
//! | `changed` | in both, tag or geometry fields differ |
//! | `unchanged` | in both, identical |
//!
//! `reshaped` is the subset of `changed` whose weight or rank moved, i.e.
//! whose packing output may differ.
//!
//! Duplicate ids inside one snapshot collapse to their last occurrence.

use quadplan_core::{Item, ItemId};
use rustc_hash::FxHashMap;
use serde::Serialize;

/// Classification of two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    /// Ids only in the current snapshot, in current order.
    pub added: Vec<ItemId>,
    /// Ids only in the previous snapshot, in previous order.
    pub removed: Vec<ItemId>,
    /// Ids in both whose tag, weight, or rank differ, in current order.
    pub changed: Vec<ItemId>,
    /// Ids in both with identical state, in current order.
    pub unchanged: Vec<ItemId>,
    /// Subset of `changed` whose weight or rank differ.
    pub reshaped: Vec<ItemId>,
}

impl DiffResult {
    /// True when nothing was added, removed, or changed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// True when the id set differs between snapshots.
    pub fn membership_changed(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }

    /// True when any surviving item needs new geometry.
    pub fn geometry_changed(&self) -> bool {
        !self.reshaped.is_empty()
    }

    /// Number of ids classified, i.e. `|old ∪ new|`.
    pub fn total(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len() + self.unchanged.len()
    }
}

/// Id lookup over a snapshot; a duplicated id maps to its last occurrence.
pub(crate) fn index(items: &[Item]) -> FxHashMap<ItemId, &Item> {
    let mut map = FxHashMap::with_capacity_and_hasher(items.len(), Default::default());
    for item in items {
        map.insert(item.id, item);
    }
    map
}

/// Diff two snapshots in O(n).
pub fn diff(previous: &[Item], current: &[Item]) -> DiffResult {
    let before = index(previous);
    let after = index(current);
    let mut result = DiffResult::default();

    for item in current {
        // Only the winning occurrence of a duplicated id is classified.
        if !after
            .get(&item.id)
            .is_some_and(|winner| std::ptr::eq(*winner, item))
        {
            continue;
        }
        match before.get(&item.id) {
            None => result.added.push(item.id),
            Some(old) if old.geometry_differs(item) => {
                result.changed.push(item.id);
                result.reshaped.push(item.id);
            }
            Some(old) if old.tag != item.tag => result.changed.push(item.id),
            Some(_) => result.unchanged.push(item.id),
        }
    }

    for item in previous {
        if after.contains_key(&item.id) {
            continue;
        }
        if before
            .get(&item.id)
            .is_some_and(|winner| std::ptr::eq(*winner, item))
        {
            result.removed.push(item.id);
        }
    }

    result
}
