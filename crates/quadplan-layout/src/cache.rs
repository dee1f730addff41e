//! View cache: the last rendered geometry and state per item.
//!
//! [`ViewCache`] remembers, for every item currently shown in a region, the
//! rect it was given and the item state it was rendered from. The region
//! controller diffs new snapshots against [`ViewCache::snapshot`] and only
//! emits operations for ids whose cached entry no longer matches.
//!
//! # Ownership
//!
//! A cache belongs to exactly one region controller. It holds one entry per
//! placed id; entries are purged as soon as their id leaves a snapshot.

use quadplan_core::{Item, ItemId, Rect, Tag};
use rustc_hash::{FxHashMap, FxHashSet};

/// Last known rendered state of one item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewCacheEntry {
    pub id: ItemId,
    pub last_rect: Rect,
    pub last_tag: Tag,
    /// Weight the rect was derived from.
    pub weight: u32,
    pub rank: i32,
}

impl ViewCacheEntry {
    /// Reconstruct the item this entry was rendered from.
    pub fn item(&self) -> Item {
        Item {
            id: self.id,
            weight: self.weight,
            rank: self.rank,
            tag: self.last_tag,
        }
    }
}

/// Statistics about cache churn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewCacheStats {
    /// Number of entries currently in the cache.
    pub entries: usize,
    /// Entries created since creation or last reset.
    pub inserts: u64,
    /// Entries overwritten with new state.
    pub updates: u64,
    /// Entries dropped because their id disappeared.
    pub purges: u64,
}

/// `id -> ViewCacheEntry` map with a stable snapshot order.
#[derive(Debug, Default)]
pub struct ViewCache {
    entries: FxHashMap<ItemId, ViewCacheEntry>,
    /// Ids in the order they were last placed.
    order: Vec<ItemId>,
    inserts: u64,
    updates: u64,
    purges: u64,
}

impl ViewCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&ViewCacheEntry> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Cached items in placement order, ready to diff against.
    pub fn snapshot(&self) -> Vec<Item> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id))
            .map(ViewCacheEntry::item)
            .collect()
    }

    /// Cached `(id, rect)` pairs in placement order.
    pub fn rects(&self) -> Vec<(ItemId, Rect)> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id))
            .map(|entry| (entry.id, entry.last_rect))
            .collect()
    }

    /// Insert or overwrite the entry for `item`.
    pub fn upsert(&mut self, item: &Item, rect: Rect) {
        let entry = ViewCacheEntry {
            id: item.id,
            last_rect: rect,
            last_tag: item.tag,
            weight: item.weight,
            rank: item.rank,
        };
        if self.entries.insert(item.id, entry).is_some() {
            self.updates += 1;
        } else {
            self.order.push(item.id);
            self.inserts += 1;
        }
    }

    /// Drop the entry for `id`, returning it.
    pub fn purge(&mut self, id: ItemId) -> Option<ViewCacheEntry> {
        let removed = self.entries.remove(&id)?;
        self.order.retain(|other| *other != id);
        self.purges += 1;
        Some(removed)
    }

    /// Drop the entries for every id in `ids` with one pass over the order.
    pub fn purge_all(&mut self, ids: &[ItemId]) -> usize {
        let gone: FxHashSet<ItemId> = ids
            .iter()
            .copied()
            .filter(|id| self.entries.remove(id).is_some())
            .collect();
        if !gone.is_empty() {
            self.order.retain(|id| !gone.contains(id));
            self.purges += gone.len() as u64;
        }
        gone.len()
    }

    /// Reorder the snapshot to follow `order`; ids not cached are skipped.
    pub fn set_order(&mut self, order: impl IntoIterator<Item = ItemId>) {
        let mut seen = FxHashSet::default();
        let mut next: Vec<ItemId> = order
            .into_iter()
            .filter(|id| self.entries.contains_key(id) && seen.insert(*id))
            .collect();
        // Keep any cached ids the caller did not mention, after the rest.
        next.extend(self.order.iter().filter(|id| !seen.contains(*id)));
        self.order = next;
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.purges += self.entries.len() as u64;
        self.entries.clear();
        self.order.clear();
    }

    pub fn stats(&self) -> ViewCacheStats {
        ViewCacheStats {
            entries: self.entries.len(),
            inserts: self.inserts,
            updates: self.updates,
            purges: self.purges,
        }
    }

    /// Reset churn counters without touching entries.
    pub fn reset_stats(&mut self) {
        self.inserts = 0;
        self.updates = 0;
        self.purges = 0;
    }
}
