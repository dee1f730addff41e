#![forbid(unsafe_code)]

//! Region controller: keeps one rendered region in sync with item snapshots.
//!
//! Each call to [`RegionController::apply`] diffs the new snapshot against
//! the view cache and emits the smallest [`UpdateOp`] list that brings the
//! presentation up to date:
//!
//! - membership, weight/rank, or container changed: the full list is
//!   re-packed; `Remove` ops come first, then `Create`/`Update` in placement
//!   order for ids that are new, moved, or restyled.
//! - only tags changed: no re-pack; `Update` with the cached rect and the
//!   roles to redraw.
//! - nothing changed: no ops.
//!
//! Calls for one region must be serialized by the caller.

use quadplan_core::{
    Container, ConfigError, Item, ItemId, OverflowWarning, PackConfig, PackError, Rect, RoleSet,
};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::cache::ViewCache;
use crate::diff::{DiffResult, diff, index};
use crate::packer::{Packer, overflow_for, validate};

#[cfg(feature = "tracing")]
use tracing::debug;

/// Identifier of an independently packed region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RegionId(pub u8);

/// Instruction for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum UpdateOp {
    /// Build a new element at `rect`; every role is drawn.
    Create {
        id: ItemId,
        rect: Rect,
        roles: RoleSet,
    },
    /// Move an existing element to `rect` and redraw `roles`.
    Update {
        id: ItemId,
        rect: Rect,
        roles: RoleSet,
    },
    /// Tear the element down.
    Remove { id: ItemId },
}

impl UpdateOp {
    pub fn id(&self) -> ItemId {
        match self {
            Self::Create { id, .. } | Self::Update { id, .. } | Self::Remove { id } => *id,
        }
    }

    pub fn is_create(&self) -> bool {
        matches!(self, Self::Create { .. })
    }

    pub fn is_update(&self) -> bool {
        matches!(self, Self::Update { .. })
    }

    pub fn is_remove(&self) -> bool {
        matches!(self, Self::Remove { .. })
    }

    /// Rect carried by `Create`/`Update`.
    pub fn rect(&self) -> Option<Rect> {
        match self {
            Self::Create { rect, .. } | Self::Update { rect, .. } => Some(*rect),
            Self::Remove { .. } => None,
        }
    }
}

/// Lifecycle of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionState {
    #[default]
    Empty,
    Populated,
}

/// Result of one [`RegionController::apply`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegionUpdate {
    pub ops: Vec<UpdateOp>,
    /// Overflow status of the applied snapshot.
    pub overflow: Option<OverflowWarning>,
    /// Whether the snapshot was re-packed.
    pub repacked: bool,
}

impl RegionUpdate {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Drives one region: diff, pack when needed, emit ops, update the cache.
#[derive(Debug)]
pub struct RegionController {
    id: RegionId,
    packer: Packer,
    cache: ViewCache,
    container: Option<Container>,
    state: RegionState,
}

impl RegionController {
    /// Create an empty controller for region `id`.
    pub fn new(id: RegionId, config: PackConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            id,
            packer: Packer::new(config)?,
            cache: ViewCache::new(),
            container: None,
            state: RegionState::Empty,
        })
    }

    pub fn id(&self) -> RegionId {
        self.id
    }

    pub fn state(&self) -> RegionState {
        self.state
    }

    pub fn cache(&self) -> &ViewCache {
        &self.cache
    }

    pub fn config(&self) -> &PackConfig {
        self.packer.config()
    }

    /// Container used by the last re-pack.
    pub fn container(&self) -> Option<Container> {
        self.container
    }

    /// Currently rendered `(id, rect)` pairs in placement order.
    pub fn placement(&self) -> Vec<(ItemId, Rect)> {
        self.cache.rects()
    }

    /// Forget everything rendered; the next apply re-creates every element.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.container = None;
        self.state = RegionState::Empty;
    }

    /// Bring the region in sync with `items` packed into `container`.
    pub fn apply(
        &mut self,
        container: Container,
        items: &[Item],
    ) -> Result<RegionUpdate, PackError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("region_apply", region = self.id.0, items = items.len())
            .entered();

        validate(container, items)?;

        let previous = self.cache.snapshot();
        let delta = diff(&previous, items);
        let resized = self.container.is_some_and(|last| last != container);
        let needs_pack = delta.membership_changed() || delta.geometry_changed() || resized;

        #[cfg(feature = "tracing")]
        debug!(
            added = delta.added.len(),
            removed = delta.removed.len(),
            changed = delta.changed.len(),
            resized,
            repack = needs_pack,
            "region diff"
        );

        let by_id = index(items);
        let ops = if needs_pack {
            self.repack(container, items, &by_id, &delta)?
        } else if !delta.changed.is_empty() {
            self.restyle(&by_id, &delta)
        } else {
            Vec::new()
        };

        if needs_pack {
            self.container = Some(container);
        }
        self.state = if items.is_empty() {
            RegionState::Empty
        } else {
            RegionState::Populated
        };

        Ok(RegionUpdate {
            ops,
            overflow: overflow_for(self.packer.config(), items),
            repacked: needs_pack,
        })
    }

    fn repack(
        &mut self,
        container: Container,
        items: &[Item],
        by_id: &FxHashMap<ItemId, &Item>,
        delta: &DiffResult,
    ) -> Result<Vec<UpdateOp>, PackError> {
        let placement = self.packer.pack(container, items)?;
        let mut ops = Vec::with_capacity(delta.removed.len() + placement.len());

        self.cache.purge_all(&delta.removed);
        ops.extend(delta.removed.iter().map(|id| UpdateOp::Remove { id: *id }));

        for placed in placement.entries() {
            let Some(&item) = by_id.get(&placed.id) else {
                continue;
            };
            match self.cache.get(placed.id) {
                None => ops.push(UpdateOp::Create {
                    id: placed.id,
                    rect: placed.rect,
                    roles: RoleSet::all(),
                }),
                Some(entry) => {
                    let roles = entry.last_tag.changed_roles(&item.tag);
                    if entry.last_rect != placed.rect || !roles.is_empty() {
                        ops.push(UpdateOp::Update {
                            id: placed.id,
                            rect: placed.rect,
                            roles,
                        });
                    }
                }
            }
            self.cache.upsert(item, placed.rect);
        }
        self.cache.set_order(placement.rects().map(|(id, _)| id));

        Ok(ops)
    }

    fn restyle(
        &mut self,
        by_id: &FxHashMap<ItemId, &Item>,
        delta: &DiffResult,
    ) -> Vec<UpdateOp> {
        let mut ops = Vec::with_capacity(delta.changed.len());
        for id in &delta.changed {
            let (Some(&item), Some(entry)) = (
                by_id.get(id),
                self.cache.get(*id).copied(),
            ) else {
                continue;
            };
            ops.push(UpdateOp::Update {
                id: *id,
                rect: entry.last_rect,
                roles: entry.last_tag.changed_roles(&item.tag),
            });
            self.cache.upsert(item, entry.last_rect);
        }
        ops
    }
}
