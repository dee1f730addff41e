#![forbid(unsafe_code)]

//! Weighted rectangle packer.
//!
//! [`Packer::pack`] turns a list of weighted items into non-overlapping
//! rectangles inside a fixed [`Container`]. Packing is a global operation:
//! the position of every rect depends on everything placed before it, so
//! callers always pack a region's full item list.
//!
//! # Pipeline
//!
//! 1. **Validate** the container and items (zero dimensions, zero weights,
//!    duplicate ids are fatal).
//! 2. **Size** every item: its area fraction is `weight / base_weight`,
//!    capped at `area_cap` and scaled down uniformly when the fractions sum
//!    above one. The square side is reshaped by the weight's aspect band and
//!    clamped to `[min_side, dimension * max_ratio]`.
//! 3. **Order** by `(weight desc, rank desc, id asc)`.
//! 4. **Search** with each [`Strategy`] in turn. When every strategy fails
//!    the item shrinks and the search repeats; at minimum size the item is
//!    stacked at a deterministic fallback offset instead of being dropped.
//! 5. **Re-run** the whole pass with every item scaled down while any
//!    fallback happened above minimum size. Fallbacks survive only when the
//!    container cannot hold every item at minimum size.
//!
//! Output is a pure function of `(config, container, items)`.

use std::cmp::Reverse;

use quadplan_core::{
    ConfigError, Container, InvalidInput, Item, ItemId, OverflowWarning, PackConfig, PackError,
    Rect,
};
use rustc_hash::FxHashSet;
use serde::Serialize;

#[cfg(feature = "tracing")]
use tracing::{debug, trace, warn};

/// Per-step shrink factor applied when no strategy finds room.
const SHRINK_FACTOR: f64 = 0.8;

/// Search strategy that produced a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Anchors at the origin and beside every placed rect, top rows first.
    TopLeft,
    /// Grid scan, columns outermost.
    ColumnMajor,
    /// Grid scan, rows outermost.
    RowMajor,
    /// Container corners, then the corners of placed rects.
    Corner,
    /// No free space at minimum size: stacked at a cascading offset.
    Fallback,
}

impl Strategy {
    /// Search strategies in the order they are tried.
    pub const SEARCH_ORDER: [Strategy; 4] = [
        Self::TopLeft,
        Self::ColumnMajor,
        Self::RowMajor,
        Self::Corner,
    ];
}

/// One placed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Placed {
    pub id: ItemId,
    pub rect: Rect,
    pub strategy: Strategy,
}

impl Placed {
    /// True when the item was stacked instead of found a free slot.
    pub fn is_fallback(&self) -> bool {
        self.strategy == Strategy::Fallback
    }
}

/// Ordered packing output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Placement {
    entries: Vec<Placed>,
    overflow: Option<OverflowWarning>,
}

impl Placement {
    /// Entries in placement order.
    pub fn entries(&self) -> &[Placed] {
        &self.entries
    }

    /// `(id, rect)` pairs in placement order.
    pub fn rects(&self) -> impl Iterator<Item = (ItemId, Rect)> + '_ {
        self.entries.iter().map(|placed| (placed.id, placed.rect))
    }

    /// Rect assigned to `id`, if placed.
    pub fn rect_of(&self, id: ItemId) -> Option<Rect> {
        self.entries
            .iter()
            .find(|placed| placed.id == id)
            .map(|placed| placed.rect)
    }

    /// Overflow annotation, when the items ask for more than one container.
    pub fn overflow(&self) -> Option<OverflowWarning> {
        self.overflow
    }

    /// Number of items stacked by the fallback.
    pub fn fallback_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|placed| placed.is_fallback())
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<Placed> {
        self.entries
    }
}

/// Reject inputs that cannot be packed.
pub fn validate(container: Container, items: &[Item]) -> Result<(), InvalidInput> {
    if container.is_empty() {
        return Err(InvalidInput::EmptyContainer { container });
    }
    let mut seen = FxHashSet::with_capacity_and_hasher(items.len(), Default::default());
    for item in items {
        if item.weight == 0 {
            return Err(InvalidInput::ZeroWeight { id: item.id });
        }
        if !seen.insert(item.id) {
            return Err(InvalidInput::DuplicateId { id: item.id });
        }
    }
    Ok(())
}

/// Overflow status of an item list: total weight above one container.
pub fn overflow_for(config: &PackConfig, items: &[Item]) -> Option<OverflowWarning> {
    let total_weight: u64 = items.iter().map(|item| u64::from(item.weight)).sum();
    (total_weight > u64::from(config.base_weight)).then_some(OverflowWarning {
        total_weight,
        capacity: config.base_weight,
    })
}

/// Items in placement order: `(weight desc, rank desc, id asc)`.
pub fn placement_order(items: &[Item]) -> Vec<&Item> {
    let mut ordered: Vec<&Item> = items.iter().collect();
    ordered.sort_by_key(|item| (Reverse(item.weight), Reverse(item.rank), item.id));
    ordered
}

/// Packs weighted items into a container.
#[derive(Debug, Clone, Default)]
pub struct Packer {
    config: PackConfig,
}

impl Packer {
    /// Create a packer, validating the configuration once.
    pub fn new(config: PackConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Place every item inside `container`.
    pub fn pack(&self, container: Container, items: &[Item]) -> Result<Placement, PackError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "pack",
            items = items.len(),
            width = container.width,
            height = container.height
        )
        .entered();

        validate(container, items)?;

        let overflow = overflow_for(&self.config, items);
        let ordered = placement_order(items);
        let floor = self.min_size(container);
        let mut scale = self.area_scale(&ordered);

        // A fallback while some item is still above minimum size means the
        // earlier, larger items took the room: shrink everyone and re-run.
        let entries = loop {
            let entries = self.place_all(container, &ordered, scale);
            let settled = !entries.iter().any(Placed::is_fallback);
            let at_floor = ordered
                .iter()
                .all(|item| self.target_size(container, item.weight, scale) == floor);
            if settled || at_floor {
                break entries;
            }
            #[cfg(feature = "tracing")]
            debug!(scale, "fallback above minimum size, shrinking every item");
            scale *= SHRINK_FACTOR;
        };

        #[cfg(feature = "tracing")]
        for placed in entries.iter().filter(|placed| placed.is_fallback()) {
            warn!(
                id = placed.id.get(),
                x = placed.rect.x,
                y = placed.rect.y,
                "no free space at minimum size, stacking at fallback offset"
            );
        }

        Ok(Placement { entries, overflow })
    }

    /// One placement pass over `ordered` at a fixed area `scale`.
    fn place_all(&self, container: Container, ordered: &[&Item], scale: f64) -> Vec<Placed> {
        let mut entries: Vec<Placed> = Vec::with_capacity(ordered.len());
        let mut fallbacks = 0usize;

        for item in ordered {
            let mut size = self.target_size(container, item.weight, scale);
            let placed = loop {
                if let Some((rect, strategy)) = self.search(container, size, &entries) {
                    break Placed {
                        id: item.id,
                        rect,
                        strategy,
                    };
                }
                let smaller = self.shrink(container, size);
                if smaller == size {
                    let rect = self.fallback_rect(container, size, fallbacks);
                    fallbacks += 1;
                    break Placed {
                        id: item.id,
                        rect,
                        strategy: Strategy::Fallback,
                    };
                }
                size = smaller;
            };

            #[cfg(feature = "tracing")]
            trace!(
                id = placed.id.get(),
                strategy = ?placed.strategy,
                w = placed.rect.width,
                h = placed.rect.height,
                "placed"
            );
            entries.push(placed);
        }

        entries
    }

    /// Smallest size any item can take in `container`.
    pub fn min_size(&self, container: Container) -> (u16, u16) {
        (
            self.config.min_side.min(container.width),
            self.config.min_side.min(container.height),
        )
    }

    /// Number of minimum-size items that fit side by side, buffer included.
    pub fn min_slot_capacity(&self, container: Container) -> usize {
        let (width, height) = self.min_size(container);
        let buffer = u32::from(self.config.overlap_buffer);
        let per_axis = |dimension: u16, side: u16| {
            (u32::from(dimension) + buffer) / (u32::from(side) + buffer)
        };
        (per_axis(container.width, width) as usize) * (per_axis(container.height, height) as usize)
    }

    /// Uniform factor that keeps the summed area fractions at or below one.
    ///
    /// Summed in placement order so the result does not depend on input order.
    fn area_scale(&self, items: &[&Item]) -> f64 {
        let total: f64 = items.iter().map(|item| self.area_fraction(item.weight)).sum();
        if total > 1.0 { 1.0 / total } else { 1.0 }
    }

    fn area_fraction(&self, weight: u32) -> f64 {
        (f64::from(weight) / f64::from(self.config.base_weight)).min(self.config.area_cap)
    }

    /// Banded width/height for an item before any search.
    pub fn target_size(&self, container: Container, weight: u32, scale: f64) -> (u16, u16) {
        let area = f64::from(container.area()) * self.area_fraction(weight) * scale;
        let side = area.sqrt();
        let stretch = self.config.aspect_ratio(weight).sqrt();
        (
            self.clamp_side(side * stretch, container.width),
            self.clamp_side(side / stretch, container.height),
        )
    }

    fn clamp_side(&self, value: f64, dimension: u16) -> u16 {
        let min = self.config.min_side.min(dimension);
        let max = ((f64::from(dimension) * self.config.max_ratio).floor() as u16).max(min);
        (value.round() as u16).clamp(min, max)
    }

    fn shrink(&self, container: Container, (width, height): (u16, u16)) -> (u16, u16) {
        (
            self.clamp_side(f64::from(width) * SHRINK_FACTOR, container.width)
                .min(width),
            self.clamp_side(f64::from(height) * SHRINK_FACTOR, container.height)
                .min(height),
        )
    }

    fn search(
        &self,
        container: Container,
        size: (u16, u16),
        placed: &[Placed],
    ) -> Option<(Rect, Strategy)> {
        let PackConfig {
            min_side,
            overlap_buffer,
            ..
        } = self.config;
        Strategy::SEARCH_ORDER.into_iter().find_map(|strategy| {
            candidates(strategy, container, size, placed, min_side, overlap_buffer)
                .into_iter()
                .map(|(x, y)| Rect::new(x, y, size.0, size.1))
                .find(|rect| self.is_free(container, rect, placed))
                .map(|rect| (rect, strategy))
        })
    }

    fn is_free(&self, container: Container, rect: &Rect, placed: &[Placed]) -> bool {
        rect.fits_in(container)
            && placed
                .iter()
                .all(|other| !rect.conflicts_with(&other.rect, self.config.overlap_buffer))
    }

    /// Cascading offset for the `index`-th fallback, always inside the container.
    fn fallback_rect(
        &self,
        container: Container,
        (width, height): (u16, u16),
        index: usize,
    ) -> Rect {
        let step = u64::from(self.config.min_side);
        let offset = step * index as u64;
        let x = offset % (u64::from(container.width - width) + 1);
        let y = offset % (u64::from(container.height - height) + 1);
        Rect::new(x as u16, y as u16, width, height)
    }
}

/// Candidate top-left positions for one strategy, in search order.
fn candidates(
    strategy: Strategy,
    container: Container,
    (width, height): (u16, u16),
    placed: &[Placed],
    min_side: u16,
    buffer: u16,
) -> Vec<(u16, u16)> {
    match strategy {
        Strategy::TopLeft => {
            let mut anchors = vec![(0u16, 0u16)];
            for other in placed {
                let right = other.rect.right().saturating_add(buffer);
                let below = other.rect.bottom().saturating_add(buffer);
                anchors.extend([
                    (right, other.rect.y),
                    (other.rect.x, below),
                    (right, 0),
                    (0, below),
                ]);
            }
            anchors.sort_by_key(|&(x, y)| (y, x));
            anchors.dedup();
            anchors
        }
        Strategy::ColumnMajor | Strategy::RowMajor => {
            let step = (width.min(height) / 2).max(min_side).max(1);
            let xs = scan_positions(container.width, width, step);
            let ys = scan_positions(container.height, height, step);
            if strategy == Strategy::ColumnMajor {
                xs.iter()
                    .flat_map(|&x| ys.iter().map(move |&y| (x, y)))
                    .collect()
            } else {
                ys.iter()
                    .flat_map(|&y| xs.iter().map(move |&x| (x, y)))
                    .collect()
            }
        }
        Strategy::Corner => {
            let max_x = container.width.saturating_sub(width);
            let max_y = container.height.saturating_sub(height);
            let mut anchors = vec![(0, 0), (max_x, 0), (0, max_y), (max_x, max_y)];
            for other in placed {
                let r = other.rect;
                let right = r.right().saturating_add(buffer);
                let below = r.bottom().saturating_add(buffer);
                let left = r.x.checked_sub(width.saturating_add(buffer));
                let above = r.y.checked_sub(height.saturating_add(buffer));
                let bottom_aligned = r.bottom().checked_sub(height);
                let right_aligned = r.right().checked_sub(width);
                anchors.extend(
                    [
                        left.zip(Some(r.y)),
                        left.zip(bottom_aligned),
                        Some(right).zip(bottom_aligned),
                        Some(r.x).zip(above),
                        right_aligned.zip(above),
                        right_aligned.zip(Some(below)),
                    ]
                    .into_iter()
                    .flatten(),
                );
            }
            anchors
        }
        Strategy::Fallback => Vec::new(),
    }
}

/// Positions `0, step, 2*step, ...` that keep `size` inside `dimension`,
/// always ending flush with the far edge.
fn scan_positions(dimension: u16, size: u16, step: u16) -> Vec<u16> {
    let Some(last) = dimension.checked_sub(size) else {
        return Vec::new();
    };
    let mut positions: Vec<u16> = (0..=last).step_by(usize::from(step)).collect();
    if positions.last() != Some(&last) {
        positions.push(last);
    }
    positions
}

/// Pack with a one-off [`Packer`].
pub fn pack(
    config: &PackConfig,
    container: Container,
    items: &[Item],
) -> Result<Placement, PackError> {
    Packer::new(config.clone())?.pack(container, items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packer() -> Packer {
        Packer::new(PackConfig::default()).expect("default config is valid")
    }

    fn assert_no_conflicts(placement: &Placement, buffer: u16) {
        let entries = placement.entries();
        for (i, a) in entries.iter().enumerate() {
            for b in &entries[i + 1..] {
                assert!(
                    !a.rect.conflicts_with(&b.rect, buffer),
                    "{:?} conflicts with {:?}",
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn empty_items_give_empty_placement() {
        let placement = packer().pack(Container::new(400, 300), &[]).unwrap();
        assert!(placement.is_empty());
        assert_eq!(placement.overflow(), None);
    }

    #[test]
    fn rejects_empty_container() {
        let err = packer()
            .pack(Container::new(0, 300), &[Item::new(1, 30)])
            .unwrap_err();
        assert!(matches!(
            err,
            PackError::InvalidInput(InvalidInput::EmptyContainer { .. })
        ));
    }

    #[test]
    fn rejects_zero_weight_and_duplicates() {
        let container = Container::new(400, 300);
        assert_eq!(
            packer().pack(container, &[Item::new(1, 0)]),
            Err(PackError::InvalidInput(InvalidInput::ZeroWeight {
                id: ItemId::new(1)
            }))
        );
        assert_eq!(
            packer().pack(container, &[Item::new(4, 30), Item::new(4, 60)]),
            Err(PackError::InvalidInput(InvalidInput::DuplicateId {
                id: ItemId::new(4)
            }))
        );
    }

    #[test]
    fn invalid_config_is_rejected_before_packing() {
        let config = PackConfig::default().base_weight(0);
        assert_eq!(
            pack(&config, Container::new(10, 10), &[]),
            Err(PackError::Config(ConfigError::ZeroBaseWeight))
        );
    }

    #[test]
    fn order_is_weight_then_rank_then_id() {
        let items = [
            Item::new(5, 30),
            Item::new(2, 60).rank(1),
            Item::new(3, 60).rank(4),
            Item::new(1, 30),
        ];
        let order: Vec<u64> = placement_order(&items).iter().map(|i| i.id.get()).collect();
        assert_eq!(order, vec![3, 2, 1, 5]);
    }

    #[test]
    fn oversized_single_item_is_clamped_at_origin() {
        let placement = packer()
            .pack(Container::new(40, 20), &[Item::new(7, 10_000)])
            .unwrap();
        let rect = placement.rect_of(ItemId::new(7)).unwrap();
        assert_eq!((rect.x, rect.y), (0, 0));
        assert!(rect.fits_in(Container::new(40, 20)));
        assert!(placement.overflow().is_some());
    }

    #[test]
    fn container_smaller_than_min_side_still_places() {
        let placement = packer()
            .pack(Container::new(3, 2), &[Item::new(1, 30)])
            .unwrap();
        assert_eq!(placement.rect_of(ItemId::new(1)), Some(Rect::new(0, 0, 3, 2)));
    }

    #[test]
    fn heavier_items_are_larger() {
        let items = [Item::new(1, 30), Item::new(2, 60), Item::new(3, 90)];
        let placement = packer().pack(Container::new(400, 300), &items).unwrap();
        assert_eq!(placement.overflow(), None);
        let area = |id| placement.rect_of(ItemId::new(id)).unwrap().area();
        assert!(area(3) > area(2));
        assert!(area(2) > area(1));
        assert_no_conflicts(&placement, 1);
    }

    #[test]
    fn saturated_container_uses_fallback_without_dropping() {
        let items: Vec<Item> = (1..=40).map(|id| Item::new(id, 30)).collect();
        let placement = packer().pack(Container::new(20, 20), &items).unwrap();
        assert_eq!(placement.len(), 40);
        assert!(placement.fallback_count() > 0);
        for placed in placement.entries() {
            assert!(placed.rect.fits_in(Container::new(20, 20)));
        }
    }

    #[test]
    fn early_large_items_do_not_push_later_ones_into_fallback() {
        let weights = [30, 60, 120, 180];
        for (width, height, count) in [(80, 60, 9), (120, 90, 17), (200, 150, 27)] {
            let container = Container::new(width, height);
            let items: Vec<Item> = (1..=count)
                .map(|id| Item::new(id, weights[id as usize % 4]))
                .collect();
            let placement = packer().pack(container, &items).unwrap();
            assert!(count as usize <= packer().min_slot_capacity(container));
            assert_eq!(placement.len(), count as usize);
            assert_eq!(placement.fallback_count(), 0, "{width}x{height} with {count}");
            assert_no_conflicts(&placement, 1);
        }
    }

    #[test]
    fn min_slot_capacity_counts_buffered_grid() {
        // 8px sides, 1px buffer: (80 + 1) / 9 = 9 columns, (60 + 1) / 9 = 6 rows.
        assert_eq!(packer().min_slot_capacity(Container::new(80, 60)), 54);
        assert_eq!(packer().min_slot_capacity(Container::new(20, 20)), 4);
        assert_eq!(packer().min_slot_capacity(Container::new(5, 3)), 1);
    }

    #[test]
    fn scan_positions_end_flush() {
        assert_eq!(scan_positions(10, 4, 4), vec![0, 4, 6]);
        assert_eq!(scan_positions(8, 4, 4), vec![0, 4]);
        assert_eq!(scan_positions(3, 4, 4), Vec::<u16>::new());
    }

    #[test]
    fn top_left_anchors_sit_beside_placed_rects() {
        let placed = [Placed {
            id: ItemId::new(1),
            rect: Rect::new(0, 0, 10, 10),
            strategy: Strategy::TopLeft,
        }];
        let anchors = candidates(
            Strategy::TopLeft,
            Container::new(50, 50),
            (5, 5),
            &placed,
            8,
            1,
        );
        assert_eq!(anchors, vec![(0, 0), (11, 0), (0, 11)]);
    }
}
