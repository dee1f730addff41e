#![forbid(unsafe_code)]

//! Packable items and their state fingerprints.

use std::fmt;
use std::hash::{Hash, Hasher};

use bitflags::bitflags;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

/// Stable identity of a packed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ItemId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Sub-element of a rendered item that can be redrawn independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementRole {
    Title,
    Info,
    Indicator,
}

impl ElementRole {
    /// Every role, in drawing order.
    pub const ALL: [ElementRole; 3] = [Self::Title, Self::Info, Self::Indicator];

    const fn index(self) -> usize {
        match self {
            Self::Title => 0,
            Self::Info => 1,
            Self::Indicator => 2,
        }
    }
}

bitflags! {
    /// Set of element roles carried by an update operation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RoleSet: u8 {
        const TITLE = 1 << 0;
        const INFO = 1 << 1;
        const INDICATOR = 1 << 2;
    }
}

impl RoleSet {
    /// Iterate the contained roles in drawing order.
    pub fn roles(self) -> impl Iterator<Item = ElementRole> {
        ElementRole::ALL
            .into_iter()
            .filter(move |role| self.contains(RoleSet::from(*role)))
    }
}

impl From<ElementRole> for RoleSet {
    fn from(role: ElementRole) -> Self {
        match role {
            ElementRole::Title => Self::TITLE,
            ElementRole::Info => Self::INFO,
            ElementRole::Indicator => Self::INDICATOR,
        }
    }
}

impl Serialize for RoleSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.roles())
    }
}

/// Opaque fingerprint of an item's non-geometric state.
///
/// Holds one fingerprint per [`ElementRole`], so a changed tag resolves to
/// the roles that need redrawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Tag {
    parts: [u64; 3],
}

impl Tag {
    /// A tag with every role fingerprint set to zero.
    #[must_use]
    pub const fn empty() -> Self {
        Self { parts: [0; 3] }
    }

    /// Builder: fingerprint `value` under `role`.
    #[must_use]
    pub fn with<T: Hash + ?Sized>(mut self, role: ElementRole, value: &T) -> Self {
        let mut hasher = FxHasher::default();
        value.hash(&mut hasher);
        self.parts[role.index()] = hasher.finish();
        self
    }

    /// Builder: store a precomputed fingerprint under `role`.
    #[must_use]
    pub fn with_raw(mut self, role: ElementRole, fingerprint: u64) -> Self {
        self.parts[role.index()] = fingerprint;
        self
    }

    /// Fingerprint stored for `role`.
    #[must_use]
    pub const fn part(&self, role: ElementRole) -> u64 {
        self.parts[role.index()]
    }

    /// Roles whose fingerprints differ between `self` and `other`.
    #[must_use]
    pub fn changed_roles(&self, other: &Tag) -> RoleSet {
        ElementRole::ALL
            .into_iter()
            .filter(|role| self.part(*role) != other.part(*role))
            .fold(RoleSet::empty(), |set, role| set | RoleSet::from(role))
    }
}

/// The unit being packed: an identity, an area-driving weight, a rank for
/// tie-breaks, and a state fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    /// Drives the target area. Must be positive.
    pub weight: u32,
    /// Higher ranks are placed earlier among equal weights.
    #[serde(default)]
    pub rank: i32,
    #[serde(default)]
    pub tag: Tag,
}

impl Item {
    /// Create an item with rank 0 and an empty tag.
    #[must_use]
    pub fn new(id: impl Into<ItemId>, weight: u32) -> Self {
        Self {
            id: id.into(),
            weight,
            rank: 0,
            tag: Tag::empty(),
        }
    }

    /// Set the rank.
    #[must_use]
    pub fn rank(mut self, rank: i32) -> Self {
        self.rank = rank;
        self
    }

    /// Set the tag.
    #[must_use]
    pub fn tag(mut self, tag: Tag) -> Self {
        self.tag = tag;
        self
    }

    /// True when weight or rank differ, i.e. packing output may differ.
    #[must_use]
    pub fn geometry_differs(&self, other: &Item) -> bool {
        self.weight != other.weight || self.rank != other.rank
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_changed_roles_isolates_parts() {
        let base = Tag::empty()
            .with(ElementRole::Title, "write report")
            .with(ElementRole::Info, &30u32);
        let retitled = base.with(ElementRole::Title, "write summary");

        assert_eq!(base.changed_roles(&base), RoleSet::empty());
        assert_eq!(base.changed_roles(&retitled), RoleSet::TITLE);

        let both = retitled.with(ElementRole::Indicator, &true);
        assert_eq!(
            base.changed_roles(&both),
            RoleSet::TITLE | RoleSet::INDICATOR
        );
    }

    #[test]
    fn tag_fingerprints_are_deterministic() {
        let a = Tag::empty().with(ElementRole::Title, "same");
        let b = Tag::empty().with(ElementRole::Title, "same");
        assert_eq!(a, b);
        assert_ne!(a.part(ElementRole::Title), 0);
    }

    #[test]
    fn role_set_iterates_in_drawing_order() {
        let set = RoleSet::INDICATOR | RoleSet::TITLE;
        let roles: Vec<_> = set.roles().collect();
        assert_eq!(roles, vec![ElementRole::Title, ElementRole::Indicator]);
        assert_eq!(RoleSet::all().roles().count(), 3);
    }

    #[test]
    fn geometry_differs_ignores_tag() {
        let a = Item::new(1, 30).tag(Tag::empty().with_raw(ElementRole::Info, 7));
        let b = Item::new(1, 30);
        assert!(!a.geometry_differs(&b));
        assert!(a.geometry_differs(&b.rank(2)));
        assert!(a.geometry_differs(&Item::new(1, 60)));
    }

    #[test]
    fn item_id_display() {
        assert_eq!(ItemId::new(42).to_string(), "#42");
    }
}
