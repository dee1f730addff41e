#![forbid(unsafe_code)]

//! Weighted rectangle packing with incremental update planning.
//!
//! # Components
//!
//! | module | role |
//! |---|---|
//! | [`cache`] | last rendered rect and state per item |
//! | [`diff`] | classify two snapshots into added/removed/changed/unchanged |
//! | [`packer`] | place weighted items into a container without overlap |
//! | [`region`] | orchestrate diff, pack, and cache into an op list |
//!
//! Dependency order is `cache -> diff -> packer -> region`.

pub mod cache;
pub mod diff;
pub mod packer;
pub mod region;

pub use cache::{ViewCache, ViewCacheEntry, ViewCacheStats};
pub use diff::{DiffResult, diff};
pub use packer::{Packer, Placed, Placement, Strategy, pack};
pub use quadplan_core::{
    AspectBand, ConfigError, Container, ElementRole, InvalidInput, Item, ItemId, OverflowWarning,
    PackConfig, PackError, Rect, RoleSet, Tag,
};
pub use region::{RegionController, RegionId, RegionState, RegionUpdate, UpdateOp};
