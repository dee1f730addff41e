#![forbid(unsafe_code)]

//! Core: geometry, packable items, configuration, and error types.
//!
//! # Role in quadplan
//! `quadplan-core` is the vocabulary shared by the packer, the diff engine,
//! and the region controller in `quadplan-layout`. It holds no algorithms
//! beyond rectangle arithmetic and fingerprinting.

pub mod config;
pub mod error;
pub mod geometry;
pub mod item;

pub use config::{AspectBand, PackConfig};
pub use error::{ConfigError, InvalidInput, OverflowWarning, PackError};
pub use geometry::{Container, Rect};
pub use item::{ElementRole, Item, ItemId, RoleSet, Tag};
