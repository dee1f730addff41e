#![forbid(unsafe_code)]

//! Error and warning types shared by the packer and the region controller.

use std::fmt;

use serde::Serialize;

use crate::geometry::Container;
use crate::item::ItemId;

/// Rejected [`PackConfig`](crate::config::PackConfig) values.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    ZeroBaseWeight,
    ZeroMinSide,
    RatioOutOfRange { field: &'static str, value: f64 },
    InvalidAspectBand { index: usize, max_weight: u32, ratio: f64 },
    UnsortedAspectBands { index: usize },
    EnvVar { name: &'static str, value: String },
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroBaseWeight => write!(f, "base weight must be positive"),
            Self::ZeroMinSide => write!(f, "minimum side must be positive"),
            Self::RatioOutOfRange { field, value } => {
                write!(f, "{field} must lie in (0, 1], got {value}")
            }
            Self::InvalidAspectBand {
                index,
                max_weight,
                ratio,
            } => write!(
                f,
                "aspect band {index} (max weight {max_weight}) has invalid ratio {ratio}"
            ),
            Self::UnsortedAspectBands { index } => write!(
                f,
                "aspect band {index} does not increase the max weight of the band before it"
            ),
            Self::EnvVar { name, value } => {
                write!(f, "environment variable {name} has invalid value {value:?}")
            }
            Self::Parse(msg) => write!(f, "invalid pack config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Input rejected at the packing boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidInput {
    EmptyContainer { container: Container },
    ZeroWeight { id: ItemId },
    DuplicateId { id: ItemId },
}

impl fmt::Display for InvalidInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyContainer { container } => write!(
                f,
                "container {}x{} has a zero dimension",
                container.width, container.height
            ),
            Self::ZeroWeight { id } => write!(f, "item {id} has zero weight"),
            Self::DuplicateId { id } => write!(f, "item {id} appears more than once"),
        }
    }
}

impl std::error::Error for InvalidInput {}

/// Fatal packing failure. Nothing is placed when this is returned.
#[derive(Debug, Clone, PartialEq)]
pub enum PackError {
    Config(ConfigError),
    InvalidInput(InvalidInput),
}

impl fmt::Display for PackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::InvalidInput(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for PackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::InvalidInput(err) => Some(err),
        }
    }
}

impl From<ConfigError> for PackError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<InvalidInput> for PackError {
    fn from(err: InvalidInput) -> Self {
        Self::InvalidInput(err)
    }
}

/// Non-fatal signal: the items ask for more than the container holds.
///
/// Packing still places every item; callers may surface this to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OverflowWarning {
    /// Sum of all item weights.
    pub total_weight: u64,
    /// Weight that corresponds to a full container.
    pub capacity: u32,
}

impl OverflowWarning {
    /// Requested load as a percentage of capacity.
    #[must_use]
    pub fn load_percent(&self) -> u64 {
        self.total_weight * 100 / u64::from(self.capacity.max(1))
    }
}

impl fmt::Display for OverflowWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "requested weight {} exceeds capacity {} ({}%)",
            self.total_weight,
            self.capacity,
            self.load_percent()
        )
    }
}
