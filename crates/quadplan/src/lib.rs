#![forbid(unsafe_code)]

//! Quadrant day planner facade.
//!
//! Tasks are grouped into four time quadrants. Each quadrant packs its tasks
//! into weighted rectangles and reports the render operations needed to move
//! the previous frame to the new one. This crate re-exports the packing
//! types and adds the task model, the board, and time slot labels.

use std::fmt;

pub mod board;
pub mod task;

pub use board::{
    Board, BoardUpdate, DEFAULT_QUADRANT, QuadrantId, RenderOp, Summary, TimeOfDay, TimeSlots,
};
pub use task::{DEFAULT_DURATION, Element, Indicator, TITLE_LIMIT, TaskDefect, TaskRecord};

// --- Layout re-exports -----------------------------------------------------

pub use quadplan_layout::{
    AspectBand, ConfigError, Container, ElementRole, InvalidInput, Item, ItemId, OverflowWarning,
    PackConfig, PackError, Placement, Rect, RegionController, RegionId, RegionUpdate, RoleSet, Tag,
    UpdateOp,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for planner operations.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannerError {
    /// Packing or configuration failure.
    Pack(PackError),
    /// A task cannot be turned into a packable item.
    InvalidTask { id: u64, defect: TaskDefect },
    /// A time of day that does not parse.
    InvalidTime(String),
    /// Quadrant number outside `1..=4`.
    UnknownQuadrant(u8),
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pack(err) => write!(f, "{err}"),
            Self::InvalidTask { id, defect } => write!(f, "task {id}: {defect}"),
            Self::InvalidTime(input) => {
                write!(f, "invalid time {input:?}, expected HH:MM")
            }
            Self::UnknownQuadrant(n) => write!(f, "quadrant {n} does not exist (expected 1..=4)"),
        }
    }
}

impl std::error::Error for PlannerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Pack(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PackError> for PlannerError {
    fn from(err: PackError) -> Self {
        Self::Pack(err)
    }
}

impl From<ConfigError> for PlannerError {
    fn from(err: ConfigError) -> Self {
        Self::Pack(PackError::Config(err))
    }
}

impl From<InvalidInput> for PlannerError {
    fn from(err: InvalidInput) -> Self {
        Self::Pack(PackError::InvalidInput(err))
    }
}

/// Standard result type for planner APIs.
pub type Result<T> = std::result::Result<T, PlannerError>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Board, BoardUpdate, Container, Element, PackConfig, PlannerError, QuadrantId, RenderOp,
        Result, Summary, TaskRecord, TimeOfDay,
    };

    pub use crate::{core, layout};
}

pub use quadplan_core as core;
pub use quadplan_layout as layout;
