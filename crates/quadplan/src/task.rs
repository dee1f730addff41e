#![forbid(unsafe_code)]

//! Planner tasks and the elements drawn for them.
//!
//! A [`TaskRecord`] converts into a packable [`Item`]: its duration drives
//! the weight, its importance breaks ties, and each drawn element gets its
//! own tag fingerprint so edits redraw only what they touch.

use std::fmt;

use quadplan_core::{ElementRole, Item, Tag};
use serde::{Deserialize, Serialize};

use crate::{PlannerError, Result};

/// Minutes assumed for a task without an explicit duration.
pub const DEFAULT_DURATION: u32 = 30;

/// Title characters shown before truncation.
pub const TITLE_LIMIT: usize = 20;

const LEVELS: std::ops::RangeInclusive<u8> = 1..=10;

/// Why a task was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskDefect {
    NonPositiveDuration(i64),
    DurationTooLong(i64),
    LevelOutOfRange { field: &'static str, value: u8 },
}

impl fmt::Display for TaskDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveDuration(minutes) => {
                write!(f, "duration must be positive, got {minutes}")
            }
            Self::DurationTooLong(minutes) => write!(f, "duration {minutes} is too long"),
            Self::LevelOutOfRange { field, value } => {
                write!(f, "{field} must lie in 1..=10, got {value}")
            }
        }
    }
}

fn default_level() -> u8 {
    5
}

/// A task as stored by the planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: u64,
    pub title: String,
    /// Minutes; only meaningful when `has_duration` is set.
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub has_duration: bool,
    #[serde(default = "default_level")]
    pub priority: u8,
    #[serde(default = "default_level")]
    pub importance: u8,
    #[serde(default)]
    pub is_completed: bool,
}

impl TaskRecord {
    /// Open task without a duration, priority and importance 5.
    #[must_use]
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            duration: 0,
            has_duration: false,
            priority: default_level(),
            importance: default_level(),
            is_completed: false,
        }
    }

    /// Builder: set an explicit duration in minutes.
    #[must_use]
    pub fn duration(mut self, minutes: i64) -> Self {
        self.duration = minutes;
        self.has_duration = true;
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn importance(mut self, importance: u8) -> Self {
        self.importance = importance;
        self
    }

    #[must_use]
    pub fn completed(mut self, done: bool) -> Self {
        self.is_completed = done;
        self
    }

    /// Minutes this task occupies, [`DEFAULT_DURATION`] when unset.
    pub fn minutes(&self) -> Result<u32> {
        if !self.has_duration {
            return Ok(DEFAULT_DURATION);
        }
        if self.duration <= 0 {
            return Err(self.defect(TaskDefect::NonPositiveDuration(self.duration)));
        }
        u32::try_from(self.duration)
            .map_err(|_| self.defect(TaskDefect::DurationTooLong(self.duration)))
    }

    /// Fingerprints per drawn element.
    #[must_use]
    pub fn tag(&self) -> Tag {
        Tag::empty()
            .with(ElementRole::Title, &(self.title.as_str(), self.is_completed))
            .with(ElementRole::Info, &(self.has_duration, self.duration))
            .with(ElementRole::Indicator, &(self.priority, self.is_completed))
    }

    /// Convert to a packable item.
    pub fn to_item(&self) -> Result<Item> {
        for (field, value) in [("priority", self.priority), ("importance", self.importance)] {
            if !LEVELS.contains(&value) {
                return Err(self.defect(TaskDefect::LevelOutOfRange { field, value }));
            }
        }
        Ok(Item::new(self.id, self.minutes()?)
            .rank(i32::from(self.importance))
            .tag(self.tag()))
    }

    /// Title as displayed: truncated, and check-marked when done.
    #[must_use]
    pub fn display_title(&self) -> String {
        let mut text: String = self.title.chars().take(TITLE_LIMIT).collect();
        if self.title.chars().count() > TITLE_LIMIT {
            text.push_str("...");
        }
        if self.is_completed {
            text.insert_str(0, "✓ ");
        }
        text
    }

    fn defect(&self, defect: TaskDefect) -> PlannerError {
        PlannerError::InvalidTask {
            id: self.id,
            defect,
        }
    }
}

impl TryFrom<&TaskRecord> for Item {
    type Error = PlannerError;

    fn try_from(task: &TaskRecord) -> Result<Self> {
        task.to_item()
    }
}

/// Status marker drawn in a task's corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    Completed,
    Priority(u8),
}

/// Resolved content of one drawn element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", content = "value", rename_all = "snake_case")]
pub enum Element {
    Title(String),
    /// Duration label; `None` hides the element.
    Info(Option<String>),
    Indicator(Indicator),
}

impl Element {
    /// Content of `role` for `task`.
    #[must_use]
    pub fn resolve(task: &TaskRecord, role: ElementRole) -> Self {
        match role {
            ElementRole::Title => Self::Title(task.display_title()),
            ElementRole::Info => {
                Self::Info(task.has_duration.then(|| format!("{}m", task.duration)))
            }
            ElementRole::Indicator => Self::Indicator(if task.is_completed {
                Indicator::Completed
            } else {
                Indicator::Priority(task.priority)
            }),
        }
    }

    #[must_use]
    pub fn role(&self) -> ElementRole {
        match self {
            Self::Title(_) => ElementRole::Title,
            Self::Info(_) => ElementRole::Info,
            Self::Indicator(_) => ElementRole::Indicator,
        }
    }
}
