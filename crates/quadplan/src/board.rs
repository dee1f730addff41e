#![forbid(unsafe_code)]

//! Four-quadrant planner board.
//!
//! Each quadrant is an independent region with its own container and
//! [`RegionController`]. Applying a quadrant's task list yields the render
//! ops for that quadrant only; the other three are untouched.
//!
//! Quadrant `n` covers the three hours starting at `day_start + 3h * (n - 1)`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use quadplan_core::{Container, Item, ItemId, OverflowWarning, PackConfig, Rect, RoleSet};
use quadplan_layout::packer::validate;
use quadplan_layout::{RegionController, RegionId, UpdateOp};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::task::{Element, TaskRecord};
use crate::{PlannerError, Result};

#[cfg(feature = "tracing")]
use tracing::debug;

/// Container used for every quadrant unless resized.
pub const DEFAULT_QUADRANT: Container = Container::new(400, 300);

const SLOT_MINUTES: u32 = 3 * 60;
const DAY_MINUTES: u32 = 24 * 60;

// ============================================================================
// Quadrants and time slots
// ============================================================================

/// One of the four board quadrants, numbered `1..=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct QuadrantId(u8);

impl QuadrantId {
    pub const ALL: [QuadrantId; 4] = [Self(1), Self(2), Self(3), Self(4)];

    pub fn new(n: u8) -> Result<Self> {
        if (1..=4).contains(&n) {
            Ok(Self(n))
        } else {
            Err(PlannerError::UnknownQuadrant(n))
        }
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn region(self) -> RegionId {
        RegionId(self.0)
    }

    const fn index(self) -> usize {
        self.0 as usize - 1
    }
}

impl TryFrom<u8> for QuadrantId {
    type Error = PlannerError;

    fn try_from(n: u8) -> Result<Self> {
        Self::new(n)
    }
}

impl From<QuadrantId> for u8 {
    fn from(id: QuadrantId) -> Self {
        id.0
    }
}

impl fmt::Display for QuadrantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.0)
    }
}

/// Wall-clock time with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Result<Self> {
        if hour < 24 && minute < 60 {
            Ok(Self { hour, minute })
        } else {
            Err(PlannerError::InvalidTime(format!("{hour}:{minute:02}")))
        }
    }

    #[must_use]
    pub const fn hour(self) -> u8 {
        self.hour
    }

    #[must_use]
    pub const fn minute(self) -> u8 {
        self.minute
    }

    /// Shift forward, wrapping past midnight.
    #[must_use]
    pub fn plus_minutes(self, minutes: u32) -> Self {
        let total = (u32::from(self.hour) * 60 + u32::from(self.minute) + minutes) % DAY_MINUTES;
        Self {
            hour: (total / 60) as u8,
            minute: (total % 60) as u8,
        }
    }
}

impl Default for TimeOfDay {
    fn default() -> Self {
        Self { hour: 9, minute: 0 }
    }
}

impl FromStr for TimeOfDay {
    type Err = PlannerError;

    /// Accepts `H:MM`, `HH:MM`, or a bare `HH`.
    fn from_str(input: &str) -> Result<Self> {
        let invalid = || PlannerError::InvalidTime(input.to_string());
        let trimmed = input.trim();
        let (hour, minute) = match trimmed.split_once(':') {
            Some((hour, minute)) if minute.len() == 2 => (hour, minute),
            Some(_) => return Err(invalid()),
            None => (trimmed, "00"),
        };
        let digits =
            |s: &str| (1..=2).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit());
        if !digits(hour) || !digits(minute) {
            return Err(invalid());
        }
        let hour = hour.parse::<u8>().map_err(|_| invalid())?;
        let minute = minute.parse::<u8>().map_err(|_| invalid())?;
        Self::new(hour, minute).map_err(|_| invalid())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Maps quadrants to consecutive three-hour slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeSlots {
    pub day_start: TimeOfDay,
}

impl TimeSlots {
    #[must_use]
    pub fn new(day_start: TimeOfDay) -> Self {
        Self { day_start }
    }

    #[must_use]
    pub fn start_of(&self, quadrant: QuadrantId) -> TimeOfDay {
        self.day_start
            .plus_minutes(SLOT_MINUTES * u32::from(quadrant.get() - 1))
    }

    /// Header label; the last quadrant shows its full range.
    #[must_use]
    pub fn label(&self, quadrant: QuadrantId) -> String {
        let start = self.start_of(quadrant);
        if quadrant == QuadrantId(4) {
            format!("{start} - {}", start.plus_minutes(SLOT_MINUTES))
        } else {
            start.to_string()
        }
    }
}

// ============================================================================
// Updates
// ============================================================================

/// Task count and booked time of one quadrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Summary {
    pub count: usize,
    pub total_minutes: u64,
    /// Booked time exceeds the quadrant's capacity.
    pub overloaded: bool,
}

impl Summary {
    #[must_use]
    pub fn of(items: &[Item], capacity: u32) -> Self {
        let total_minutes: u64 = items.iter().map(|item| u64::from(item.weight)).sum();
        Self {
            count: items.len(),
            total_minutes,
            overloaded: total_minutes > u64::from(capacity),
        }
    }

    /// `"Tasks: N | Xh Ym"`.
    #[must_use]
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tasks: {} | {}h {}m",
            self.count,
            self.total_minutes / 60,
            self.total_minutes % 60
        )
    }
}

/// Region op with the element content to draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RenderOp {
    Create {
        id: ItemId,
        rect: Rect,
        elements: Vec<Element>,
    },
    Update {
        id: ItemId,
        rect: Rect,
        elements: Vec<Element>,
    },
    Remove {
        id: ItemId,
    },
}

impl RenderOp {
    pub fn id(&self) -> ItemId {
        match self {
            Self::Create { id, .. } | Self::Update { id, .. } | Self::Remove { id } => *id,
        }
    }

    /// Elements carried by `Create`/`Update`; empty for `Remove`.
    pub fn elements(&self) -> &[Element] {
        match self {
            Self::Create { elements, .. } | Self::Update { elements, .. } => elements,
            Self::Remove { .. } => &[],
        }
    }
}

/// Everything the presentation needs to redraw one quadrant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardUpdate {
    pub quadrant: QuadrantId,
    pub ops: Vec<RenderOp>,
    pub summary: Summary,
    pub overflow: Option<OverflowWarning>,
    pub repacked: bool,
}

fn render(op: UpdateOp, tasks: &FxHashMap<ItemId, &TaskRecord>) -> RenderOp {
    let elements = |id: ItemId, roles: RoleSet| -> Vec<Element> {
        tasks
            .get(&id)
            .map(|task| roles.roles().map(|role| Element::resolve(task, role)).collect())
            .unwrap_or_default()
    };
    match op {
        UpdateOp::Create { id, rect, roles } => RenderOp::Create {
            id,
            rect,
            elements: elements(id, roles),
        },
        UpdateOp::Update { id, rect, roles } => RenderOp::Update {
            id,
            rect,
            elements: elements(id, roles),
        },
        UpdateOp::Remove { id } => RenderOp::Remove { id },
    }
}

// ============================================================================
// Board
// ============================================================================

#[derive(Debug)]
struct Quadrant {
    container: Container,
    region: RegionController,
}

/// The four quadrants and their time slots.
#[derive(Debug)]
pub struct Board {
    quadrants: [Quadrant; 4],
    slots: TimeSlots,
}

impl Board {
    /// Board with every quadrant sized [`DEFAULT_QUADRANT`].
    pub fn new(config: PackConfig) -> Result<Self> {
        Self::with_container(config, DEFAULT_QUADRANT)
    }

    pub fn with_container(config: PackConfig, container: Container) -> Result<Self> {
        config.validate()?;
        let quadrant = |id: QuadrantId| -> Result<Quadrant> {
            Ok(Quadrant {
                container,
                region: RegionController::new(id.region(), config.clone())?,
            })
        };
        let [q1, q2, q3, q4] = QuadrantId::ALL;
        Ok(Self {
            quadrants: [quadrant(q1)?, quadrant(q2)?, quadrant(q3)?, quadrant(q4)?],
            slots: TimeSlots::default(),
        })
    }

    /// Board configured from `QUADPLAN_*` environment overrides.
    pub fn from_env() -> Result<Self> {
        Self::new(PackConfig::from_env()?)
    }

    pub fn slots(&self) -> &TimeSlots {
        &self.slots
    }

    pub fn set_day_start(&mut self, day_start: TimeOfDay) {
        self.slots = TimeSlots::new(day_start);
    }

    pub fn time_label(&self, quadrant: QuadrantId) -> String {
        self.slots.label(quadrant)
    }

    pub fn container(&self, quadrant: QuadrantId) -> Container {
        self.quadrants[quadrant.index()].container
    }

    pub fn region(&self, quadrant: QuadrantId) -> &RegionController {
        &self.quadrants[quadrant.index()].region
    }

    /// Change the container used by the next apply of `quadrant`.
    pub fn resize(&mut self, quadrant: QuadrantId, container: Container) -> Result<()> {
        if container.is_empty() {
            return Err(quadplan_core::InvalidInput::EmptyContainer { container }.into());
        }
        self.quadrants[quadrant.index()].container = container;
        Ok(())
    }

    /// Forget every rendered element on every quadrant.
    pub fn reset(&mut self) {
        for quadrant in &mut self.quadrants {
            quadrant.region.reset();
        }
    }

    /// Bring `quadrant` in sync with `tasks`.
    pub fn apply(&mut self, quadrant: QuadrantId, tasks: &[TaskRecord]) -> Result<BoardUpdate> {
        let items = to_items(tasks)?;
        self.apply_items(quadrant, tasks, &items)
    }

    /// Apply a snapshot of the whole board; absent quadrants are emptied.
    ///
    /// Every quadrant is validated before any is applied, so an error leaves
    /// the board unchanged.
    pub fn apply_all(
        &mut self,
        snapshot: &BTreeMap<QuadrantId, Vec<TaskRecord>>,
    ) -> Result<Vec<BoardUpdate>> {
        let mut prepared = Vec::with_capacity(QuadrantId::ALL.len());
        for quadrant in QuadrantId::ALL {
            let tasks = snapshot.get(&quadrant).map(Vec::as_slice).unwrap_or(&[]);
            let items = to_items(tasks)?;
            validate(self.container(quadrant), &items)?;
            prepared.push((quadrant, tasks, items));
        }
        prepared
            .into_iter()
            .map(|(quadrant, tasks, items)| self.apply_items(quadrant, tasks, &items))
            .collect()
    }

    fn apply_items(
        &mut self,
        quadrant: QuadrantId,
        tasks: &[TaskRecord],
        items: &[Item],
    ) -> Result<BoardUpdate> {
        let slot = &mut self.quadrants[quadrant.index()];
        let update = slot.region.apply(slot.container, items)?;
        let summary = Summary::of(items, slot.region.config().base_weight);

        #[cfg(feature = "tracing")]
        debug!(
            quadrant = quadrant.get(),
            ops = update.ops.len(),
            tasks = summary.count,
            minutes = summary.total_minutes,
            overloaded = summary.overloaded,
            "board apply"
        );

        let by_id: FxHashMap<ItemId, &TaskRecord> = tasks
            .iter()
            .map(|task| (ItemId::new(task.id), task))
            .collect();
        Ok(BoardUpdate {
            quadrant,
            ops: update.ops.into_iter().map(|op| render(op, &by_id)).collect(),
            summary,
            overflow: update.overflow,
            repacked: update.repacked,
        })
    }
}

fn to_items(tasks: &[TaskRecord]) -> Result<Vec<Item>> {
    tasks.iter().map(TaskRecord::to_item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> Board {
        Board::new(PackConfig::default()).expect("default config is valid")
    }

    fn q(n: u8) -> QuadrantId {
        QuadrantId::new(n).unwrap()
    }

    #[test]
    fn quadrant_ids_are_one_based() {
        assert!(QuadrantId::new(0).is_err());
        assert_eq!(QuadrantId::new(5), Err(PlannerError::UnknownQuadrant(5)));
        assert_eq!(q(3).region(), RegionId(3));
        assert_eq!(q(2).to_string(), "Q2");
    }

    #[test]
    fn time_of_day_parses_common_forms() {
        let at = |h, m| TimeOfDay::new(h, m).unwrap();
        assert_eq!("9:30".parse::<TimeOfDay>().unwrap(), at(9, 30));
        assert_eq!("07:05".parse::<TimeOfDay>().unwrap(), at(7, 5));
        assert_eq!("18".parse::<TimeOfDay>().unwrap(), at(18, 0));
        assert_eq!(at(7, 5).to_string(), "07:05");
        for bad in ["", "25:00", "9:5", "9:60", "ab:cd", "-1", "9:30:00", "123"] {
            assert!(
                matches!(bad.parse::<TimeOfDay>(), Err(PlannerError::InvalidTime(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn time_slots_follow_the_day_start() {
        let slots = TimeSlots::default();
        let labels: Vec<String> = QuadrantId::ALL.iter().map(|id| slots.label(*id)).collect();
        assert_eq!(labels, ["09:00", "12:00", "15:00", "18:00 - 21:00"]);

        let late = TimeSlots::new(TimeOfDay::new(16, 30).unwrap());
        assert_eq!(late.label(q(3)), "22:30");
        assert_eq!(late.label(q(4)), "01:30 - 04:30");
    }

    #[test]
    fn summary_label_and_overload() {
        let items = [Item::new(1, 90), Item::new(2, 65), Item::new(3, 30)];
        let summary = Summary::of(&items, 180);
        assert_eq!(summary.label(), "Tasks: 3 | 3h 5m");
        assert!(summary.overloaded);
        assert!(!Summary::of(&items[..2], 180).overloaded);
        assert_eq!(Summary::of(&[], 180).label(), "Tasks: 0 | 0h 0m");
    }

    #[test]
    fn apply_renders_elements_for_new_tasks() {
        let mut board = board();
        let tasks = [TaskRecord::new(1, "standup").duration(15).priority(2)];
        let update = board.apply(q(1), &tasks).unwrap();

        assert_eq!(update.quadrant, q(1));
        assert_eq!(update.ops.len(), 1);
        let op = &update.ops[0];
        assert!(matches!(op, RenderOp::Create { .. }));
        assert_eq!(
            op.elements(),
            [
                Element::Title("standup".into()),
                Element::Info(Some("15m".into())),
                Element::Indicator(crate::Indicator::Priority(2)),
            ]
        );
        assert_eq!(update.summary.label(), "Tasks: 1 | 0h 15m");
    }

    #[test]
    fn completing_a_task_redraws_title_and_indicator_only() {
        let mut board = board();
        let open = TaskRecord::new(1, "report").duration(60);
        board.apply(q(2), std::slice::from_ref(&open)).unwrap();

        let update = board.apply(q(2), &[open.completed(true)]).unwrap();
        assert!(!update.repacked);
        let roles: Vec<_> = update.ops[0].elements().iter().map(Element::role).collect();
        assert_eq!(
            roles,
            [quadplan_core::ElementRole::Title, quadplan_core::ElementRole::Indicator]
        );
    }

    #[test]
    fn quadrants_are_independent() {
        let mut board = board();
        board.apply(q(1), &[TaskRecord::new(1, "a")]).unwrap();
        let update = board.apply(q(3), &[TaskRecord::new(1, "a")]).unwrap();
        assert!(matches!(update.ops[0], RenderOp::Create { .. }));
        assert_eq!(board.region(q(1)).cache().len(), 1);
        assert!(board.region(q(2)).cache().is_empty());
    }

    #[test]
    fn invalid_task_aborts_before_touching_the_region() {
        let mut board = board();
        let err = board
            .apply(q(1), &[TaskRecord::new(1, "a"), TaskRecord::new(2, "b").duration(0)])
            .unwrap_err();
        assert!(matches!(err, PlannerError::InvalidTask { id: 2, .. }));
        assert!(board.region(q(1)).cache().is_empty());
    }

    #[test]
    fn resize_rejects_empty_containers() {
        let mut board = board();
        assert!(board.resize(q(1), Container::new(0, 10)).is_err());
        board.resize(q(1), Container::new(200, 150)).unwrap();
        assert_eq!(board.container(q(1)), Container::new(200, 150));
        assert_eq!(board.container(q(2)), DEFAULT_QUADRANT);
    }
}
