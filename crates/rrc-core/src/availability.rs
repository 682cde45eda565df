//! Weekly availability - booked slots and their approval status.

use crate::period::Period;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Status string shown for a confirmed booking.
pub const STATUS_BOOKED: &str = "예약됨";

/// Status string shown for a booking awaiting approval.
pub const STATUS_PENDING: &str = "대기중";

/// Key identifying one bookable slot inside a weekly window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    /// Date label as carried on the wire ("2026-09-01").
    pub date: String,

    /// Day-of-week name ("월", "화", ...).
    pub day: String,

    /// Covered period.
    pub period: Period,
}

impl SlotKey {
    pub fn new(date: &str, day: &str, period: Period) -> Self {
        Self {
            date: date.to_string(),
            day: day.to_string(),
            period,
        }
    }
}

/// Approval status of one booked slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    /// Confirmed by the server ("예약됨").
    Booked,
    /// Submitted but awaiting approval ("대기중").
    Pending,
}

impl SlotStatus {
    /// Parses the status string carried in weekly-view rows.
    /// Unknown strings are treated as pending so they still render
    /// as occupied rather than silently free.
    pub fn from_wire(s: &str) -> Self {
        if s.trim() == STATUS_BOOKED {
            Self::Booked
        } else {
            Self::Pending
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Booked => STATUS_BOOKED,
            Self::Pending => STATUS_PENDING,
        }
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Booked slots for one room over one 7-day window.
///
/// Rebuilt wholesale on every room or date-range change - never patched
/// incrementally, so a stale partial update can't linger in the table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeeklyAvailability {
    /// Normalized room name this window belongs to.
    pub room: String,

    /// First date of the window ("2026-08-31").
    pub week_start: String,

    /// Last date of the window (inclusive).
    pub week_end: String,

    /// Every (date, day, period) already taken.
    booked: HashSet<SlotKey>,

    /// Approval status per taken slot.
    status: HashMap<SlotKey, SlotStatus>,
}

impl WeeklyAvailability {
    /// Creates an empty window for one room.
    pub fn new(room: &str, week_start: &str, week_end: &str) -> Self {
        Self {
            room: room.to_string(),
            week_start: week_start.to_string(),
            week_end: week_end.to_string(),
            booked: HashSet::new(),
            status: HashMap::new(),
        }
    }

    /// Records one taken slot with its status.
    pub fn insert(&mut self, key: SlotKey, status: SlotStatus) {
        self.status.insert(key.clone(), status);
        self.booked.insert(key);
    }

    /// Whether the given slot is already taken.
    pub fn is_booked(&self, key: &SlotKey) -> bool {
        self.booked.contains(key)
    }

    /// Status of a taken slot, if any.
    pub fn status(&self, key: &SlotKey) -> Option<SlotStatus> {
        self.status.get(key).copied()
    }

    /// Number of taken slots in the window.
    pub fn len(&self) -> usize {
        self.booked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.booked.is_empty()
    }

    /// Iterates every taken slot with its status.
    pub fn slots(&self) -> impl Iterator<Item = (&SlotKey, SlotStatus)> {
        self.status.iter().map(|(k, s)| (k, *s))
    }
}
