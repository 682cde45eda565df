//! Room records and room-name normalization.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Localized room suffix appended to every room name before it is sent
/// on the wire or used as a cache key ("301" becomes "301호").
pub const ROOM_SUFFIX: &str = "호";

/// Kind of bookable room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    /// Lecture room
    Lecture,
    /// Laboratory
    Lab,
}

impl RoomKind {
    /// Wire token used in room-list replies.
    pub fn wire_token(&self) -> &'static str {
        match self {
            Self::Lecture => "LECTURE",
            Self::Lab => "LAB",
        }
    }

    /// Parses a wire token. Unknown tokens are treated as lecture rooms
    /// so a room list with a new kind still loads.
    pub fn from_wire_token(token: &str) -> Self {
        match token.trim() {
            "LAB" => Self::Lab,
            _ => Self::Lecture,
        }
    }

    /// Human-readable kind name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Lecture => "강의실",
            Self::Lab => "실습실",
        }
    }
}

impl fmt::Display for RoomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Normalizes a room name so it always carries the localized suffix.
///
/// Inputs already ending in the suffix pass through unchanged; anything
/// else gets the suffix appended. Cache keys and wire fields always use
/// the normalized form.
pub fn normalize_room_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.ends_with(ROOM_SUFFIX) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{ROOM_SUFFIX}")
    }
}

/// Metadata for one bookable room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    /// Normalized room name (always ends with [`ROOM_SUFFIX`]).
    pub name: String,

    /// Lecture room or lab.
    pub kind: RoomKind,

    /// Raw seating capacity as reported by the server.
    pub capacity: u32,
}

impl RoomRecord {
    /// Creates a record, normalizing the room name.
    pub fn new(name: &str, kind: RoomKind, capacity: u32) -> Self {
        Self {
            name: normalize_room_name(name),
            kind,
            capacity,
        }
    }

    /// The capacity actually enforced on bookings: half the raw
    /// capacity, rounded down.
    pub fn allowed_capacity(&self) -> u32 {
        self.capacity / 2
    }

    /// Whether a booking of `headcount` people fits this room.
    pub fn fits(&self, headcount: u32) -> bool {
        headcount <= self.allowed_capacity()
    }
}
