//! Server-pushed notifications.
//!
//! Notifications are unsolicited: they are never a reply to anything and
//! must never be handed to a caller waiting on a synchronous exchange.
//! The dispatcher classifies each incoming line by [`NOTIFICATION_PREFIX`]
//! before reply correlation even looks at it.

use rrc_core::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix (including the field separator) marking a pushed line.
pub const NOTIFICATION_PREFIX: &str = "NOTIFICATION,";

/// What happened to a reservation the user owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Approved,
    Rejected,
    ChangeApproved,
    ChangeRejected,
    Cancelled,
}

impl NotificationKind {
    fn from_wire(token: &str) -> DomainResult<Self> {
        match token.trim() {
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            "CHANGE_APPROVED" => Ok(Self::ChangeApproved),
            "CHANGE_REJECTED" => Ok(Self::ChangeRejected),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(DomainError::ParseError {
                field: "notification type".to_string(),
                reason: format!("unknown token: {other}"),
            }),
        }
    }

    pub fn wire_token(&self) -> &'static str {
        match self {
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::ChangeApproved => "CHANGE_APPROVED",
            Self::ChangeRejected => "CHANGE_REJECTED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_token())
    }
}

/// A parsed push message.
///
/// Wire shape: `NOTIFICATION,<type>,<message>,<room>,<date>,<day>,<time>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub room: String,
    pub date: String,
    pub day: String,
    pub time: String,
}

impl Notification {
    /// Whether a raw line is a notification at all.
    pub fn is_notification_line(line: &str) -> bool {
        line.trim_start().starts_with(NOTIFICATION_PREFIX)
    }

    /// Parses a notification line.
    ///
    /// Fails on lines without the prefix, with an unknown type token, or
    /// with missing fields; the dispatcher logs and drops those.
    pub fn parse(line: &str) -> DomainResult<Self> {
        let trimmed = line.trim();
        let rest = trimmed
            .strip_prefix(NOTIFICATION_PREFIX)
            .ok_or_else(|| DomainError::ParseError {
                field: "notification".to_string(),
                reason: "missing NOTIFICATION prefix".to_string(),
            })?;

        // The message field may itself contain commas, so split off the
        // fixed fields from both ends: type first, then room/date/day/time
        // from the tail.
        let (kind_token, tail) = rest.split_once(',').ok_or_else(|| DomainError::ParseError {
            field: "notification".to_string(),
            reason: "missing type field".to_string(),
        })?;
        let kind = NotificationKind::from_wire(kind_token)?;

        let fields: Vec<&str> = tail.rsplitn(5, ',').collect();
        let [time, day, date, room, message] = fields.as_slice() else {
            return Err(DomainError::ParseError {
                field: "notification".to_string(),
                reason: format!("expected 6 fields, got {}", fields.len() + 1),
            });
        };

        Ok(Self {
            kind,
            message: message.to_string(),
            room: room.to_string(),
            date: date.to_string(),
            day: day.to_string(),
            time: time.to_string(),
        })
    }
}
