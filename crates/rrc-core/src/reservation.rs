//! Reservation value objects and user identity.

use crate::period::Period;
use crate::room::normalize_room_name;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Role token subject to the shorter booking-duration ceiling.
///
/// Comparison is exact-match against this literal, not case-insensitive.
pub const STUDENT_ROLE: &str = "student";

/// Identity of the logged-in user, supplied by the login/session holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Server-side user id.
    pub user_id: String,

    /// Display name sent with reservation requests.
    pub display_name: String,

    /// Role token ("student", "professor", ...).
    pub role: String,
}

impl UserIdentity {
    pub fn new(user_id: &str, display_name: &str, role: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            display_name: display_name.to_string(),
            role: role.to_string(),
        }
    }

    /// Whether this user is subject to the student duration ceiling.
    pub fn is_student(&self) -> bool {
        self.role == STUDENT_ROLE
    }
}

/// One booking attempt, immutable once constructed.
///
/// Collected from the view's typed getters at the start of a workflow run
/// and carried unchanged through validation and submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationData {
    /// Date label exactly as selected in the view ("2026-09-01").
    pub date_label: String,

    /// Parsed calendar date.
    pub date: NaiveDate,

    /// Name of the requesting user.
    pub user_name: String,

    /// Normalized room name.
    pub room: String,

    /// Day-of-week name as shown in the weekly table ("월", "화", ...).
    pub day: String,

    /// First covered period.
    pub start: Period,

    /// Last covered period (inclusive).
    pub end: Period,

    /// Stated purpose of the booking.
    pub purpose: String,

    /// Number of people attending.
    pub headcount: u32,

    /// Role token of the requester.
    pub role: String,
}

impl ReservationData {
    /// Constructs a reservation attempt, normalizing the room name.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        date_label: &str,
        date: NaiveDate,
        user_name: &str,
        room: &str,
        day: &str,
        start: Period,
        end: Period,
        purpose: &str,
        headcount: u32,
        role: &str,
    ) -> Self {
        Self {
            date_label: date_label.to_string(),
            date,
            user_name: user_name.to_string(),
            room: normalize_room_name(room),
            day: day.to_string(),
            start,
            end,
            purpose: purpose.to_string(),
            headcount,
            role: role.to_string(),
        }
    }

    /// Duration of the attempt in hours (periods covered).
    pub fn duration(&self) -> u8 {
        Period::duration(self.start, self.end)
    }

    /// Every period covered by this attempt, in booking order.
    pub fn periods(&self) -> impl Iterator<Item = Period> {
        Period::range(self.start, self.end)
    }
}
