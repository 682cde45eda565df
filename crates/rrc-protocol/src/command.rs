//! Outbound commands and their wire encoding.

use rrc_core::{normalize_room_name, Period, ReservationData};
use serde::{Deserialize, Serialize};

/// One new slot inside a `CHANGE_RESERVATION_FULL` command.
///
/// Targets are encoded pipe-separated and joined with `;` when a change
/// moves a booking onto several periods at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeTarget {
    pub room: String,
    pub date: String,
    pub day: String,
    pub period: Period,
    pub purpose: String,
    pub role: String,
    pub count: u32,
}

impl ChangeTarget {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        room: &str,
        date: &str,
        day: &str,
        period: Period,
        purpose: &str,
        role: &str,
        count: u32,
    ) -> Self {
        Self {
            room: normalize_room_name(room),
            date: date.to_string(),
            day: day.to_string(),
            period,
            purpose: purpose.to_string(),
            role: role.to_string(),
            count,
        }
    }

    fn encode(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}|{}",
            self.room,
            self.date,
            self.day,
            self.period.number(),
            self.purpose,
            self.role,
            self.count
        )
    }
}

/// Commands sent from the client to the reservation server.
///
/// `encode()` produces the comma-separated line without the trailing
/// newline; the dispatcher appends the terminator when writing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Ask whether a room currently accepts reservations at all.
    CheckRoomStatus { room: String },

    /// Book one period of one room.
    ReserveRequest {
        name: String,
        room: String,
        date: String,
        day: String,
        period: Period,
        purpose: String,
        role: String,
        count: u32,
    },

    /// Stream every taken slot of a room inside a 7-day window.
    ViewWeeklyReservation {
        room: String,
        week_start: String,
        week_end: String,
    },

    /// Count reservations already placed on one slot.
    GetReservedCountByDate {
        room: String,
        date: String,
        period: Period,
    },

    /// Move an existing booking onto one or more new slots.
    ChangeReservationFull {
        old_kind: String,
        new_kind: String,
        user_id: String,
        name: String,
        old_room: String,
        old_date: String,
        old_day: String,
        old_period: Period,
        targets: Vec<ChangeTarget>,
    },

    /// Cancel one booked period.
    CancelReservation {
        requester_id: String,
        user_id: String,
        day: String,
        date: String,
        period: Period,
        room: String,
        name: String,
    },

    /// Fetch the lecture-room list.
    GetClassrooms,

    /// Fetch the lab list.
    GetLabs,
}

impl Command {
    /// Creates a room-status check, normalizing the room name.
    pub fn check_room_status(room: &str) -> Self {
        Self::CheckRoomStatus {
            room: normalize_room_name(room),
        }
    }

    /// Creates one per-period reserve request out of a booking attempt.
    pub fn reserve_request(data: &ReservationData, period: Period) -> Self {
        Self::ReserveRequest {
            name: data.user_name.clone(),
            room: data.room.clone(),
            date: data.date_label.clone(),
            day: data.day.clone(),
            period,
            purpose: data.purpose.clone(),
            role: data.role.clone(),
            count: data.headcount,
        }
    }

    /// Creates a weekly-view query for one room and window.
    pub fn view_weekly_reservation(room: &str, week_start: &str, week_end: &str) -> Self {
        Self::ViewWeeklyReservation {
            room: normalize_room_name(room),
            week_start: week_start.to_string(),
            week_end: week_end.to_string(),
        }
    }

    /// Creates a reserved-count query for one slot.
    pub fn reserved_count(room: &str, date: &str, period: Period) -> Self {
        Self::GetReservedCountByDate {
            room: normalize_room_name(room),
            date: date.to_string(),
            period,
        }
    }

    /// Creates a cancel request for one booked period.
    #[allow(clippy::too_many_arguments)]
    pub fn cancel_reservation(
        requester_id: &str,
        user_id: &str,
        day: &str,
        date: &str,
        period: Period,
        room: &str,
        name: &str,
    ) -> Self {
        Self::CancelReservation {
            requester_id: requester_id.to_string(),
            user_id: user_id.to_string(),
            day: day.to_string(),
            date: date.to_string(),
            period,
            room: normalize_room_name(room),
            name: name.to_string(),
        }
    }

    /// Encodes the command as one wire line (no trailing newline).
    pub fn encode(&self) -> String {
        match self {
            Self::CheckRoomStatus { room } => format!("CHECK_ROOM_STATUS,{room}"),
            Self::ReserveRequest {
                name,
                room,
                date,
                day,
                period,
                purpose,
                role,
                count,
            } => format!(
                "RESERVE_REQUEST,{name},{room},{date},{day},{},{purpose},{role},{count}",
                period.number()
            ),
            Self::ViewWeeklyReservation {
                room,
                week_start,
                week_end,
            } => format!("VIEW_WEEKLY_RESERVATION,{room},{week_start},{week_end}"),
            Self::GetReservedCountByDate { room, date, period } => {
                format!("GET_RESERVED_COUNT_BY_DATE,{room},{date},{}", period.number())
            }
            Self::ChangeReservationFull {
                old_kind,
                new_kind,
                user_id,
                name,
                old_room,
                old_date,
                old_day,
                old_period,
                targets,
            } => {
                let encoded_targets: Vec<String> =
                    targets.iter().map(ChangeTarget::encode).collect();
                format!(
                    "CHANGE_RESERVATION_FULL,{old_kind},{new_kind},{user_id},{name},{old_room},{old_date},{old_day},{},{}",
                    old_period.number(),
                    encoded_targets.join(";")
                )
            }
            Self::CancelReservation {
                requester_id,
                user_id,
                day,
                date,
                period,
                room,
                name,
            } => format!(
                "CANCEL_RESERVATION,{requester_id},{user_id},{day},{date},{},{room},{name}",
                period.number()
            ),
            Self::GetClassrooms => "GET_CLASSROOMS".to_string(),
            Self::GetLabs => "GET_LABS".to_string(),
        }
    }

    /// Short command name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CheckRoomStatus { .. } => "CHECK_ROOM_STATUS",
            Self::ReserveRequest { .. } => "RESERVE_REQUEST",
            Self::ViewWeeklyReservation { .. } => "VIEW_WEEKLY_RESERVATION",
            Self::GetReservedCountByDate { .. } => "GET_RESERVED_COUNT_BY_DATE",
            Self::ChangeReservationFull { .. } => "CHANGE_RESERVATION_FULL",
            Self::CancelReservation { .. } => "CANCEL_RESERVATION",
            Self::GetClassrooms => "GET_CLASSROOMS",
            Self::GetLabs => "GET_LABS",
        }
    }
}
