//! Reply classification for lines read off the shared socket.

use rrc_core::{Period, RoomKind, RoomRecord};
use serde::{Deserialize, Serialize};

/// Parsed payload of a `CLASSROOMS,...` / `LABS,...` reply line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListPayload {
    /// Which list the server sent.
    pub kind: RoomKind,

    /// Successfully parsed rooms. Malformed triples are skipped by the
    /// caller after inspecting `skipped`.
    pub rooms: Vec<RoomRecord>,

    /// Number of malformed triples dropped while parsing.
    pub skipped: usize,
}

/// Every reply line the server can send to a synchronous exchange.
///
/// Parsing is total: a line that matches no known shape classifies as
/// `Other` rather than failing, so an unknown server response is still
/// delivered to the caller that is waiting for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reply {
    /// Room accepts reservations.
    Available,
    /// Room is closed for reservations.
    Unavailable,

    /// One period booked.
    ReserveSuccess,
    /// Slot already taken.
    ReserveConflict,
    /// Headcount over the allowed capacity; the server may name its max.
    CapacityExceeded { max: Option<u32> },
    /// Reservation rejected for any other reason.
    ReserveFailed,

    /// Change applied.
    ChangeSuccess,
    /// Change target slot already taken.
    ChangeFailedConflict { period: Option<Period> },
    /// Original booking to change was not found.
    ChangeFailedNotFound,

    /// Cancellation applied.
    CancelSuccess,
    /// Booking to cancel was not found.
    CancelFailedNotFound,

    /// Reserved-count answer.
    ReservedCount { count: u32 },

    /// Sentinel closing a weekly-view stream.
    EndOfReservation,

    /// Room list (lecture rooms or labs).
    RoomList(RoomListPayload),

    /// Anything else - delivered verbatim.
    Other(String),
}

impl Reply {
    /// Classifies one reply line.
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        match trimmed {
            "AVAILABLE" => return Self::Available,
            "UNAVAILABLE" => return Self::Unavailable,
            "RESERVE_SUCCESS" => return Self::ReserveSuccess,
            "RESERVE_CONFLICT" => return Self::ReserveConflict,
            "RESERVE_FAILED" => return Self::ReserveFailed,
            "CHANGE_SUCCESS" => return Self::ChangeSuccess,
            "CHANGE_FAILED_NOT_FOUND" => return Self::ChangeFailedNotFound,
            "CANCEL_SUCCESS" => return Self::CancelSuccess,
            "CANCEL_FAILED_NOT_FOUND" => return Self::CancelFailedNotFound,
            "END_OF_RESERVATION" => return Self::EndOfReservation,
            _ => {}
        }

        if trimmed == "CAPACITY_EXCEEDED" {
            return Self::CapacityExceeded { max: None };
        }
        if let Some(rest) = trimmed.strip_prefix("CAPACITY_EXCEEDED:") {
            return Self::CapacityExceeded {
                max: rest.trim().parse().ok(),
            };
        }
        if let Some(rest) = trimmed.strip_prefix("CHANGE_FAILED_CONFLICT:") {
            let period = rest
                .trim()
                .parse::<u8>()
                .ok()
                .and_then(|n| Period::new(n).ok());
            return Self::ChangeFailedConflict { period };
        }
        if let Some(rest) = trimmed.strip_prefix("RESERVED_COUNT:") {
            if let Ok(count) = rest.trim().parse() {
                return Self::ReservedCount { count };
            }
            return Self::Other(trimmed.to_string());
        }
        if let Some(rest) = trimmed.strip_prefix("CLASSROOMS,") {
            return Self::RoomList(parse_room_list(RoomKind::Lecture, rest));
        }
        if trimmed == "CLASSROOMS" {
            return Self::RoomList(parse_room_list(RoomKind::Lecture, ""));
        }
        if let Some(rest) = trimmed.strip_prefix("LABS,") {
            return Self::RoomList(parse_room_list(RoomKind::Lab, rest));
        }
        if trimmed == "LABS" {
            return Self::RoomList(parse_room_list(RoomKind::Lab, ""));
        }

        Self::Other(trimmed.to_string())
    }

    /// Whether this reply belongs to the reservation-success family.
    ///
    /// Used by the room-status check to spot a stray leftover reply from
    /// a prior exchange (the documented one-retry workaround).
    pub fn is_stray_success(&self) -> bool {
        matches!(self, Self::ReserveSuccess)
            || matches!(self, Self::Other(s) if s == "SUCCESS")
    }
}

/// Parses the repeated `name,kind,capacity` triples of a room-list line.
///
/// A triple with a non-numeric capacity or missing fields is counted and
/// skipped; the rest of the line keeps loading.
fn parse_room_list(kind: RoomKind, rest: &str) -> RoomListPayload {
    let mut rooms = Vec::new();
    let mut skipped = 0;

    if !rest.trim().is_empty() {
        let fields: Vec<&str> = rest.split(',').collect();
        for triple in fields.chunks(3) {
            match triple {
                [name, kind_token, capacity] => match capacity.trim().parse::<u32>() {
                    Ok(capacity) => {
                        rooms.push(RoomRecord::new(
                            name,
                            RoomKind::from_wire_token(kind_token),
                            capacity,
                        ));
                    }
                    Err(_) => skipped += 1,
                },
                _ => skipped += 1,
            }
        }
    }

    RoomListPayload {
        kind,
        rooms,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_tokens() {
        assert_eq!(Reply::parse("AVAILABLE"), Reply::Available);
        assert_eq!(Reply::parse("UNAVAILABLE\n"), Reply::Unavailable);
        assert_eq!(Reply::parse("RESERVE_SUCCESS"), Reply::ReserveSuccess);
        assert_eq!(Reply::parse("RESERVE_CONFLICT"), Reply::ReserveConflict);
        assert_eq!(Reply::parse("RESERVE_FAILED"), Reply::ReserveFailed);
        assert_eq!(Reply::parse("END_OF_RESERVATION"), Reply::EndOfReservation);
    }

    #[test]
    fn test_parse_capacity_exceeded() {
        assert_eq!(
            Reply::parse("CAPACITY_EXCEEDED"),
            Reply::CapacityExceeded { max: None }
        );
        assert_eq!(
            Reply::parse("CAPACITY_EXCEEDED:15"),
            Reply::CapacityExceeded { max: Some(15) }
        );
        // Garbage max still classifies as capacity-exceeded
        assert_eq!(
            Reply::parse("CAPACITY_EXCEEDED:lots"),
            Reply::CapacityExceeded { max: None }
        );
    }

    #[test]
    fn test_parse_change_conflict_period() {
        assert_eq!(
            Reply::parse("CHANGE_FAILED_CONFLICT:3"),
            Reply::ChangeFailedConflict {
                period: Some(Period::new(3).unwrap())
            }
        );
        assert_eq!(
            Reply::parse("CHANGE_FAILED_CONFLICT:abc"),
            Reply::ChangeFailedConflict { period: None }
        );
    }

    #[test]
    fn test_parse_reserved_count() {
        assert_eq!(
            Reply::parse("RESERVED_COUNT:4"),
            Reply::ReservedCount { count: 4 }
        );
        // Non-numeric count falls through to Other rather than zero
        assert!(matches!(
            Reply::parse("RESERVED_COUNT:many"),
            Reply::Other(_)
        ));
    }

    #[test]
    fn test_parse_room_list() {
        let reply = Reply::parse("CLASSROOMS,301,LECTURE,30,302,LECTURE,40");
        let Reply::RoomList(payload) = reply else {
            panic!("expected room list");
        };
        assert_eq!(payload.kind, RoomKind::Lecture);
        assert_eq!(payload.rooms.len(), 2);
        assert_eq!(payload.skipped, 0);
        assert_eq!(payload.rooms[0].name, "301호");
        assert_eq!(payload.rooms[0].allowed_capacity(), 15);
    }

    #[test]
    fn test_parse_room_list_skips_malformed_triples() {
        let reply = Reply::parse("LABS,910,LAB,20,911,LAB,twenty,912");
        let Reply::RoomList(payload) = reply else {
            panic!("expected room list");
        };
        assert_eq!(payload.kind, RoomKind::Lab);
        assert_eq!(payload.rooms.len(), 1);
        assert_eq!(payload.skipped, 2);
    }

    #[test]
    fn test_parse_empty_room_list() {
        let Reply::RoomList(payload) = Reply::parse("CLASSROOMS") else {
            panic!("expected room list");
        };
        assert!(payload.rooms.is_empty());
        assert_eq!(payload.skipped, 0);
    }

    #[test]
    fn test_unknown_line_is_other() {
        assert_eq!(
            Reply::parse("SOMETHING_NEW,42"),
            Reply::Other("SOMETHING_NEW,42".to_string())
        );
    }

    #[test]
    fn test_reply_serializes_with_type_tag() {
        let json = serde_json::to_value(Reply::CapacityExceeded { max: Some(15) }).unwrap();
        assert_eq!(json["type"], "capacity_exceeded");
        assert_eq!(json["max"], 15);
    }

    #[test]
    fn test_stray_success_detection() {
        assert!(Reply::parse("RESERVE_SUCCESS").is_stray_success());
        assert!(Reply::parse("SUCCESS").is_stray_success());
        assert!(!Reply::parse("AVAILABLE").is_stray_success());
        assert!(!Reply::parse("CHANGE_SUCCESS").is_stray_success());
    }
}
