//! RRC Core - Shared domain types for the room reservation client
//!
//! This crate provides the value types shared between the wire protocol
//! crate (rrc-protocol) and the client engine (rrc-client).
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod availability;
pub mod error;
pub mod period;
pub mod reservation;
pub mod room;

// Re-exports for convenience
pub use availability::{SlotKey, SlotStatus, WeeklyAvailability};
pub use error::{DomainError, DomainResult};
pub use period::Period;
pub use reservation::{ReservationData, UserIdentity, STUDENT_ROLE};
pub use room::{normalize_room_name, RoomKind, RoomRecord, ROOM_SUFFIX};
