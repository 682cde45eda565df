//! RRC Protocol - Wire protocol for reservation server communication
//!
//! This crate provides the newline-terminated, comma-separated command
//! and reply grammar spoken between the client engine and the
//! reservation server, plus parsing for server-pushed notifications.
//!
//! The protocol carries no request id on the wire; correlation is the
//! client's job (see the dispatcher in rrc-client).

pub mod command;
pub mod notification;
pub mod reply;

pub use command::{ChangeTarget, Command};
pub use notification::{Notification, NotificationKind, NOTIFICATION_PREFIX};
pub use reply::{Reply, RoomListPayload};
