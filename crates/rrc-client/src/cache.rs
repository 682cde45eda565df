//! Classroom metadata cache.
//!
//! A point-in-time snapshot of every room's kind and capacity, replaced
//! wholesale on refresh - never merged or patched. Both lists are
//! fetched before the map is touched, so a failed fetch leaves the
//! previous snapshot intact instead of a half-cleared cache.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::{info, warn};

use rrc_core::{normalize_room_name, RoomRecord};
use rrc_protocol::{Command, Reply, RoomListPayload};

use crate::session::Session;

/// Whether a capacity check passes when the room is unknown or the
/// cache is unreadable. Fails closed: an unverifiable headcount is
/// rejected rather than waved through.
pub const CAPACITY_CHECK_DEFAULT: bool = false;

/// Read-through cache of room metadata, keyed by normalized room name.
#[derive(Debug, Default)]
pub struct ClassroomCache {
    rooms: RwLock<HashMap<String, RoomRecord>>,
}

impl ClassroomCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the snapshot with fresh lecture-room and lab lists.
    ///
    /// Returns false, keeping the previous snapshot, when there is no
    /// connection or either fetch fails.
    pub async fn refresh_from_server(&self, session: &Session) -> bool {
        let Ok(handle) = session.dispatcher().await else {
            warn!("Cache refresh without a connection; keeping previous snapshot");
            return false;
        };
        let timeout = session.config().status_timeout;

        let Some(lectures) = fetch_list(&handle, &Command::GetClassrooms, timeout).await else {
            return false;
        };
        let Some(labs) = fetch_list(&handle, &Command::GetLabs, timeout).await else {
            return false;
        };

        let skipped = lectures.skipped + labs.skipped;
        if skipped > 0 {
            warn!(skipped, "Malformed room entries skipped during refresh");
        }

        match self.rooms.write() {
            Ok(mut rooms) => {
                rooms.clear();
                for record in lectures.rooms.into_iter().chain(labs.rooms) {
                    rooms.insert(record.name.clone(), record);
                }
                info!(rooms = rooms.len(), "Classroom cache refreshed");
                true
            }
            Err(_) => {
                warn!("Classroom cache lock poisoned; refresh skipped");
                false
            }
        }
    }

    /// Whether `headcount` fits within the room's allowed capacity.
    pub fn check_capacity(&self, room: &str, headcount: u32) -> bool {
        let room = normalize_room_name(room);
        match self.rooms.read() {
            Ok(rooms) => match rooms.get(&room) {
                Some(record) => record.fits(headcount),
                None => {
                    warn!(%room, "Capacity check for unknown room; denying");
                    CAPACITY_CHECK_DEFAULT
                }
            },
            Err(_) => CAPACITY_CHECK_DEFAULT,
        }
    }

    /// The cached record for one room, if present.
    pub fn get(&self, room: &str) -> Option<RoomRecord> {
        let room = normalize_room_name(room);
        self.rooms
            .read()
            .ok()
            .and_then(|rooms| rooms.get(&room).cloned())
    }

    /// All cached room names, sorted for stable display.
    pub fn room_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .rooms
            .read()
            .map(|rooms| rooms.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.rooms.read().map(|rooms| rooms.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    pub(crate) fn seed(&self, records: Vec<RoomRecord>) {
        if let Ok(mut rooms) = self.rooms.write() {
            rooms.clear();
            for record in records {
                rooms.insert(record.name.clone(), record);
            }
        }
    }
}

async fn fetch_list(
    handle: &crate::dispatcher::DispatcherHandle,
    command: &Command,
    timeout: std::time::Duration,
) -> Option<RoomListPayload> {
    match handle.exchange(command, timeout).await {
        Ok(Reply::RoomList(payload)) => Some(payload),
        Ok(other) => {
            warn!(command = command.name(), reply = ?other, "Unexpected room-list reply");
            None
        }
        Err(e) => {
            warn!(command = command.name(), error = %e, "Room-list fetch failed");
            None
        }
    }
}
