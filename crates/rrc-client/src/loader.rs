//! Weekly availability loader.
//!
//! One windowed query per (room, week), streamed row-by-row until the
//! end sentinel, then swapped into the shared view wholesale. A timeout
//! mid-stream keeps whatever rows arrived; the truncation is silent.

use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use rrc_core::{normalize_room_name, Period, SlotKey, SlotStatus, WeeklyAvailability};
use rrc_protocol::Command;

use crate::error::Result;
use crate::session::Session;

/// Weekly window shared between loader tasks and the rendering side.
pub type SharedAvailability = Arc<RwLock<WeeklyAvailability>>;

/// Loads one room's 7-day window into a fresh [`WeeklyAvailability`].
///
/// Malformed rows are logged and skipped; the rest of the window still
/// loads. Errors out only when there is no connection at all.
pub async fn load_week(
    session: &Session,
    room: &str,
    week_start: &str,
    week_end: &str,
) -> Result<WeeklyAvailability> {
    let handle = session.dispatcher().await?;
    let room = normalize_room_name(room);
    let command = Command::view_weekly_reservation(&room, week_start, week_end);
    let rows = handle
        .exchange_stream(&command, session.config().weekly_timeout)
        .await?;

    let mut week = WeeklyAvailability::new(&room, week_start, week_end);
    let mut malformed = 0usize;
    for row in rows {
        match parse_row(&row) {
            Some((key, status)) => week.insert(key, status),
            None => {
                malformed += 1;
                warn!(row = %row, "Malformed weekly row skipped");
            }
        }
    }
    debug!(
        room = %week.room,
        slots = week.len(),
        malformed,
        "Weekly availability loaded"
    );
    Ok(week)
}

/// Reloads a window and replaces the shared view in one swap.
pub async fn refresh_week(
    session: &Session,
    shared: &SharedAvailability,
    room: &str,
    week_start: &str,
    week_end: &str,
) -> Result<()> {
    let fresh = load_week(session, room, week_start, week_end).await?;
    match shared.write() {
        Ok(mut window) => *window = fresh,
        Err(_) => warn!("Weekly view lock poisoned; refresh dropped"),
    }
    Ok(())
}

/// Parses one `date,day,period,status` row. Anything else is `None`.
fn parse_row(row: &str) -> Option<(SlotKey, SlotStatus)> {
    let fields: Vec<&str> = row.split(',').collect();
    match fields.as_slice() {
        [date, day, period, status] => {
            let period = period
                .trim()
                .parse::<u8>()
                .ok()
                .and_then(|n| Period::new(n).ok())?;
            Some((
                SlotKey::new(date.trim(), day.trim(), period),
                SlotStatus::from_wire(status),
            ))
        }
        _ => None,
    }
}
