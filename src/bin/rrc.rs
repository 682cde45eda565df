//! rrc - debug CLI for the room reservation client engine.
//!
//! Talks the reservation server's line protocol through the same
//! dispatcher, cache, and workflow the application uses, so server
//! behavior can be poked from a terminal.
//!
//! # Usage
//!
//! ```text
//! rrc status 301                           # is the room open for booking?
//! rrc count 301 2026-09-01 3               # reservations on one slot
//! rrc week 301 2026-08-31 2026-09-06       # a room's weekly window
//! rrc rooms --json                         # refreshed room list
//! rrc book 301 2026-09-01 화 1 2 스터디 4   # run the booking workflow
//! rrc cancel 301 2026-09-01 화 1           # cancel one booked period
//! ```

use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rrc_client::ops;
use rrc_client::workflow::BookingForm;
use rrc_client::{
    load_week, ClassroomCache, ClientConfig, ReservationWorkflow, Session, SharedAvailability,
};
use rrc_core::{Period, UserIdentity, WeeklyAvailability};
use rrc_protocol::Command as WireCommand;

// ============================================================================
// CLI Arguments
// ============================================================================

/// Room reservation client - debug CLI
#[derive(Parser, Debug)]
#[command(name = "rrc")]
#[command(about = "Poke the reservation server through the client engine")]
#[command(version)]
struct Args {
    /// Reservation server address
    #[arg(long, default_value = "127.0.0.1:4100", global = true)]
    server: String,

    /// User id sent with cancellation requests
    #[arg(long, default_value = "debug", global = true)]
    user_id: String,

    /// Display name sent with reservation requests
    #[arg(long, default_value = "debug", global = true)]
    name: String,

    /// Role token ("student" gets the shorter duration ceiling)
    #[arg(long, default_value = "student", global = true)]
    role: String,

    #[command(subcommand)]
    command: Cli,
}

#[derive(Subcommand, Debug)]
enum Cli {
    /// Check whether a room currently accepts reservations
    Status { room: String },

    /// Count reservations already placed on one slot
    Count {
        room: String,
        /// Date (YYYY-MM-DD)
        date: String,
        /// Period number (1-9)
        period: u8,
    },

    /// Print a room's weekly reservation window
    Week {
        room: String,
        /// First date of the window (YYYY-MM-DD)
        week_start: String,
        /// Last date of the window, inclusive
        week_end: String,
        /// Print the window as JSON
        #[arg(long)]
        json: bool,
    },

    /// Refresh and list all rooms with their capacities
    Rooms {
        /// Print the list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the booking workflow for a period range
    Book {
        room: String,
        /// Date (YYYY-MM-DD); must be at least tomorrow
        date: String,
        /// Day-of-week name as shown in the weekly table
        day: String,
        /// First period (1-9)
        start: u8,
        /// Last period, inclusive
        end: u8,
        purpose: String,
        headcount: u32,
    },

    /// Cancel one booked period
    Cancel {
        room: String,
        date: String,
        day: String,
        period: u8,
    },
}

// ============================================================================
// Booking form backed by CLI arguments
// ============================================================================

struct CliForm {
    room: String,
    date: NaiveDate,
    date_label: String,
    day: String,
    start: String,
    end: String,
    purpose: String,
    headcount: u32,
}

impl BookingForm for CliForm {
    fn selected_room(&self) -> String {
        self.room.clone()
    }
    fn selected_date(&self) -> Option<NaiveDate> {
        Some(self.date)
    }
    fn date_label(&self) -> String {
        self.date_label.clone()
    }
    fn day_name(&self) -> String {
        self.day.clone()
    }
    fn start_label(&self) -> String {
        self.start.clone()
    }
    fn end_label(&self) -> String {
        self.end.clone()
    }
    fn purpose(&self) -> String {
        self.purpose.clone()
    }
    fn headcount(&self) -> u32 {
        self.headcount
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rrc=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig {
        server_addr: args.server.clone(),
        ..Default::default()
    };
    let identity = UserIdentity::new(&args.user_id, &args.name, &args.role);
    let session = Arc::new(Session::new(identity, config));
    session.connect().await?;
    info!(server = %args.server, "Connected");

    match args.command {
        Cli::Status { room } => {
            let available = ops::check_room_status(&session, &room).await;
            println!("{}", if available { "AVAILABLE" } else { "UNAVAILABLE" });
        }

        Cli::Count { room, date, period } => {
            let period = Period::new(period)?;
            let count = ops::reserved_count(&session, &room, &date, period).await;
            println!("{count}");
        }

        Cli::Week {
            room,
            week_start,
            week_end,
            json,
        } => {
            let week = load_week(&session, &room, &week_start, &week_end).await?;
            let mut slots: Vec<_> =
                week.slots().map(|(key, status)| (key.clone(), status)).collect();
            slots.sort_by(|a, b| {
                (a.0.date.as_str(), a.0.period).cmp(&(b.0.date.as_str(), b.0.period))
            });
            if json {
                let rows: Vec<_> = slots
                    .iter()
                    .map(|(key, status)| {
                        serde_json::json!({
                            "date": key.date,
                            "day": key.day,
                            "period": key.period.number(),
                            "status": status.display_name(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for (key, status) in slots {
                    println!("{} {} {} {}", key.date, key.day, key.period, status);
                }
            }
        }

        Cli::Rooms { json } => {
            let cache = ClassroomCache::new();
            if !cache.refresh_from_server(&session).await {
                bail!("room list refresh failed");
            }
            if json {
                let records: Vec<_> = cache
                    .room_names()
                    .iter()
                    .filter_map(|name| cache.get(name))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                for name in cache.room_names() {
                    if let Some(record) = cache.get(&name) {
                        println!(
                            "{name} {} 정원 {} (허용 {})",
                            record.kind,
                            record.capacity,
                            record.allowed_capacity()
                        );
                    }
                }
            }
        }

        Cli::Book {
            room,
            date,
            day,
            start,
            end,
            purpose,
            headcount,
        } => {
            let parsed = NaiveDate::parse_from_str(&date, "%Y-%m-%d")?;
            let form = CliForm {
                room,
                date: parsed,
                date_label: date,
                day,
                start: Period::new(start)?.label(),
                end: Period::new(end)?.label(),
                purpose,
                headcount,
            };

            let cache = Arc::new(ClassroomCache::new());
            if !cache.refresh_from_server(&session).await {
                bail!("room list refresh failed");
            }
            let week: SharedAvailability =
                Arc::new(std::sync::RwLock::new(WeeklyAvailability::default()));

            let flow = ReservationWorkflow::new(session.clone(), cache, week);
            let outcome = flow.submit(&form).await;
            println!("{}", outcome.message());
            if !outcome.is_booked() {
                session.disconnect().await;
                std::process::exit(1);
            }
        }

        Cli::Cancel {
            room,
            date,
            day,
            period,
        } => {
            let period = Period::new(period)?;
            let command = WireCommand::cancel_reservation(
                &args.user_id,
                &args.user_id,
                &day,
                &date,
                period,
                &room,
                &args.name,
            );
            let outcome = ops::cancel_reservation(&session, &command).await;
            println!("{}", outcome.message());
        }
    }

    session.disconnect().await;
    Ok(())
}
