//! RRC Client - the reservation client engine
//!
//! This crate provides everything between the view layer and the
//! reservation server's line protocol:
//! - `dispatcher` - the single reader of the shared socket, correlating
//!   replies to callers and routing pushed notifications
//! - `session` - connection-scoped state: identity, dispatcher handle,
//!   and the connection-wide exchange lock
//! - `cache` - wholesale-refreshed classroom metadata
//! - `loader` - weekly-availability hydration
//! - `workflow` - the fixed-order booking validation/submission pipeline
//! - `ops` - thin request/reply operations with explicit failure defaults
//!
//! # Architecture
//!
//! ```text
//! View event ──▶ ReservationWorkflow ──▶ ClassroomCache
//!                      │                      │
//!                      ▼                      ▼
//!               Session (exchange lock) ──▶ DispatcherHandle
//!                                             │ mpsc + oneshot
//!                                             ▼
//!                                      DispatcherActor ◀──▶ server socket
//!                                             │
//!                                             ▼
//!                                     notification handler
//! ```

pub mod cache;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod loader;
pub mod ops;
pub mod session;
pub mod workflow;

pub use cache::{ClassroomCache, CAPACITY_CHECK_DEFAULT};
pub use config::ClientConfig;
pub use dispatcher::{spawn_dispatcher, DispatcherHandle, ExchangeError};
pub use error::{ClientError, Result};
pub use loader::{load_week, refresh_week, SharedAvailability};
pub use ops::{CancelOutcome, ChangeOutcome, RESERVED_COUNT_DEFAULT, ROOM_STATUS_DEFAULT};
pub use session::Session;
pub use workflow::{BookingForm, ReservationWorkflow, SubmitOutcome};
