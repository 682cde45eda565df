//! Commands understood by the dispatcher actor.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::oneshot;

use rrc_protocol::{Notification, Reply};

/// Callback invoked on the dispatcher task for every parsed notification.
///
/// Handlers must be quick and non-blocking; anything heavier should
/// forward into a channel owned by the view layer.
pub type NotificationHandler = Box<dyn Fn(Notification) + Send + 'static>;

/// Why an exchange produced no reply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    /// No reply arrived within the caller's timeout. The reply, if it
    /// ever arrives, will be discarded - not delivered to a later caller.
    #[error("No reply within {0:?}")]
    Timeout(Duration),

    /// The server closed the connection while the exchange was pending.
    #[error("Connection closed by the server")]
    ConnectionClosed,

    /// The dispatcher is not running (stopped or never started).
    #[error("Dispatcher stopped")]
    Stopped,
}

/// Commands sent from handles to the dispatcher actor.
pub enum DispatchCommand {
    /// Send one line and await exactly one reply line.
    Exchange {
        /// Encoded command line (no trailing newline).
        line: String,
        /// How long the caller is willing to wait for the reply.
        timeout: Duration,
        /// Resolved with the classified reply or an [`ExchangeError`].
        respond_to: oneshot::Sender<Result<Reply, ExchangeError>>,
    },

    /// Send one line and collect raw reply lines until the
    /// `END_OF_RESERVATION` sentinel.
    ///
    /// A timeout mid-stream resolves with the partial rows collected so
    /// far; the truncation is silent by design.
    ExchangeStream {
        line: String,
        timeout: Duration,
        respond_to: oneshot::Sender<Result<Vec<String>, ExchangeError>>,
    },

    /// Register (or replace) the push-notification handler.
    ///
    /// Notifications arriving while no handler is registered are logged
    /// and dropped - never queued for later attachment.
    SetNotificationHandler { handler: NotificationHandler },
}

impl std::fmt::Debug for DispatchCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exchange { line, timeout, .. } => f
                .debug_struct("Exchange")
                .field("line", line)
                .field("timeout", timeout)
                .finish_non_exhaustive(),
            Self::ExchangeStream { line, timeout, .. } => f
                .debug_struct("ExchangeStream")
                .field("line", line)
                .field("timeout", timeout)
                .finish_non_exhaustive(),
            Self::SetNotificationHandler { .. } => {
                f.debug_struct("SetNotificationHandler").finish_non_exhaustive()
            }
        }
    }
}
