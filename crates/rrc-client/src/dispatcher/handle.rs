//! Cloneable handle to a running dispatcher actor.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use rrc_protocol::{Command, Notification, Reply};

use super::commands::{DispatchCommand, ExchangeError};

/// Handle to a dispatcher actor.
///
/// Cloning is cheap; every clone talks to the same actor and the same
/// connection. Dropping all clones stops the actor.
#[derive(Clone)]
pub struct DispatcherHandle {
    sender: mpsc::Sender<DispatchCommand>,
    cancel: CancellationToken,
}

impl DispatcherHandle {
    pub(super) fn new(sender: mpsc::Sender<DispatchCommand>, cancel: CancellationToken) -> Self {
        Self { sender, cancel }
    }

    /// Sends one command and awaits its single reply line.
    pub async fn exchange(
        &self,
        command: &Command,
        timeout: Duration,
    ) -> Result<Reply, ExchangeError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(DispatchCommand::Exchange {
                line: command.encode(),
                timeout,
                respond_to,
            })
            .await
            .map_err(|_| ExchangeError::Stopped)?;
        response.await.map_err(|_| ExchangeError::Stopped)?
    }

    /// Sends one command and collects raw reply rows until the stream
    /// sentinel. A mid-stream timeout yields the partial rows.
    pub async fn exchange_stream(
        &self,
        command: &Command,
        timeout: Duration,
    ) -> Result<Vec<String>, ExchangeError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(DispatchCommand::ExchangeStream {
                line: command.encode(),
                timeout,
                respond_to,
            })
            .await
            .map_err(|_| ExchangeError::Stopped)?;
        response.await.map_err(|_| ExchangeError::Stopped)?
    }

    /// Registers (or replaces) the push-notification callback.
    ///
    /// The callback runs on the dispatcher task and must not block.
    pub async fn set_notification_handler<F>(&self, handler: F) -> Result<(), ExchangeError>
    where
        F: Fn(Notification) + Send + 'static,
    {
        self.sender
            .send(DispatchCommand::SetNotificationHandler {
                handler: Box::new(handler),
            })
            .await
            .map_err(|_| ExchangeError::Stopped)
    }

    /// Requests the actor to stop. Safe to call more than once.
    pub fn stop(&self) {
        debug!("Stopping dispatcher");
        self.cancel.cancel();
    }

    /// Whether the actor is still accepting commands.
    pub fn is_running(&self) -> bool {
        !self.sender.is_closed()
    }
}

impl std::fmt::Debug for DispatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatcherHandle")
            .field("running", &self.is_running())
            .finish()
    }
}
