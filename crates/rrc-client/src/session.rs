//! Connection-scoped session state.
//!
//! One `Session` is one user's connection to one reservation server:
//! who they are, how to reach the server, and the dispatcher handle for
//! the live socket. Nothing here is global; tests and multi-account
//! setups construct as many sessions as they need.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use rrc_core::UserIdentity;

use crate::config::ClientConfig;
use crate::dispatcher::{spawn_dispatcher, DispatcherHandle};
use crate::error::{ClientError, Result};

/// A user's connection to the reservation server.
///
/// The dispatcher slot is guarded by a mutex so concurrent `connect`
/// calls race safely: whoever gets the lock first dials, the rest reuse
/// the handle it stored.
pub struct Session {
    identity: UserIdentity,
    config: ClientConfig,
    dispatcher: Mutex<Option<DispatcherHandle>>,
    exchange_serial: Mutex<()>,
}

impl Session {
    pub fn new(identity: UserIdentity, config: ClientConfig) -> Self {
        Self {
            identity,
            config,
            dispatcher: Mutex::new(None),
            exchange_serial: Mutex::new(()),
        }
    }

    pub fn identity(&self) -> &UserIdentity {
        &self.identity
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Connects to the configured server, or reuses the live connection.
    ///
    /// A handle whose actor has exited (closed socket, earlier stop) is
    /// replaced by a fresh dial rather than returned.
    pub async fn connect(&self) -> Result<DispatcherHandle> {
        let mut slot = self.dispatcher.lock().await;
        if let Some(handle) = slot.as_ref() {
            if handle.is_running() {
                debug!("Reusing live connection");
                return Ok(handle.clone());
            }
            debug!("Previous connection is dead; reconnecting");
        }

        let addr = self.config.server_addr.clone();
        let stream = tokio::time::timeout(self.config.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| ClientError::ConnectTimeout { addr: addr.clone() })??;
        info!(%addr, user = %self.identity.user_id, "Connected to reservation server");

        let handle = spawn_dispatcher(stream, CancellationToken::new());
        *slot = Some(handle.clone());
        Ok(handle)
    }

    /// Wires this session onto an already-open byte stream.
    ///
    /// Tests drive sessions over `tokio::io::duplex` with this instead
    /// of dialing a real server.
    pub async fn attach<S>(&self, stream: S) -> DispatcherHandle
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let handle = spawn_dispatcher(stream, CancellationToken::new());
        let mut slot = self.dispatcher.lock().await;
        if let Some(old) = slot.replace(handle.clone()) {
            old.stop();
        }
        handle
    }

    /// The current dispatcher handle, if the connection is live.
    pub async fn dispatcher(&self) -> Result<DispatcherHandle> {
        let slot = self.dispatcher.lock().await;
        match slot.as_ref() {
            Some(handle) if handle.is_running() => Ok(handle.clone()),
            _ => Err(ClientError::NotConnected),
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.dispatcher().await.is_ok()
    }

    /// Stops the dispatcher and forgets the connection.
    pub async fn disconnect(&self) {
        let mut slot = self.dispatcher.lock().await;
        if let Some(handle) = slot.take() {
            info!(user = %self.identity.user_id, "Disconnecting");
            handle.stop();
        }
    }

    /// Serializes multi-command sequences on this connection.
    ///
    /// A booking holds this across its status re-check and per-period
    /// submissions so no other caller's commands interleave.
    pub async fn lock_exchanges(&self) -> MutexGuard<'_, ()> {
        self.exchange_serial.lock().await
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.identity.user_id)
            .field("server", &self.config.server_addr)
            .finish_non_exhaustive()
    }
}
