//! Dispatcher actor - owns the socket and all pending-exchange state.
//!
//! The actor is the only task that ever reads or writes the connection.
//! Every incoming line is classified exactly once: notification lines go
//! to the registered handler, everything else resolves (or is discarded
//! against) the oldest pending exchange.
//!
//! # Panic-Free Guarantees
//!
//! No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`.
//! Channel send failures are logged or ignored, never panics.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines, ReadHalf, WriteHalf,
};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use rrc_protocol::{Notification, Reply};

use super::commands::{DispatchCommand, ExchangeError, NotificationHandler};

/// Line closing a weekly-view reply stream.
const STREAM_SENTINEL: &str = "END_OF_RESERVATION";

/// One exchange awaiting its reply.
///
/// The id is assigned at submission time and only ever increases; the
/// pending queue is therefore always sorted by id, and the oldest live
/// entry is the one the next reply belongs to.
struct Pending {
    id: u64,
    timeout: Duration,
    deadline: Instant,
    kind: PendingKind,
}

enum PendingKind {
    /// Awaiting exactly one reply line.
    Single {
        respond_to: oneshot::Sender<Result<Reply, ExchangeError>>,
    },

    /// Collecting rows until the stream sentinel.
    Stream {
        rows: Vec<String>,
        respond_to: oneshot::Sender<Result<Vec<String>, ExchangeError>>,
    },

    /// Timed out; its single reply line is still owed by the server and
    /// must be consumed and discarded when it arrives.
    AbandonedSingle,

    /// Timed out mid-stream; remaining rows and the sentinel are still
    /// owed and must be consumed and discarded.
    AbandonedStream,
}

impl PendingKind {
    fn is_abandoned(&self) -> bool {
        matches!(self, Self::AbandonedSingle | Self::AbandonedStream)
    }
}

/// What one iteration of the run loop observed.
enum Tick {
    Cancelled,
    Command(Option<DispatchCommand>),
    Read(io::Result<Option<String>>),
    Expired,
}

/// The dispatcher actor. See module docs in [`super`].
pub(super) struct DispatcherActor<S> {
    reader: Lines<BufReader<ReadHalf<S>>>,
    writer: WriteHalf<S>,
    receiver: mpsc::Receiver<DispatchCommand>,
    cancel: CancellationToken,
    pending: VecDeque<Pending>,
    next_request_id: u64,
    handler: Option<NotificationHandler>,
}

impl<S> DispatcherActor<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    pub(super) fn new(
        stream: S,
        receiver: mpsc::Receiver<DispatchCommand>,
        cancel: CancellationToken,
    ) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        Self {
            reader: BufReader::new(read_half).lines(),
            writer: write_half,
            receiver,
            cancel,
            pending: VecDeque::new(),
            next_request_id: 0,
            handler: None,
        }
    }

    /// Runs the actor until stopped, the handles drop, or the socket dies.
    pub(super) async fn run(mut self) {
        info!("Dispatcher starting");

        loop {
            let next_deadline = self.next_deadline();
            // next_line is cancel-safe: a command or expiry winning the
            // race mid-line leaves the partial bytes buffered instead of
            // dropping them.
            let tick = tokio::select! {
                _ = self.cancel.cancelled() => Tick::Cancelled,
                command = self.receiver.recv() => Tick::Command(command),
                line = self.reader.next_line() => Tick::Read(line),
                _ = tokio::time::sleep_until(next_deadline.unwrap_or_else(Instant::now)),
                    if next_deadline.is_some() => Tick::Expired,
            };

            match tick {
                Tick::Cancelled => {
                    debug!("Dispatcher stop requested");
                    break;
                }
                Tick::Command(None) => {
                    debug!("All dispatcher handles dropped");
                    break;
                }
                Tick::Command(Some(command)) => {
                    if self.handle_command(command).await.is_err() {
                        break;
                    }
                }
                Tick::Read(Ok(None)) => {
                    info!("Server closed the connection");
                    self.fail_all(ExchangeError::ConnectionClosed);
                    break;
                }
                Tick::Read(Ok(Some(line))) => {
                    let raw = line.trim_end_matches('\r');
                    if !raw.is_empty() {
                        self.handle_line(raw);
                    }
                }
                Tick::Read(Err(e)) => {
                    // A read failure while still running is fatal to the loop.
                    if !self.cancel.is_cancelled() {
                        error!(error = %e, "Socket read failed");
                    }
                    self.fail_all(ExchangeError::ConnectionClosed);
                    break;
                }
                Tick::Expired => self.expire_due(),
            }
        }

        self.fail_all(ExchangeError::Stopped);
        info!("Dispatcher stopped");
    }

    /// Earliest deadline among exchanges still awaiting delivery.
    fn next_deadline(&self) -> Option<Instant> {
        self.pending
            .iter()
            .filter(|p| !p.kind.is_abandoned())
            .map(|p| p.deadline)
            .min()
    }

    /// Processes one command from a handle.
    ///
    /// Returns `Err` when the socket write failed and the actor must stop.
    async fn handle_command(&mut self, command: DispatchCommand) -> Result<(), ()> {
        match command {
            DispatchCommand::Exchange {
                line,
                timeout,
                respond_to,
            } => {
                let id = self.next_id();
                debug!(id, command = %line, "Sending command");
                if let Err(e) = self.write_line(&line).await {
                    error!(error = %e, "Socket write failed");
                    let _ = respond_to.send(Err(ExchangeError::ConnectionClosed));
                    self.fail_all(ExchangeError::ConnectionClosed);
                    return Err(());
                }
                self.pending.push_back(Pending {
                    id,
                    timeout,
                    deadline: Instant::now() + timeout,
                    kind: PendingKind::Single { respond_to },
                });
                Ok(())
            }
            DispatchCommand::ExchangeStream {
                line,
                timeout,
                respond_to,
            } => {
                let id = self.next_id();
                debug!(id, command = %line, "Sending stream command");
                if let Err(e) = self.write_line(&line).await {
                    error!(error = %e, "Socket write failed");
                    let _ = respond_to.send(Err(ExchangeError::ConnectionClosed));
                    self.fail_all(ExchangeError::ConnectionClosed);
                    return Err(());
                }
                self.pending.push_back(Pending {
                    id,
                    timeout,
                    deadline: Instant::now() + timeout,
                    kind: PendingKind::Stream {
                        rows: Vec::new(),
                        respond_to,
                    },
                });
                Ok(())
            }
            DispatchCommand::SetNotificationHandler { handler } => {
                debug!("Notification handler registered");
                self.handler = Some(handler);
                Ok(())
            }
        }
    }

    async fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);
        id
    }

    /// Classifies one incoming line: notification or reply.
    fn handle_line(&mut self, raw: &str) {
        if Notification::is_notification_line(raw) {
            self.handle_notification(raw);
        } else {
            self.handle_reply(raw);
        }
    }

    fn handle_notification(&mut self, raw: &str) {
        match Notification::parse(raw) {
            Ok(notification) => match &self.handler {
                Some(handler) => {
                    debug!(
                        kind = %notification.kind,
                        room = %notification.room,
                        "Delivering notification"
                    );
                    handler(notification);
                }
                None => {
                    // Not retried or queued for later attachment.
                    warn!(line = %raw, "Notification dropped - no handler registered");
                }
            },
            Err(e) => warn!(error = %e, line = %raw, "Malformed notification dropped"),
        }
    }

    /// Resolves the oldest pending exchange with this reply line, or
    /// discards the line if that exchange already timed out.
    fn handle_reply(&mut self, raw: &str) {
        enum Front {
            None,
            Single,
            Stream,
            AbandonedSingle,
            AbandonedStream,
        }

        let front = match self.pending.front().map(|p| &p.kind) {
            None => Front::None,
            Some(PendingKind::Single { .. }) => Front::Single,
            Some(PendingKind::Stream { .. }) => Front::Stream,
            Some(PendingKind::AbandonedSingle) => Front::AbandonedSingle,
            Some(PendingKind::AbandonedStream) => Front::AbandonedStream,
        };

        match front {
            Front::None => {
                // With request-id correlation this can only be a line the
                // server sent unprompted; see DESIGN.md.
                warn!(line = %raw, "Reply with no pending exchange dropped");
            }
            Front::Single => {
                if let Some(pending) = self.pending.pop_front() {
                    if let PendingKind::Single { respond_to } = pending.kind {
                        debug!(id = pending.id, line = %raw, "Reply delivered");
                        let _ = respond_to.send(Ok(Reply::parse(raw)));
                    }
                }
            }
            Front::AbandonedSingle => {
                if let Some(pending) = self.pending.pop_front() {
                    debug!(id = pending.id, line = %raw, "Stale reply discarded");
                }
            }
            Front::Stream => {
                if raw == STREAM_SENTINEL {
                    if let Some(pending) = self.pending.pop_front() {
                        if let PendingKind::Stream { rows, respond_to } = pending.kind {
                            debug!(id = pending.id, rows = rows.len(), "Stream complete");
                            let _ = respond_to.send(Ok(rows));
                        }
                    }
                } else if let Some(Pending {
                    kind: PendingKind::Stream { rows, .. },
                    ..
                }) = self.pending.front_mut()
                {
                    rows.push(raw.to_string());
                }
            }
            Front::AbandonedStream => {
                if raw == STREAM_SENTINEL {
                    debug!("Abandoned stream terminated");
                    self.pending.pop_front();
                } else {
                    debug!(line = %raw, "Stale stream row discarded");
                }
            }
        }
    }

    /// Times out every exchange whose deadline has passed.
    ///
    /// A timed-out exchange stays in the queue as abandoned so its reply
    /// consumes the right slot when it finally arrives, instead of being
    /// delivered to the next caller.
    fn expire_due(&mut self) {
        let now = Instant::now();
        for pending in self.pending.iter_mut() {
            if pending.deadline > now || pending.kind.is_abandoned() {
                continue;
            }
            match std::mem::replace(&mut pending.kind, PendingKind::AbandonedSingle) {
                PendingKind::Single { respond_to } => {
                    warn!(
                        id = pending.id,
                        timeout = ?pending.timeout,
                        "Exchange timed out; its reply will be discarded on arrival"
                    );
                    let _ = respond_to.send(Err(ExchangeError::Timeout(pending.timeout)));
                }
                PendingKind::Stream { rows, respond_to } => {
                    warn!(
                        id = pending.id,
                        rows = rows.len(),
                        "Stream timed out; keeping partial rows"
                    );
                    // Silent truncation: the caller gets what arrived.
                    let _ = respond_to.send(Ok(rows));
                    pending.kind = PendingKind::AbandonedStream;
                }
                other => pending.kind = other,
            }
        }
    }

    /// Fails every live pending exchange. Streams resolve with their
    /// partial rows, mirroring the mid-stream timeout policy.
    fn fail_all(&mut self, error: ExchangeError) {
        for pending in self.pending.drain(..) {
            match pending.kind {
                PendingKind::Single { respond_to } => {
                    let _ = respond_to.send(Err(error.clone()));
                }
                PendingKind::Stream { rows, respond_to } => {
                    let _ = respond_to.send(Ok(rows));
                }
                PendingKind::AbandonedSingle | PendingKind::AbandonedStream => {}
            }
        }
    }
}
