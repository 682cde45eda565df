//! Message dispatcher - the single authoritative reader of the shared
//! reservation-server socket.
//!
//! The wire protocol carries no request id, so correlation is entirely a
//! client-side concern. The dispatcher is an actor owning both socket
//! halves: callers submit exchanges over an mpsc channel and receive
//! their reply through a per-exchange oneshot. Internally every exchange
//! gets a monotonically increasing request id; replies resolve pending
//! exchanges in id order, and a reply whose exchange has already timed
//! out is *discarded* instead of being handed to the next caller. That
//! discard is what makes concurrent callers safe without an external
//! lock per exchange.
//!
//! Multi-command sequences (a booking's status check plus its per-period
//! submissions) still serialize through the session's connection-wide
//! exchange lock so no other caller's traffic interleaves with them.

mod actor;
mod commands;
mod handle;

pub use commands::{DispatchCommand, ExchangeError, NotificationHandler};
pub use handle::DispatcherHandle;

use actor::DispatcherActor;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Capacity of the actor's command channel.
///
/// Senders back-pressure briefly if the actor is mid-write; the queue
/// never needs to hold more than the handful of concurrent exchanges a
/// single user session can produce.
const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Spawns a dispatcher actor over any byte stream.
///
/// Production code hands this a `TcpStream`; tests drive it through
/// `tokio::io::duplex`. The returned handle is cheap to clone. The actor
/// exits when the token is cancelled, the command channel closes, or the
/// remote end closes the stream.
pub fn spawn_dispatcher<S>(stream: S, cancel: CancellationToken) -> DispatcherHandle
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (sender, receiver) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
    let actor = DispatcherActor::new(stream, receiver, cancel.clone());

    tokio::spawn(actor.run());

    DispatcherHandle::new(sender, cancel)
}
