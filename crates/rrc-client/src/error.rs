//! Error types for the client engine.
//!
//! **Panic-Free Policy:** This crate follows the project's panic-free
//! guidelines. No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`,
//! or `todo!()` outside tests.

use std::io;
use thiserror::Error;

use crate::dispatcher::ExchangeError;

/// Client engine errors.
///
/// Network-touching operations in `ops`, `cache`, and `workflow` usually
/// map these to their documented per-operation defaults instead of
/// surfacing them; this type crosses the boundary only where the caller
/// explicitly asked for an exchange (dispatcher, loader, session setup).
#[derive(Error, Debug)]
pub enum ClientError {
    /// No live connection to the reservation server.
    #[error("Not connected to the reservation server")]
    NotConnected,

    /// The server did not accept the connection in time.
    #[error("Timed out connecting to {addr}")]
    ConnectTimeout { addr: String },

    /// A synchronous exchange failed (timeout, stop, closed connection).
    #[error("Exchange failed: {0}")]
    Exchange(#[from] ExchangeError),

    /// Domain-level validation or parse failure.
    #[error("Domain error: {0}")]
    Domain(#[from] rrc_core::DomainError),

    /// I/O error passthrough.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Convenience Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_connected_display() {
        let error = ClientError::NotConnected;
        assert!(format!("{error}").contains("Not connected"));
    }

    #[test]
    fn test_connect_timeout_names_address() {
        let error = ClientError::ConnectTimeout {
            addr: "127.0.0.1:4100".to_string(),
        };
        assert!(format!("{error}").contains("127.0.0.1:4100"));
    }

    #[test]
    fn test_io_error_from_conversion() {
        let io_error = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        let error: ClientError = io_error.into();
        assert!(matches!(error, ClientError::Io(_)));
    }

    #[test]
    fn test_exchange_error_from_conversion() {
        let error: ClientError = ExchangeError::Stopped.into();
        assert!(matches!(error, ClientError::Exchange(_)));
    }
}
