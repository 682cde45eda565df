//! Domain-specific error types following panic-free policy.

use thiserror::Error;

/// Errors that can occur in domain operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Room not found in the cache or room list
    #[error("Room not found: {room}")]
    RoomNotFound { room: String },

    /// Period label or number outside the bookable range
    #[error("Invalid period: {value} (expected 1-9)")]
    InvalidPeriod { value: String },

    /// Invalid field value
    #[error("Invalid {field}: {value} (expected {expected})")]
    InvalidFieldValue {
        field: String,
        value: String,
        expected: String,
    },

    /// Parse error for incoming data
    #[error("Failed to parse {field}: {reason}")]
    ParseError { field: String, reason: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
