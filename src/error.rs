//! Error types for booking operations and snapshot handling.

use thiserror::Error;

use crate::{booking::BookingId, status::BookingStatus, transition::Operation};

/// Errors returned by the booking engine.
///
/// Every variant is detected before the booking is touched, so a failed call
/// never changes status, provider or history.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    /// No booking is registered under the id
    #[error("booking not found: {0}")]
    NotFound(BookingId),

    /// The operation requires a different current status
    #[error(
        "cannot {operation} booking {id} while it is {actual}{}",
        .expected.map_or_else(String::new, |status| format!(" (requires {status})"))
    )]
    InvalidState {
        /// Booking the operation targeted
        id: BookingId,
        /// Operation that was refused
        operation: Operation,
        /// Status the operation requires, when it names one
        expected: Option<BookingStatus>,
        /// Status the booking actually has
        actual: BookingStatus,
    },

    /// The requested status is not a member of the status enumeration
    #[error("invalid status: {0:?}")]
    InvalidStatus(String),
}

/// Errors raised while exporting or importing a registry snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The snapshot file could not be read or written
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot could not be encoded or decoded
    #[error("snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A booking in the snapshot breaks a lifecycle invariant
    #[error("booking {id} in snapshot is inconsistent: {reason}")]
    Inconsistent {
        /// Offending booking
        id: BookingId,
        /// Which invariant failed
        reason: String,
    },

    /// The snapshot was written with a format this build cannot read
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),

    /// Two bookings in the snapshot share an id
    #[error("duplicate booking id in snapshot: {0}")]
    DuplicateId(BookingId),
}

/// Errors raised while loading an [`EngineConfig`](crate::config::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON for the config shape
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}
