use std::fmt;

use serde::{Deserialize, Serialize};

use crate::status::BookingStatus;

/// Who triggered a status change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Actor {
    /// The booking platform itself
    System,
    /// The service provider
    Provider,
    /// The customer who made the booking
    Customer,
    /// An administrator using the override path
    Admin,
}

impl Actor {
    /// The wire name of this actor
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "SYSTEM",
            Self::Provider => "PROVIDER",
            Self::Customer => "CUSTOMER",
            Self::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordinary operations of the booking lifecycle.
///
/// The administrative override is deliberately absent: it is not bound by
/// this table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Register a new booking
    Create,
    /// Attach a provider to a pending booking
    Assign,
    /// Provider accepts an assigned booking
    Accept,
    /// Provider rejects the booking or fails to show up
    Reject,
    /// Provider finishes the service
    Complete,
    /// Customer cancels the booking
    Cancel,
    /// Put a failed booking back into the queue
    Retry,
}

impl Operation {
    /// Operations that act on an existing booking
    pub const ON_EXISTING: [Self; 6] = [
        Self::Assign,
        Self::Accept,
        Self::Reject,
        Self::Complete,
        Self::Cancel,
        Self::Retry,
    ];

    /// Status the booking must currently have, or `None` when the operation
    /// applies from any status.
    ///
    /// `Create` also returns `None`: it has no prior booking at all.
    #[must_use]
    pub const fn requires(self) -> Option<BookingStatus> {
        match self {
            Self::Assign => Some(BookingStatus::Pending),
            Self::Accept => Some(BookingStatus::Assigned),
            Self::Complete => Some(BookingStatus::InProgress),
            Self::Retry => Some(BookingStatus::Failed),
            Self::Create | Self::Reject | Self::Cancel => None,
        }
    }

    /// Status the booking has after the operation succeeds
    #[must_use]
    pub const fn target(self) -> BookingStatus {
        match self {
            Self::Create | Self::Retry => BookingStatus::Pending,
            Self::Assign => BookingStatus::Assigned,
            Self::Accept => BookingStatus::InProgress,
            Self::Complete => BookingStatus::Completed,
            Self::Cancel => BookingStatus::Cancelled,
            Self::Reject => BookingStatus::Failed,
        }
    }

    /// Actor label recorded in the history entry
    #[must_use]
    pub const fn actor(self) -> Actor {
        match self {
            Self::Create | Self::Assign | Self::Retry => Actor::System,
            Self::Accept | Self::Reject | Self::Complete => Actor::Provider,
            Self::Cancel => Actor::Customer,
        }
    }

    /// Whether the operation may run against a booking in `status`
    #[must_use]
    pub fn permits(self, status: BookingStatus) -> bool {
        match self {
            Self::Create => false,
            _ => self.requires().is_none_or(|required| required == status),
        }
    }

    /// The ordinary operation that moves `from` to `to` under `by`, if any
    #[must_use]
    pub fn explaining(from: BookingStatus, to: BookingStatus, by: Actor) -> Option<Self> {
        Self::ON_EXISTING.into_iter().find(|operation| {
            operation.permits(from) && operation.target() == to && operation.actor() == by
        })
    }

    /// Lowercase name used in logs, errors and command payloads
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Assign => "assign",
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
            Self::Retry => "retry",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
