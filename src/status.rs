use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::BookingError;

/// Represents the possible states of a service booking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Booking is waiting for a provider
    #[default]
    Pending,
    /// A provider has been assigned but has not accepted yet
    Assigned,
    /// The provider accepted and the service is underway
    InProgress,
    /// The service was delivered
    Completed,
    /// The customer cancelled the booking
    Cancelled,
    /// The provider rejected the booking or did not show up
    Failed,
}

impl BookingStatus {
    /// Every status, in lifecycle order
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Assigned,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
        Self::Failed,
    ];

    /// The wire name of this status
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Assigned => "ASSIGNED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Failed => "FAILED",
        }
    }

    /// No ordinary transition leaves a terminal status.
    ///
    /// `Failed` is not terminal: `retry` returns it to `Pending`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Get a human-readable description of the status
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Pending => "Booking is waiting for a provider",
            Self::Assigned => "A provider has been assigned",
            Self::InProgress => "The provider is delivering the service",
            Self::Completed => "The service has been completed",
            Self::Cancelled => "The booking was cancelled",
            Self::Failed => "The booking failed and can be retried",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| BookingError::InvalidStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_wire_name() {
        for status in BookingStatus::ALL {
            assert_eq!(status.as_str().parse::<BookingStatus>().ok(), Some(status));
        }
    }

    #[test]
    fn rejects_unknown_names() {
        for name in ["BOGUS", "pending", "", "IN PROGRESS"] {
            assert!(matches!(
                name.parse::<BookingStatus>(),
                Err(BookingError::InvalidStatus(ref raw)) if raw == name
            ));
        }
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&BookingStatus::InProgress).ok();
        assert_eq!(json.as_deref(), Some("\"IN_PROGRESS\""));

        let parsed: Option<BookingStatus> = serde_json::from_str("\"CANCELLED\"").ok();
        assert_eq!(parsed, Some(BookingStatus::Cancelled));
    }

    #[test]
    fn terminal_classification() {
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(!BookingStatus::Failed.is_terminal());
        assert!(!BookingStatus::Pending.is_terminal());
    }
}
