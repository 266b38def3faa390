//! Booking records and their identifiers.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    history::{History, HistoryEntry},
    status::BookingStatus,
    transition::{Actor, Operation},
};

/// Opaque, globally unique booking identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct BookingId(Uuid);

impl BookingId {
    /// Generate a fresh random identifier
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for BookingId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Identifier of the provider attached to a booking
pub type ProviderId = String;

/// A service booking together with its full audit history.
///
/// Values handed out by the engine are snapshots: mutating a clone does not
/// affect the registry, and the fields can only be changed through the engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Immutable identifier
    id: BookingId,
    /// Customer who requested the service
    customer_name: String,
    /// Kind of service requested
    service_type: String,
    /// Current lifecycle status
    status: BookingStatus,
    /// Provider handling the booking, if any
    provider_id: Option<ProviderId>,
    /// Every status change, oldest first
    history: History,
}

impl Booking {
    /// Create a pending booking with its creation entry already recorded
    pub(crate) fn new(id: BookingId, customer_name: String, service_type: String) -> Self {
        let mut history = History::new();
        history.append(None, BookingStatus::Pending, Actor::System);
        Self {
            id,
            customer_name,
            service_type,
            status: BookingStatus::Pending,
            provider_id: None,
            history,
        }
    }

    /// Move to `to`, recording the change in the history in the same step
    pub(crate) fn transition(&mut self, to: BookingStatus, by: Actor) {
        self.history.append(Some(self.status), to, by);
        self.status = to;
    }

    /// Attach or clear the provider
    pub(crate) fn set_provider(&mut self, provider_id: Option<ProviderId>) {
        self.provider_id = provider_id;
    }

    /// Check the lifecycle invariants of a booking that did not come from
    /// the engine, such as one decoded from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns a description of the first broken invariant.
    pub fn check_invariants(&self) -> Result<(), String> {
        let Some(first) = self.history.entries().first() else {
            return Err("history is empty".to_string());
        };
        if first.from.is_some() {
            return Err("first history entry must have no prior status".to_string());
        }
        if first.to != BookingStatus::Pending {
            return Err(format!("booking was created as {} instead of PENDING", first.to));
        }
        if first.by != Actor::System {
            return Err(format!("booking was created by {} instead of SYSTEM", first.by));
        }

        let mut previous: &HistoryEntry = first;
        for entry in self.history.iter().skip(1) {
            if entry.from != Some(previous.to) {
                return Err(format!(
                    "history entry from {:?} does not follow {}",
                    entry.from, previous.to
                ));
            }
            if entry.at < previous.at {
                return Err("history timestamps go backwards".to_string());
            }
            // Anything outside the ordinary table must have come through the override
            if entry.by != Actor::Admin
                && Operation::explaining(previous.to, entry.to, entry.by).is_none()
            {
                return Err(format!(
                    "{} -> {} by {} is not an ordinary transition",
                    previous.to, entry.to, entry.by
                ));
            }
            previous = entry;
        }

        if previous.to != self.status {
            return Err(format!(
                "status {} does not match last history entry {}",
                self.status, previous.to
            ));
        }
        Ok(())
    }

    /// The booking's identifier
    #[must_use]
    pub const fn id(&self) -> BookingId {
        self.id
    }

    /// Name of the customer
    #[must_use]
    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    /// Requested service type
    #[must_use]
    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    /// Current status; always equal to the last history entry's `to`
    #[must_use]
    pub const fn status(&self) -> BookingStatus {
        self.status
    }

    /// Assigned provider
    #[must_use]
    pub fn provider_id(&self) -> Option<&str> {
        self.provider_id.as_deref()
    }

    /// Full audit history
    #[must_use]
    pub const fn history(&self) -> &History {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> Booking {
        Booking::new(BookingId::new(), "Alice".to_string(), "Plumbing".to_string())
    }

    #[test]
    fn new_booking_has_a_single_creation_entry() {
        let booking = pending();
        assert_eq!(booking.status(), BookingStatus::Pending);
        assert_eq!(booking.provider_id(), None);
        assert_eq!(booking.history().len(), 1);

        let first = booking.history().last().cloned();
        assert_eq!(first.as_ref().and_then(|e| e.from), None);
        assert_eq!(first.as_ref().map(|e| e.by), Some(Actor::System));
        assert!(booking.check_invariants().is_ok());
    }

    #[test]
    fn transition_keeps_status_and_history_in_step() {
        let mut booking = pending();
        booking.transition(BookingStatus::Assigned, Actor::System);
        booking.transition(BookingStatus::Assigned, Actor::Admin);

        assert_eq!(booking.status(), BookingStatus::Assigned);
        assert_eq!(booking.history().len(), 3);
        let last = booking.history().last().cloned();
        assert_eq!(last.as_ref().and_then(|e| e.from), Some(BookingStatus::Assigned));
        assert!(booking.check_invariants().is_ok());
    }

    #[test]
    fn invariant_check_catches_status_drift() {
        let mut booking = pending();
        booking.status = BookingStatus::Completed;
        assert!(booking.check_invariants().is_err());
    }

    #[test]
    fn invariant_check_catches_transitions_outside_the_table() {
        let mut booking = pending();
        booking.transition(BookingStatus::Completed, Actor::Customer);
        assert!(booking.check_invariants().is_err());

        let mut booking = pending();
        booking.transition(BookingStatus::Assigned, Actor::Provider);
        assert!(booking.check_invariants().is_err());

        let mut booking = pending();
        booking.transition(BookingStatus::Completed, Actor::Admin);
        booking.transition(BookingStatus::Cancelled, Actor::Customer);
        assert!(booking.check_invariants().is_ok());
    }

    #[test]
    fn invariant_check_catches_empty_history() {
        let mut booking = pending();
        booking.history = History::new();
        assert!(booking.check_invariants().is_err());
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let value = serde_json::to_value(pending()).unwrap_or_default();
        assert_eq!(value.get("customerName").and_then(|v| v.as_str()), Some("Alice"));
        assert_eq!(value.get("serviceType").and_then(|v| v.as_str()), Some("Plumbing"));
        assert_eq!(value.get("status").and_then(|v| v.as_str()), Some("PENDING"));
        assert_eq!(value.get("providerId"), Some(&serde_json::Value::Null));
        assert_eq!(value.get("history").and_then(|v| v.as_array()).map(Vec::len), Some(1));
    }

    #[test]
    fn ids_round_trip_through_strings() {
        let id = BookingId::new();
        assert_eq!(id.to_string().parse::<BookingId>().ok(), Some(id));
        assert!("not-a-uuid".parse::<BookingId>().is_err());
    }
}
