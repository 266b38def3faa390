use tracing::info;

use crate::{booking::Booking, history::HistoryEntry, status::BookingStatus};

/// Trait for transition observation
pub trait TransitionObserver: Send + Sync {
    /// Called after a transition has been applied and recorded.
    ///
    /// `booking` is the snapshot taken right after the change and `entry` is
    /// the history entry that was appended for it.
    ///
    /// Observers run after the booking's lock has been released. When several
    /// threads change the same booking at once, notifications for it can
    /// arrive in a different order than the entries appear in its history.
    /// Each `entry` is still the last one of the `booking` it comes with, and
    /// [`Booking::history`] is the authoritative order.
    fn on_transition(&self, booking: &Booking, entry: &HistoryEntry);
}

/// Logs every transition through `tracing`
#[derive(Debug, Default)]
pub struct TransitionLogger;

impl TransitionObserver for TransitionLogger {
    fn on_transition(&self, booking: &Booking, entry: &HistoryEntry) {
        let from = entry.from.map_or("-", BookingStatus::as_str);
        info!(
            booking_id = %booking.id(),
            from,
            to = %entry.to,
            by = %entry.by,
            history_len = booking.history().len(),
            "booking transition"
        );
    }
}

/// Announces bookings that reach an outcome
#[derive(Debug, Default)]
pub struct OutcomeNotifier;

impl TransitionObserver for OutcomeNotifier {
    fn on_transition(&self, booking: &Booking, entry: &HistoryEntry) {
        match entry.to {
            BookingStatus::Completed => {
                info!(booking_id = %booking.id(), customer = booking.customer_name(), "booking completed");
            }
            BookingStatus::Cancelled => {
                info!(booking_id = %booking.id(), by = %entry.by, "booking cancelled");
            }
            BookingStatus::Failed => {
                info!(
                    booking_id = %booking.id(),
                    provider = booking.provider_id().unwrap_or("-"),
                    "booking failed, eligible for retry"
                );
            }
            BookingStatus::Pending | BookingStatus::Assigned | BookingStatus::InProgress => {}
        }
    }
}
