//! Transport-neutral commands.
//!
//! A transport binds its request bodies to [`Command`] with serde and hands
//! them to [`BookingEngine::execute`](crate::engine::BookingEngine::execute).

use serde::{Deserialize, Serialize};

use crate::booking::BookingId;

/// One mutating call on the engine
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    /// Register a new booking
    Create {
        /// Customer who requested the service
        customer_name: String,
        /// Kind of service requested
        service_type: String,
    },
    /// Attach a provider
    Assign {
        /// Target booking
        id: BookingId,
    },
    /// Provider accepts
    Accept {
        /// Target booking
        id: BookingId,
    },
    /// Provider rejects
    Reject {
        /// Target booking
        id: BookingId,
    },
    /// Provider completes
    Complete {
        /// Target booking
        id: BookingId,
    },
    /// Customer cancels
    Cancel {
        /// Target booking
        id: BookingId,
    },
    /// Failed booking goes back to pending
    Retry {
        /// Target booking
        id: BookingId,
    },
    /// Administrative override to any status.
    ///
    /// The status is kept as the raw name so an unknown value surfaces as
    /// `InvalidStatus` from the engine instead of a decoding error.
    Override {
        /// Target booking
        id: BookingId,
        /// Requested status name
        status: String,
    },
}
