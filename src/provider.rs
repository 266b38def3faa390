//! Provider selection for the assignment step.

use crate::booking::{Booking, ProviderId};

/// Provider id used when nothing else is configured
pub const DEFAULT_PROVIDER: &str = "PROVIDER_1";

/// Chooses the provider attached to a booking when it is assigned
pub trait ProviderSelector: Send + Sync {
    /// Pick a provider for a pending booking
    fn select(&self, booking: &Booking) -> ProviderId;
}

/// Always assigns the same provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedProvider(ProviderId);

impl FixedProvider {
    /// Assign every booking to `provider_id`
    #[must_use]
    pub fn new(provider_id: impl Into<ProviderId>) -> Self {
        Self(provider_id.into())
    }
}

impl Default for FixedProvider {
    fn default() -> Self {
        Self::new(DEFAULT_PROVIDER)
    }
}

impl ProviderSelector for FixedProvider {
    fn select(&self, _booking: &Booking) -> ProviderId {
        self.0.clone()
    }
}

impl<F> ProviderSelector for F
where
    F: Fn(&Booking) -> ProviderId + Send + Sync,
{
    fn select(&self, booking: &Booking) -> ProviderId {
        (self)(booking)
    }
}
