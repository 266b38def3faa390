use std::{
    collections::BTreeMap,
    fmt,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use dashmap::{DashMap, mapref::entry::Entry};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{
    booking::{Booking, BookingId},
    command::Command,
    config::EngineConfig,
    error::{BookingError, SnapshotError},
    history::HistoryEntry,
    observers::{OutcomeNotifier, TransitionLogger, TransitionObserver},
    persistence::Snapshot,
    provider::{FixedProvider, ProviderSelector},
    status::BookingStatus,
    transition::{Actor, Operation},
};

/// Registry entry for one booking
#[derive(Debug)]
struct Slot {
    /// Creation order, used to list bookings deterministically
    seq: u64,
    /// The booking; the lock is the critical section for every operation on it
    booking: Mutex<Booking>,
}

/// Booking lifecycle engine.
///
/// Owns every booking, enforces the transition table and records each change
/// in the booking's history. Each booking is guarded by its own lock, so
/// operations on different bookings run in parallel while operations on the
/// same booking are serialized.
pub struct BookingEngine {
    /// All known bookings
    bookings: DashMap<BookingId, Arc<Slot>>,
    /// Next creation sequence number
    next_seq: AtomicU64,
    /// Chooses the provider during `assign`
    provider_selector: Box<dyn ProviderSelector>,
    /// Registered transition observers
    observers: Vec<Box<dyn TransitionObserver>>,
}

impl fmt::Debug for BookingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookingEngine")
            .field("bookings", &self.bookings.len())
            .field("next_seq", &self.next_seq)
            .field("observers_count", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl Default for BookingEngine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl BookingEngine {
    /// Create an empty engine
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        let mut engine = Self {
            bookings: DashMap::new(),
            next_seq: AtomicU64::new(0),
            provider_selector: Box::new(FixedProvider::new(config.default_provider.clone())),
            observers: Vec::new(),
        };
        if config.builtin_observers {
            engine.register_observer(Box::new(TransitionLogger));
            engine.register_observer(Box::new(OutcomeNotifier));
        }
        engine
    }

    /// Replace the provider selection used by `assign`
    #[must_use]
    pub fn with_provider_selector(mut self, selector: impl ProviderSelector + 'static) -> Self {
        self.provider_selector = Box::new(selector);
        self
    }

    /// Register an observer to be notified of every recorded transition
    pub fn register_observer(&mut self, observer: Box<dyn TransitionObserver>) {
        self.observers.push(observer);
    }

    /// Register a new booking in `PENDING` with its creation entry
    pub fn create_booking(
        &self,
        customer_name: impl Into<String>,
        service_type: impl Into<String>,
    ) -> Booking {
        let customer_name = customer_name.into();
        let service_type = service_type.into();

        let snapshot = loop {
            let id = BookingId::new();
            if let Entry::Vacant(vacant) = self.bookings.entry(id) {
                let booking = Booking::new(id, customer_name.clone(), service_type.clone());
                let slot = Slot {
                    seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                    booking: Mutex::new(booking.clone()),
                };
                vacant.insert(Arc::new(slot));
                break booking;
            }
        };

        debug!(booking_id = %snapshot.id(), customer = snapshot.customer_name(), "booking created");
        self.notify(&snapshot);
        snapshot
    }

    /// Attach a provider to a pending booking
    ///
    /// # Errors
    ///
    /// `NotFound` if the booking does not exist, `InvalidState` unless it is
    /// `PENDING`.
    pub fn assign(&self, id: BookingId) -> Result<Booking, BookingError> {
        self.run(id, Operation::Assign)
    }

    /// Provider accepts an assigned booking
    ///
    /// # Errors
    ///
    /// `NotFound` if the booking does not exist, `InvalidState` unless it is
    /// `ASSIGNED`.
    pub fn accept(&self, id: BookingId) -> Result<Booking, BookingError> {
        self.run(id, Operation::Accept)
    }

    /// Provider rejects the booking; allowed from any status
    ///
    /// # Errors
    ///
    /// `NotFound` if the booking does not exist.
    pub fn reject(&self, id: BookingId) -> Result<Booking, BookingError> {
        self.run(id, Operation::Reject)
    }

    /// Provider completes an in-progress booking
    ///
    /// # Errors
    ///
    /// `NotFound` if the booking does not exist, `InvalidState` unless it is
    /// `IN_PROGRESS`.
    pub fn complete(&self, id: BookingId) -> Result<Booking, BookingError> {
        self.run(id, Operation::Complete)
    }

    /// Customer cancels the booking; allowed from any status
    ///
    /// # Errors
    ///
    /// `NotFound` if the booking does not exist.
    pub fn cancel(&self, id: BookingId) -> Result<Booking, BookingError> {
        self.run(id, Operation::Cancel)
    }

    /// Return a failed booking to `PENDING` and detach its provider
    ///
    /// # Errors
    ///
    /// `NotFound` if the booking does not exist, `InvalidState` unless it is
    /// `FAILED`.
    pub fn retry(&self, id: BookingId) -> Result<Booking, BookingError> {
        self.run(id, Operation::Retry)
    }

    /// Administrative override: set any status named by `status`, ignoring the
    /// transition table. The provider is left untouched.
    ///
    /// # Errors
    ///
    /// `NotFound` if the booking does not exist, `InvalidStatus` if `status`
    /// is not a known status name.
    pub fn override_status(&self, id: BookingId, status: &str) -> Result<Booking, BookingError> {
        let slot = self.slot(id)?;
        let target: BookingStatus = status.parse().inspect_err(|_| {
            warn!(booking_id = %id, status, "override rejected: unknown status");
        })?;
        self.force(&slot, target)
    }

    /// Typed form of [`override_status`](Self::override_status)
    ///
    /// # Errors
    ///
    /// `NotFound` if the booking does not exist.
    pub fn override_to(&self, id: BookingId, target: BookingStatus) -> Result<Booking, BookingError> {
        let slot = self.slot(id)?;
        self.force(&slot, target)
    }

    /// Fetch a snapshot of one booking
    ///
    /// # Errors
    ///
    /// `NotFound` if the booking does not exist.
    pub fn get(&self, id: BookingId) -> Result<Booking, BookingError> {
        let slot = self.slot(id)?;
        let booking = slot.booking.lock().clone();
        Ok(booking)
    }

    /// Snapshots of all bookings in creation order
    #[must_use]
    pub fn list(&self) -> Vec<Booking> {
        let mut slots: Vec<Arc<Slot>> =
            self.bookings.iter().map(|entry| Arc::clone(entry.value())).collect();
        slots.sort_by_key(|slot| slot.seq);
        slots.iter().map(|slot| slot.booking.lock().clone()).collect()
    }

    /// History entries of one booking, oldest first
    ///
    /// # Errors
    ///
    /// `NotFound` if the booking does not exist.
    pub fn history(&self, id: BookingId) -> Result<Vec<HistoryEntry>, BookingError> {
        let slot = self.slot(id)?;
        let entries = slot.booking.lock().history().entries().to_vec();
        Ok(entries)
    }

    /// Ordinary operations the booking's current status allows
    ///
    /// # Errors
    ///
    /// `NotFound` if the booking does not exist.
    pub fn available_operations(&self, id: BookingId) -> Result<Vec<Operation>, BookingError> {
        let status = self.slot(id)?.booking.lock().status();
        Ok(Operation::ON_EXISTING.into_iter().filter(|operation| operation.permits(status)).collect())
    }

    /// Number of bookings per status
    #[must_use]
    pub fn stats(&self) -> BTreeMap<BookingStatus, usize> {
        let mut counts = BTreeMap::new();
        for booking in self.list() {
            counts.entry(booking.status()).and_modify(|n: &mut usize| *n = n.saturating_add(1)).or_insert(1);
        }
        counts
    }

    /// Number of registered bookings
    #[must_use]
    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    /// Whether no booking has been created yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }

    /// Dispatch a transport-neutral command
    ///
    /// # Errors
    ///
    /// Whatever the underlying operation returns.
    pub fn execute(&self, command: Command) -> Result<Booking, BookingError> {
        match command {
            Command::Create { customer_name, service_type } => {
                Ok(self.create_booking(customer_name, service_type))
            }
            Command::Assign { id } => self.assign(id),
            Command::Accept { id } => self.accept(id),
            Command::Reject { id } => self.reject(id),
            Command::Complete { id } => self.complete(id),
            Command::Cancel { id } => self.cancel(id),
            Command::Retry { id } => self.retry(id),
            Command::Override { id, status } => self.override_status(id, &status),
        }
    }

    /// Capture every booking, in creation order
    #[must_use]
    pub fn export_snapshot(&self) -> Snapshot {
        Snapshot::new(self.list())
    }

    /// Build an engine holding the bookings of `snapshot`
    ///
    /// # Errors
    ///
    /// Returns an error if a booking breaks a lifecycle invariant or two
    /// bookings share an id.
    pub fn from_snapshot(snapshot: Snapshot, config: &EngineConfig) -> Result<Self, SnapshotError> {
        let engine = Self::new(config);
        for booking in snapshot.into_bookings() {
            booking
                .check_invariants()
                .map_err(|reason| SnapshotError::Inconsistent { id: booking.id(), reason })?;

            let id = booking.id();
            match engine.bookings.entry(id) {
                Entry::Occupied(_) => return Err(SnapshotError::DuplicateId(id)),
                Entry::Vacant(vacant) => {
                    let seq = engine.next_seq.fetch_add(1, Ordering::Relaxed);
                    vacant.insert(Arc::new(Slot { seq, booking: Mutex::new(booking) }));
                }
            }
        }
        debug!(bookings = engine.len(), "engine restored from snapshot");
        Ok(engine)
    }

    /// Write a snapshot of every booking to `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be encoded or written.
    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        self.export_snapshot().save(path)
    }

    /// Load an engine from a snapshot file written by
    /// [`save_snapshot`](Self::save_snapshot)
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded, or its content
    /// is inconsistent.
    pub fn load_snapshot(path: impl AsRef<Path>, config: &EngineConfig) -> Result<Self, SnapshotError> {
        Self::from_snapshot(Snapshot::load(path)?, config)
    }

    /// Look up the registry entry for `id`
    fn slot(&self, id: BookingId) -> Result<Arc<Slot>, BookingError> {
        self.bookings.get(&id).map(|entry| Arc::clone(entry.value())).ok_or_else(|| {
            debug!(booking_id = %id, "booking not found");
            BookingError::NotFound(id)
        })
    }

    /// Run an ordinary operation against an existing booking
    fn run(&self, id: BookingId, operation: Operation) -> Result<Booking, BookingError> {
        let slot = self.slot(id)?;
        self.apply(&slot, |booking| {
            let actual = booking.status();
            if !operation.permits(actual) {
                let expected = operation.requires();
                warn!(booking_id = %id, %operation, ?expected, %actual, "invalid state transition");
                return Err(BookingError::InvalidState { id, operation, expected, actual });
            }

            match operation {
                Operation::Assign => {
                    let provider = self.provider_selector.select(booking);
                    booking.set_provider(Some(provider));
                }
                Operation::Retry => booking.set_provider(None),
                Operation::Create
                | Operation::Accept
                | Operation::Reject
                | Operation::Complete
                | Operation::Cancel => {}
            }
            booking.transition(operation.target(), operation.actor());
            Ok(())
        })
    }

    /// Set `target` unconditionally as the administrator
    fn force(&self, slot: &Slot, target: BookingStatus) -> Result<Booking, BookingError> {
        self.apply(slot, |booking| {
            booking.transition(target, Actor::Admin);
            Ok(())
        })
    }

    /// Mutate a booking under its lock, then notify observers.
    ///
    /// `mutate` must validate before touching the booking so a failure leaves
    /// it unchanged.
    fn apply<F>(&self, slot: &Slot, mutate: F) -> Result<Booking, BookingError>
    where
        F: FnOnce(&mut Booking) -> Result<(), BookingError>,
    {
        let snapshot = {
            let mut booking = slot.booking.lock();
            mutate(&mut *booking)?;
            booking.clone()
        };
        // Unlocked: concurrent writers to this booking may notify out of history order
        self.notify(&snapshot);
        Ok(snapshot)
    }

    /// Tell every observer about the latest entry of `booking`
    fn notify(&self, booking: &Booking) {
        if let Some(entry) = booking.history().last() {
            for observer in &self.observers {
                observer.on_transition(booking, entry);
            }
        }
    }
}
