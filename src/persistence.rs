use std::{fs, path::Path};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{booking::Booking, error::SnapshotError};

/// Version written into every snapshot
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable image of the booking registry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Format version
    version: u32,
    /// When the snapshot was taken
    taken_at: DateTime<Utc>,
    /// Bookings in creation order
    bookings: Vec<Booking>,
}

impl Snapshot {
    /// Wrap `bookings`, stamped with the current time
    #[must_use]
    pub fn new(bookings: Vec<Booking>) -> Self {
        Self { version: SNAPSHOT_VERSION, taken_at: Utc::now(), bookings }
    }

    /// Bookings held by the snapshot
    #[must_use]
    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    /// When the snapshot was taken
    #[must_use]
    pub const fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// Consume the snapshot, yielding its bookings
    #[must_use]
    pub fn into_bookings(self) -> Vec<Booking> {
        self.bookings
    }

    /// Save the snapshot to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be serialized or the file
    /// cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let serialized = serde_json::to_string_pretty(self)?;
        info!(path = %path.display(), bookings = self.bookings.len(), "saving snapshot");
        fs::write(path, serialized)?;
        Ok(())
    }

    /// Load a snapshot from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, does not contain a
    /// snapshot, or was written with another format version.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading snapshot");
        let contents = fs::read_to_string(path)?;
        let snapshot: Self = serde_json::from_str(&contents)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(snapshot.version));
        }
        Ok(snapshot)
    }
}
