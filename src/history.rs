//! Append-only audit log of booking status changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{status::BookingStatus, transition::Actor};

/// One recorded status change
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HistoryEntry {
    /// Status before the change, `None` for the creation entry
    pub from: Option<BookingStatus>,
    /// Status after the change
    pub to: BookingStatus,
    /// Who triggered the change
    pub by: Actor,
    /// When the change was recorded
    pub at: DateTime<Utc>,
}

/// Ordered history of a single booking.
///
/// Entries can only be appended; nothing removes or reorders them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct History {
    /// Entries in the order they were appended
    entries: Vec<HistoryEntry>,
}

impl History {
    /// Create an empty history
    #[must_use]
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Record a transition stamped with the current time.
    ///
    /// The timestamp never precedes the previous entry's, so `at` is
    /// non-decreasing even if the wall clock steps backwards.
    pub(crate) fn append(&mut self, from: Option<BookingStatus>, to: BookingStatus, by: Actor) {
        let now = Utc::now();
        let at = self.last().map_or(now, |last| last.at.max(now));
        self.entries.push(HistoryEntry { from, to, by, at });
    }

    /// All entries, oldest first
    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// The most recent entry
    #[must_use]
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// Number of recorded entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries, oldest first
    pub fn iter(&self) -> std::slice::Iter<'_, HistoryEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a HistoryEntry;
    type IntoIter = std::slice::Iter<'a, HistoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
