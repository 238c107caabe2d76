//! Entry store and the wire shapes of the entry listing

use growth_math::deltas::sort_chronologically;
use growth_math::{compute, DerivedEntry, Entry};
use serde::Deserialize;
use std::ops::Deref;
use std::sync::Arc;

/// Result of fetching the entry listing
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchedEntries {
    pub entries: Vec<Entry>,
    /// Server-reported total when the listing is paginated
    pub total_entries: Option<usize>,
}

impl FetchedEntries {
    pub fn flat(entries: Vec<Entry>) -> Self {
        Self {
            entries,
            total_entries: None,
        }
    }
}

/// Entry listing as returned by the service, either a bare array or a page envelope
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum EntriesPayload {
    Paged {
        entries: Vec<Entry>,
        #[serde(alias = "totalEntries")]
        total_entries: usize,
    },
    Flat(Vec<Entry>),
}

impl From<EntriesPayload> for FetchedEntries {
    fn from(payload: EntriesPayload) -> Self {
        match payload {
            EntriesPayload::Paged {
                entries,
                total_entries,
            } => Self {
                entries,
                total_entries: Some(total_entries),
            },
            EntriesPayload::Flat(entries) => Self::flat(entries),
        }
    }
}

/// Read-only view of the store at one generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSnapshot {
    entries: Arc<[Entry]>,
    total_entries: Option<usize>,
    generation: u64,
}

impl StoreSnapshot {
    /// Store generation this view was taken from
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Series length for pagination: the server-reported total when known
    pub fn total_entries(&self) -> usize {
        self.total_entries.unwrap_or(self.entries.len())
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Day-over-day deltas for this view
    pub fn derived(&self) -> Vec<DerivedEntry> {
        compute(&self.entries)
    }

    /// Look up the entry recorded for `date`
    pub fn find(&self, date: chrono::NaiveDate) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.date == date)
    }
}

impl Deref for StoreSnapshot {
    type Target = [Entry];

    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}

/// Canonical in-memory series of observations.
///
/// Only ever replaced wholesale. Every replacement bumps the generation so
/// derived and paginated views can tell they are stale.
#[derive(Debug, Clone)]
pub struct EntryStore {
    entries: Arc<[Entry]>,
    total_entries: Option<usize>,
    generation: u64,
}

impl EntryStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::from(Vec::new()),
            total_entries: None,
            generation: 0,
        }
    }

    /// Replace the whole series. Entries are stored in ascending date order.
    pub(crate) fn replace(&mut self, fetched: FetchedEntries) {
        let sorted = sort_chronologically(&fetched.entries);
        self.entries = Arc::from(sorted);
        self.total_entries = fetched.total_entries;
        self.generation += 1;
    }

    pub(crate) fn clear(&mut self) {
        self.replace(FetchedEntries::default());
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            entries: Arc::clone(&self.entries),
            total_entries: self.total_entries,
            generation: self.generation,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Default for EntryStore {
    fn default() -> Self {
        Self::new()
    }
}
