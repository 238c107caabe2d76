//! Mutation coordinator
//!
//! [`SyncCoordinator`] is the only code that changes the [`EntryStore`]. Every
//! accepted mutation is followed by a full refresh from the service; nothing
//! is patched locally. Mutations are serialized: while one is being submitted
//! the next is refused with [`TrackerError::MutationInFlight`].

use crate::data::{EntryStore, FetchedEntries, StoreSnapshot};
use crate::error::{RemoteError, Result, TrackerError};
use crate::remote::{PageRequest, RemoteCollaborator};
use crate::validate;
use chrono::NaiveDate;
use growth_math::{page_count, Entry};
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const CLEAR_ALL_PROMPT: &str =
    "Are you sure you want to delete all data? This action cannot be undone.";

/// Whether a mutation is currently being submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPhase {
    Idle,
    Submitting,
}

/// How an accepted mutation settled
#[derive(Debug, Clone, PartialEq)]
pub enum Settled {
    /// The service accepted the change and the store was reloaded
    Refreshed(StoreSnapshot),
    /// The service accepted the change but the reload failed; the store still
    /// shows the state from before the change
    Stale(RemoteError),
}

impl Settled {
    pub fn is_refreshed(&self) -> bool {
        matches!(self, Settled::Refreshed(_))
    }
}

/// Result of a clear-all request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    Cleared,
    /// The user declined; nothing was sent
    Declined,
}

/// Asks the user to confirm a destructive action
pub trait Confirmation {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirmation for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

pub struct SyncCoordinator<R: ?Sized> {
    remote: Arc<R>,
    store: RwLock<EntryStore>,
    gate: Mutex<()>,
}

impl<R> SyncCoordinator<R>
where
    R: RemoteCollaborator + ?Sized,
{
    pub fn new(remote: Arc<R>) -> Self {
        Self {
            remote,
            store: RwLock::new(EntryStore::new()),
            gate: Mutex::new(()),
        }
    }

    pub fn remote(&self) -> &Arc<R> {
        &self.remote
    }

    /// Read-only view of the current store
    pub fn snapshot(&self) -> StoreSnapshot {
        self.store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    /// Number of observations currently held
    pub fn sample_count(&self) -> usize {
        self.store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn phase(&self) -> MutationPhase {
        match self.gate.try_lock() {
            Ok(_) => MutationPhase::Idle,
            Err(_) => MutationPhase::Submitting,
        }
    }

    /// Reload the store from the service.
    ///
    /// Waits for any in-flight mutation to settle first, but does not itself
    /// count as one. The response is dropped if `token` was cancelled while the
    /// request was outstanding, and is not applied over a listing that a
    /// mutation stored in the meantime.
    pub async fn refresh(&self, token: &CancellationToken) -> Result<StoreSnapshot> {
        drop(self.gate.lock().await);
        let seen = self.store.read().unwrap_or_else(PoisonError::into_inner).generation();

        let reply = self.load().await;
        if token.is_cancelled() {
            debug!("discarding entry listing for a closed view");
            return Err(TrackerError::Cancelled);
        }
        Ok(self.apply_if_current(reply?, seen))
    }

    /// Add an entry from form input.
    ///
    /// Always attempts a create; the service decides whether the date is a
    /// duplicate. Use [`SyncCoordinator::upsert`] to overwrite instead.
    pub async fn add(&self, date: &str, count: &str) -> Result<Settled> {
        let entry = validate::new_entry(date, count)?;
        self.create(entry).await
    }

    /// Add an already-typed entry. The count must be positive.
    pub async fn add_entry(&self, entry: Entry) -> Result<Settled> {
        let entry = validate::checked_entry(entry)?;
        self.create(entry).await
    }

    /// Replace the entry keyed by `original_date` with a new date and count
    pub async fn update(&self, original_date: &str, new_date: &str, new_count: &str) -> Result<Settled> {
        let original = validate::require_date(original_date)?;
        let replacement = validate::replacement_entry(new_date, new_count)?;

        let guard = self.begin()?;
        self.remote
            .update_entry(original, replacement)
            .await
            .map_err(|e| log_failure("update", e))?;
        info!(%original, date = %replacement.date, count = replacement.count, "entry updated");

        Ok(self.settle(guard).await)
    }

    /// Write an entry, updating in place when the store already has its date
    pub async fn upsert(&self, date: &str, count: &str) -> Result<Settled> {
        let entry = validate::new_entry(date, count)?;
        let existing = self.snapshot().find(entry.date).copied();

        let guard = self.begin()?;
        match existing {
            Some(current) => {
                self.remote
                    .update_entry(current.date, entry)
                    .await
                    .map_err(|e| log_failure("update", e))?;
                info!(date = %entry.date, count = entry.count, "entry overwritten");
            }
            None => {
                self.remote
                    .create_entry(entry)
                    .await
                    .map_err(|e| log_failure("create", e))?;
                info!(date = %entry.date, count = entry.count, "entry created");
            }
        }

        Ok(self.settle(guard).await)
    }

    /// Delete the entry for `date`. Deleting a date the service no longer has
    /// counts as success.
    pub async fn delete(&self, date: &str) -> Result<Settled> {
        let date = validate::require_date(date)?;

        let guard = self.begin()?;
        match self.remote.delete_entry(date).await {
            Ok(()) => info!(%date, "entry deleted"),
            Err(RemoteError::NotFound(_)) => info!(%date, "entry already gone"),
            Err(e) => return Err(log_failure("delete", e)),
        }

        Ok(self.settle(guard).await)
    }

    /// Delete every entry after the user confirms.
    ///
    /// On success the store is emptied directly without a reload.
    pub async fn clear_all<C>(&self, confirmation: &C) -> Result<ClearOutcome>
    where
        C: Confirmation + ?Sized,
    {
        if !confirmation.confirm(CLEAR_ALL_PROMPT) {
            info!("clear all declined");
            return Ok(ClearOutcome::Declined);
        }

        let _guard = self.begin()?;
        self.remote
            .clear_all()
            .await
            .map_err(|e| log_failure("clear", e))?;

        self.store
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        info!("all entries cleared");
        Ok(ClearOutcome::Cleared)
    }

    async fn create(&self, entry: Entry) -> Result<Settled> {
        let guard = self.begin()?;
        self.remote
            .create_entry(entry)
            .await
            .map_err(|e| log_failure("create", e))?;
        info!(date = %entry.date, count = entry.count, "entry created");

        Ok(self.settle(guard).await)
    }

    fn begin(&self) -> Result<MutexGuard<'_, ()>> {
        self.gate.try_lock().map_err(|_| TrackerError::MutationInFlight)
    }

    // Reload while still holding the mutation guard so the refresh is ordered
    // after the mutation that triggered it.
    async fn settle(&self, _guard: MutexGuard<'_, ()>) -> Settled {
        match self.load().await {
            Ok(fetched) => Settled::Refreshed(self.apply(fetched)),
            Err(e) => {
                warn!(error = %e, "change saved but reloading entries failed");
                Settled::Stale(e)
            }
        }
    }

    /// Fetch the whole series. A paginating service is walked page by page
    /// until the reported total has been collected.
    async fn load(&self) -> std::result::Result<FetchedEntries, RemoteError> {
        let first = self.remote.fetch_entries(None).await?;
        let total = match first.total_entries {
            Some(total) if !first.entries.is_empty() && first.entries.len() < total => total,
            _ => return Ok(first),
        };

        let page_size = first.entries.len();
        let pages = page_count(total, page_size).map_err(|e| RemoteError::Contract(e.to_string()))?;
        let mut seen: HashSet<NaiveDate> = first.entries.iter().map(|e| e.date).collect();
        let mut entries = first.entries;

        for page_number in 2..=pages {
            let next = self
                .remote
                .fetch_entries(Some(PageRequest {
                    page_number,
                    page_size,
                }))
                .await?;
            if next.entries.is_empty() {
                break;
            }
            entries.extend(next.entries.into_iter().filter(|e| seen.insert(e.date)));
        }

        if entries.len() != total {
            warn!(total, received = entries.len(), "paged listing does not add up to its total");
        }
        debug!(pages, entries = entries.len(), "paged listing collected");
        Ok(FetchedEntries {
            entries,
            total_entries: Some(total),
        })
    }

    fn apply_if_current(&self, fetched: FetchedEntries, seen: u64) -> StoreSnapshot {
        let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
        if store.generation() != seen {
            debug!(seen, current = store.generation(), "newer listing already stored");
            return store.snapshot();
        }
        store.replace(fetched);
        debug!(entries = store.len(), generation = store.generation(), "store replaced");
        store.snapshot()
    }

    fn apply(&self, fetched: FetchedEntries) -> StoreSnapshot {
        let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
        store.replace(fetched);
        debug!(entries = store.len(), generation = store.generation(), "store replaced");
        store.snapshot()
    }
}

fn log_failure(action: &str, err: RemoteError) -> TrackerError {
    warn!(action, error = %err, transient = err.is_transient(), "mutation rejected");
    TrackerError::Remote(err)
}
