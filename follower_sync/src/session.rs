//! Presentation state for one tracker view
//!
//! [`TrackerSession`] owns what a screen shows: the page cursor, the alert
//! banner and the derived view of the current store generation. Components
//! below it return plain values and never touch this state themselves.

use crate::config::TrackerConfig;
use crate::data::StoreSnapshot;
use crate::error::{RemoteError, Result, TrackerError};
use crate::export;
use crate::forecast::{ForecastOutcome, ForecastRequester};
use crate::insights::{InsightsAggregator, InsightsReport};
use crate::remote::{AlertSource, ChangelogRelease, RemoteCollaborator};
use crate::sync::{ClearOutcome, Confirmation, MutationPhase, Settled, SyncCoordinator};
use growth_math::{DerivedEntry, Entry, Page, PageCursor};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What the alert banner currently knows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AlertState {
    /// Not loaded yet
    #[default]
    Pending,
    /// No alert is active
    Quiet,
    Active(String),
    /// The last alert request failed
    Unavailable(RemoteError),
}

impl AlertState {
    pub fn text(&self) -> Option<&str> {
        match self {
            AlertState::Active(text) => Some(text),
            _ => None,
        }
    }

    fn from_fetch(alert: Option<String>) -> Self {
        match alert {
            Some(text) => AlertState::Active(text),
            None => AlertState::Quiet,
        }
    }
}

/// How the initial load went. Each half settles independently.
#[derive(Debug, Default)]
pub struct MountReport {
    pub entries_loaded: bool,
    pub alert_loaded: bool,
    pub failures: Vec<TrackerError>,
}

impl MountReport {
    pub fn is_complete(&self) -> bool {
        self.entries_loaded && self.alert_loaded
    }
}

/// Derived entries cached for one store generation
#[derive(Debug, Default)]
struct DerivedView {
    generation: u64,
    entries: Vec<DerivedEntry>,
}

/// One page of the table, with deltas computed over the whole series
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub page: Page,
    pub rows: Vec<DerivedEntry>,
}

pub struct TrackerSession<R: ?Sized> {
    coordinator: SyncCoordinator<R>,
    forecaster: ForecastRequester<R>,
    aggregator: InsightsAggregator<R>,
    alert_source: AlertSource,
    alert: AlertState,
    cursor: PageCursor,
    derived: Option<DerivedView>,
    token: CancellationToken,
}

impl<R> TrackerSession<R>
where
    R: RemoteCollaborator + ?Sized,
{
    pub fn new(remote: Arc<R>, config: &TrackerConfig) -> Result<Self> {
        let threshold = config.sample_threshold;
        Ok(Self {
            coordinator: SyncCoordinator::new(Arc::clone(&remote)),
            forecaster: ForecastRequester::new(Arc::clone(&remote), threshold),
            aggregator: InsightsAggregator::new(remote, threshold),
            alert_source: AlertSource::default(),
            alert: AlertState::default(),
            cursor: PageCursor::new(config.page_size)?,
            derived: None,
            token: CancellationToken::new(),
        })
    }

    /// Read alerts from `source` for the banner and for insights
    pub fn with_alert_source(mut self, source: AlertSource) -> Self {
        self.alert_source = source;
        self.aggregator = self.aggregator.with_alert_source(source);
        self
    }

    /// Load entries and the alert banner together.
    ///
    /// The two requests are independent; a failure in one leaves the other's
    /// result in place.
    pub async fn mount(&mut self) -> MountReport {
        info!("mounting tracker view");
        let (entries, alert) = tokio::join!(
            self.coordinator.refresh(&self.token),
            self.aggregator.fetch_alert(self.alert_source, &self.token)
        );

        let mut report = MountReport::default();
        match entries {
            Ok(snapshot) => {
                self.cursor.set_total(snapshot.total_entries());
                report.entries_loaded = true;
            }
            Err(e) => {
                warn!(error = %e, "initial entry load failed");
                report.failures.push(e);
            }
        }
        match alert {
            Ok(text) => {
                self.alert = AlertState::from_fetch(text);
                report.alert_loaded = true;
            }
            Err(e) => {
                if let TrackerError::Remote(remote) = &e {
                    self.alert = AlertState::Unavailable(remote.clone());
                }
                report.failures.push(e);
            }
        }
        report
    }

    /// Close the view. Responses still in flight are discarded on arrival.
    pub fn unmount(&self) {
        debug!("unmounting tracker view");
        self.token.cancel();
    }

    pub fn is_mounted(&self) -> bool {
        !self.token.is_cancelled()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.coordinator.snapshot()
    }

    pub fn alert(&self) -> &AlertState {
        &self.alert
    }

    pub fn phase(&self) -> MutationPhase {
        self.coordinator.phase()
    }

    /// Deltas for the whole series, recomputed when the store has been replaced
    pub fn derived(&mut self) -> &[DerivedEntry] {
        let snapshot = self.coordinator.snapshot();
        let stale = self
            .derived
            .as_ref()
            .map_or(true, |view| view.generation != snapshot.generation());
        if stale {
            self.derived = Some(DerivedView {
                generation: snapshot.generation(),
                entries: snapshot.derived(),
            });
        }
        self.derived
            .as_ref()
            .map(|view| view.entries.as_slice())
            .unwrap_or(&[])
    }

    pub fn current_page(&mut self) -> PageView {
        let total = self.coordinator.snapshot().total_entries();
        self.cursor.set_total(total);
        let cursor = self.cursor.clone();
        let rows = cursor.slice(self.derived()).to_vec();
        PageView {
            page: cursor.current(),
            rows,
        }
    }

    pub fn next_page(&mut self) -> usize {
        self.cursor.next_page()
    }

    pub fn prev_page(&mut self) -> usize {
        self.cursor.prev_page()
    }

    pub fn go_to_page(&mut self, page_number: usize) -> usize {
        self.cursor.go_to(page_number)
    }

    /// Reload entries on demand
    pub async fn refresh(&mut self) -> Result<StoreSnapshot> {
        let snapshot = self.coordinator.refresh(&self.token).await?;
        self.cursor.set_total(snapshot.total_entries());
        Ok(snapshot)
    }

    pub async fn add(&mut self, date: &str, count: &str) -> Result<Settled> {
        let settled = self.coordinator.add(date, count).await?;
        self.after_mutation(&settled);
        Ok(settled)
    }

    pub async fn add_entry(&mut self, entry: Entry) -> Result<Settled> {
        let settled = self.coordinator.add_entry(entry).await?;
        self.after_mutation(&settled);
        Ok(settled)
    }

    pub async fn upsert(&mut self, date: &str, count: &str) -> Result<Settled> {
        let settled = self.coordinator.upsert(date, count).await?;
        self.after_mutation(&settled);
        Ok(settled)
    }

    pub async fn update(
        &mut self,
        original_date: &str,
        new_date: &str,
        new_count: &str,
    ) -> Result<Settled> {
        let settled = self
            .coordinator
            .update(original_date, new_date, new_count)
            .await?;
        self.after_mutation(&settled);
        Ok(settled)
    }

    pub async fn delete(&mut self, date: &str) -> Result<Settled> {
        let settled = self.coordinator.delete(date).await?;
        self.after_mutation(&settled);
        Ok(settled)
    }

    pub async fn clear_all<C>(&mut self, confirmation: &C) -> Result<ClearOutcome>
    where
        C: Confirmation + ?Sized,
    {
        let outcome = self.coordinator.clear_all(confirmation).await?;
        if outcome == ClearOutcome::Cleared {
            self.cursor.set_total(0);
            self.cursor.go_to(1);
        }
        Ok(outcome)
    }

    pub async fn forecast(&self, days: u32) -> Result<ForecastOutcome> {
        self.forecaster
            .forecast(self.coordinator.sample_count(), days, &self.token)
            .await
    }

    /// Aggregate insights, reusing the banner's alert when one is showing
    pub async fn insights(&mut self) -> Result<InsightsReport> {
        let cached = self.alert.text().map(str::to_string);
        let report = self
            .aggregator
            .insights(self.coordinator.sample_count(), cached.as_deref(), &self.token)
            .await?;
        if cached.is_none() {
            if let Some(text) = &report.alert {
                self.alert = AlertState::Active(text.clone());
            }
        }
        Ok(report)
    }

    /// Re-read the alert banner from `source`
    pub async fn refresh_alert(&mut self, source: AlertSource) -> Result<&AlertState> {
        match self.aggregator.fetch_alert(source, &self.token).await {
            Ok(text) => self.alert = AlertState::from_fetch(text),
            Err(TrackerError::Remote(e)) => {
                self.alert = AlertState::Unavailable(e.clone());
                return Err(TrackerError::Remote(e));
            }
            Err(e) => return Err(e),
        }
        Ok(&self.alert)
    }

    pub async fn changelog(&self) -> Result<Vec<ChangelogRelease>> {
        let reply = self.coordinator.remote().changelog().await;
        if self.token.is_cancelled() {
            return Err(TrackerError::Cancelled);
        }
        Ok(reply?)
    }

    pub fn export_url(&self) -> Result<String> {
        export::export_url(self.coordinator.remote().as_ref())
    }

    /// Retrieve the export resource as entries
    pub async fn download(&self) -> Result<Vec<Entry>> {
        export::download(self.coordinator.remote().as_ref()).await
    }

    fn after_mutation(&mut self, settled: &Settled) {
        if let Settled::Refreshed(snapshot) = settled {
            self.cursor.set_total(snapshot.total_entries());
        }
    }
}
