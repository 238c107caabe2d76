#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use follower_sync::data::FetchedEntries;
use follower_sync::remote::{
    ChangeItem, MilestoneEta, PageRequest, WireForecastPoint, WireInsights,
};
use follower_sync::{AlertSource, ChangelogRelease, RemoteCollaborator, RemoteError};
use growth_math::Entry;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

/// Per-endpoint request counters
#[derive(Default)]
pub struct Calls {
    pub fetch: AtomicUsize,
    pub create: AtomicUsize,
    pub update: AtomicUsize,
    pub delete: AtomicUsize,
    pub clear: AtomicUsize,
    pub forecast: AtomicUsize,
    pub insights: AtomicUsize,
    pub alert: AtomicUsize,
    pub changelog: AtomicUsize,
    pub export: AtomicUsize,
}

impl Calls {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn mutations(&self) -> usize {
        Self::get(&self.create) + Self::get(&self.update) + Self::get(&self.delete) + Self::get(&self.clear)
    }
}

/// In-memory tracker service
pub struct MockRemote {
    pub entries: Mutex<BTreeMap<NaiveDate, u64>>,
    pub calls: Calls,
    pub fail_mutations: Mutex<Option<RemoteError>>,
    pub fail_fetch: Mutex<Option<RemoteError>>,
    pub forecast_reply: Mutex<Option<Result<Vec<WireForecastPoint>, RemoteError>>>,
    pub insights_reply: Mutex<Result<WireInsights, RemoteError>>,
    pub alert_reply: Mutex<Result<Option<String>, RemoteError>>,
    pub last_alert_source: Mutex<Option<AlertSource>>,
    /// When set, the listing is served in pages of this size with a total
    pub page_size: Mutex<Option<usize>>,
    /// When set, create requests wait for `release` before answering
    pub hold_creates: AtomicBool,
    /// When set, the next listing request waits for `release`
    pub hold_next_fetch: AtomicBool,
    pub release: Notify,
}

impl MockRemote {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            calls: Calls::default(),
            fail_mutations: Mutex::new(None),
            fail_fetch: Mutex::new(None),
            forecast_reply: Mutex::new(None),
            insights_reply: Mutex::new(Ok(sample_insights())),
            alert_reply: Mutex::new(Ok(None)),
            last_alert_source: Mutex::new(None),
            page_size: Mutex::new(None),
            hold_creates: AtomicBool::new(false),
            hold_next_fetch: AtomicBool::new(false),
            release: Notify::new(),
        }
    }

    pub fn with_entries(entries: &[(&str, u64)]) -> Self {
        let remote = Self::new();
        {
            let mut stored = remote.entries.lock().unwrap();
            for (date, count) in entries {
                stored.insert(date.parse().unwrap(), *count);
            }
        }
        remote
    }

    /// `n` consecutive days starting 2024-01-01, growing by 10 a day
    pub fn with_series(n: usize) -> Self {
        let remote = Self::new();
        {
            let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            let mut stored = remote.entries.lock().unwrap();
            for i in 0..n {
                stored.insert(start + Duration::days(i as i64), 100 + 10 * i as u64);
            }
        }
        remote
    }

    pub fn stored(&self) -> Vec<Entry> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|(date, count)| Entry::new(*date, *count))
            .collect()
    }

    pub fn serve_pages_of(&self, size: usize) {
        *self.page_size.lock().unwrap() = Some(size);
    }

    pub fn fail_mutations_with(&self, err: RemoteError) {
        *self.fail_mutations.lock().unwrap() = Some(err);
    }

    pub fn fail_fetch_with(&self, err: RemoteError) {
        *self.fail_fetch.lock().unwrap() = Some(err);
    }

    pub fn reply_forecast(&self, reply: Result<Vec<WireForecastPoint>, RemoteError>) {
        *self.forecast_reply.lock().unwrap() = Some(reply);
    }

    pub fn reply_insights(&self, reply: Result<WireInsights, RemoteError>) {
        *self.insights_reply.lock().unwrap() = reply;
    }

    pub fn reply_alert(&self, reply: Result<Option<String>, RemoteError>) {
        *self.alert_reply.lock().unwrap() = reply;
    }

    fn mutation_failure(&self) -> Result<(), RemoteError> {
        match self.fail_mutations.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

pub fn sample_insights() -> WireInsights {
    WireInsights {
        current_followers: 480,
        next_milestone: 500,
        average_daily_growth: 4.5,
        progress_percentage: 96.0,
        estimated_days_to_milestone: MilestoneEta::Days(4),
    }
}

pub fn forecast_points(n: u32) -> Vec<WireForecastPoint> {
    let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
    (1..=n)
        .map(|day| WireForecastPoint {
            day: Some(day),
            date: start + Duration::days(day as i64 - 1),
            forecasted_count: 200.0 + day as f64 * 2.5,
        })
        .collect()
}

pub fn server_error() -> RemoteError {
    RemoteError::Status {
        status: 500,
        message: "Internal Server Error".to_string(),
    }
}

#[async_trait]
impl RemoteCollaborator for MockRemote {
    async fn fetch_entries(&self, page: Option<PageRequest>) -> Result<FetchedEntries, RemoteError> {
        self.calls.fetch.fetch_add(1, Ordering::SeqCst);
        if self.hold_next_fetch.swap(false, Ordering::SeqCst) {
            self.release.notified().await;
        }
        if let Some(err) = self.fail_fetch.lock().unwrap().clone() {
            return Err(err);
        }
        // Newest first, so the client has to restore ordering
        let mut entries = self.stored();
        entries.reverse();

        let configured = *self.page_size.lock().unwrap();
        let (page_number, page_size) = match (page, configured) {
            (Some(request), _) => (request.page_number, request.page_size),
            (None, Some(size)) => (1, size),
            (None, None) => return Ok(FetchedEntries::flat(entries)),
        };
        let total = entries.len();
        let rows = entries
            .into_iter()
            .skip((page_number - 1) * page_size)
            .take(page_size)
            .collect();
        Ok(FetchedEntries {
            entries: rows,
            total_entries: Some(total),
        })
    }

    async fn create_entry(&self, entry: Entry) -> Result<(), RemoteError> {
        self.calls.create.fetch_add(1, Ordering::SeqCst);
        if self.hold_creates.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        self.mutation_failure()?;

        let mut stored = self.entries.lock().unwrap();
        if stored.contains_key(&entry.date) {
            return Err(RemoteError::Status {
                status: 400,
                message: "Entry for this date already exists.".to_string(),
            });
        }
        stored.insert(entry.date, entry.count);
        Ok(())
    }

    async fn update_entry(&self, original: NaiveDate, replacement: Entry) -> Result<(), RemoteError> {
        self.calls.update.fetch_add(1, Ordering::SeqCst);
        self.mutation_failure()?;

        let mut stored = self.entries.lock().unwrap();
        if stored.remove(&original).is_none() {
            return Err(RemoteError::NotFound("Entry not found".to_string()));
        }
        stored.insert(replacement.date, replacement.count);
        Ok(())
    }

    async fn delete_entry(&self, date: NaiveDate) -> Result<(), RemoteError> {
        self.calls.delete.fetch_add(1, Ordering::SeqCst);
        self.mutation_failure()?;

        match self.entries.lock().unwrap().remove(&date) {
            Some(_) => Ok(()),
            None => Err(RemoteError::NotFound("Entry not found".to_string())),
        }
    }

    async fn clear_all(&self) -> Result<(), RemoteError> {
        self.calls.clear.fetch_add(1, Ordering::SeqCst);
        self.mutation_failure()?;
        self.entries.lock().unwrap().clear();
        Ok(())
    }

    async fn forecast(&self, days: u32) -> Result<Vec<WireForecastPoint>, RemoteError> {
        self.calls.forecast.fetch_add(1, Ordering::SeqCst);
        if let Some(reply) = self.forecast_reply.lock().unwrap().clone() {
            return reply;
        }
        if self.entries.lock().unwrap().len() <= 3 {
            return Err(RemoteError::Status {
                status: 400,
                message: "Not enough data to forecast".to_string(),
            });
        }
        Ok(forecast_points(days))
    }

    async fn insights(&self) -> Result<WireInsights, RemoteError> {
        self.calls.insights.fetch_add(1, Ordering::SeqCst);
        self.insights_reply.lock().unwrap().clone()
    }

    async fn alert(&self, source: AlertSource) -> Result<Option<String>, RemoteError> {
        self.calls.alert.fetch_add(1, Ordering::SeqCst);
        *self.last_alert_source.lock().unwrap() = Some(source);
        self.alert_reply.lock().unwrap().clone()
    }

    async fn changelog(&self) -> Result<Vec<ChangelogRelease>, RemoteError> {
        self.calls.changelog.fetch_add(1, Ordering::SeqCst);
        Ok(vec![ChangelogRelease {
            version: "1.1.0".to_string(),
            date: Some("2024-03-01".to_string()),
            changes: vec![
                ChangeItem {
                    text: "Detailed follower alerts".to_string(),
                    added: true,
                },
                ChangeItem {
                    text: "Legacy chart export".to_string(),
                    added: false,
                },
            ],
        }])
    }

    async fn export_csv(&self) -> Result<String, RemoteError> {
        self.calls.export.fetch_add(1, Ordering::SeqCst);
        let mut text = String::from("Date,Count\n");
        for entry in self.stored() {
            text.push_str(&format!("{},{}\n", entry.date, entry.count));
        }
        Ok(text)
    }

    fn export_url(&self) -> Option<String> {
        Some("http://tracker.test/download".to_string())
    }
}
