//! The remote tracker service seam
//!
//! Everything the client needs from the service goes through
//! [`RemoteCollaborator`]. The HTTP implementation lives in [`http`]; tests use
//! in-memory implementations.

use crate::data::FetchedEntries;
use crate::error::RemoteError;
use async_trait::async_trait;
use chrono::NaiveDate;
use growth_math::Entry;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod http;

pub use http::HttpRemote;

/// Which alert feed to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertSource {
    /// Short "normal / unusual activity" alert
    #[default]
    Basic,
    /// Detailed activity alert (surge, loss, stagnation, pattern shift)
    Detailed,
}

impl AlertSource {
    pub fn path(&self) -> &'static str {
        match self {
            AlertSource::Basic => "alerts",
            AlertSource::Detailed => "follower-alerts",
        }
    }
}

/// Page of the entry listing to request from a paginating service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based
    pub page_number: usize,
    pub page_size: usize,
}

/// One forecast point as sent by the service, before normalization
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WireForecastPoint {
    #[serde(default, alias = "dayIndex", alias = "day_index")]
    pub day: Option<u32>,
    pub date: NaiveDate,
    #[serde(
        alias = "forecastedCount",
        alias = "projectedCount",
        alias = "projected_count",
        alias = "count"
    )]
    pub forecasted_count: f64,
}

/// Time left until the next milestone, numeric or free text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MilestoneEta {
    Days(i64),
    Fractional(f64),
    Text(String),
}

impl fmt::Display for MilestoneEta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MilestoneEta::Days(days) => write!(f, "{} days", days),
            MilestoneEta::Fractional(days) => write!(f, "{:.1} days", days),
            MilestoneEta::Text(text) => f.write_str(text),
        }
    }
}

/// Aggregate statistics as sent by the service
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WireInsights {
    #[serde(alias = "currentFollowers")]
    pub current_followers: u64,
    #[serde(alias = "nextMilestone")]
    pub next_milestone: u64,
    #[serde(alias = "averageDailyGrowth")]
    pub average_daily_growth: f64,
    #[serde(alias = "progressPercentage")]
    pub progress_percentage: f64,
    #[serde(alias = "estimatedDaysToMilestone")]
    pub estimated_days_to_milestone: MilestoneEta,
}

/// A single line of a release's notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeItem {
    pub text: String,
    #[serde(default)]
    pub added: bool,
}

/// One release in the service changelog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogRelease {
    pub version: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub changes: Vec<ChangeItem>,
}

impl ChangelogRelease {
    /// Plain text rendering of the release notes
    pub fn render(&self) -> String {
        let mut text = format!("Version {}", self.version);
        if let Some(date) = &self.date {
            text.push_str(&format!(" ({})", date));
        }
        for change in &self.changes {
            let marker = if change.added { "+" } else { "-" };
            text.push_str(&format!("\n  {} {}", marker, change.text));
        }
        text
    }
}

/// Request/response contract with the remote tracker service
#[async_trait]
pub trait RemoteCollaborator: Send + Sync {
    /// Entry listing. `None` asks for the default listing, which is either the
    /// whole series or the first page of it with a total.
    async fn fetch_entries(&self, page: Option<PageRequest>) -> Result<FetchedEntries, RemoteError>;

    async fn create_entry(&self, entry: Entry) -> Result<(), RemoteError>;

    /// Replace the entry keyed by `original` with `replacement` (date and count)
    async fn update_entry(&self, original: NaiveDate, replacement: Entry) -> Result<(), RemoteError>;

    /// Remove the entry keyed by `date`. A missing key is reported as `NotFound`.
    async fn delete_entry(&self, date: NaiveDate) -> Result<(), RemoteError>;

    async fn clear_all(&self) -> Result<(), RemoteError>;

    async fn forecast(&self, days: u32) -> Result<Vec<WireForecastPoint>, RemoteError>;

    async fn insights(&self) -> Result<WireInsights, RemoteError>;

    /// Current alert text, `None` when no alert is active
    async fn alert(&self, source: AlertSource) -> Result<Option<String>, RemoteError>;

    async fn changelog(&self) -> Result<Vec<ChangelogRelease>, RemoteError>;

    /// Retrieve the export resource as CSV text
    async fn export_csv(&self) -> Result<String, RemoteError>;

    /// Reference to the export resource, for callers that hand retrieval to something else
    fn export_url(&self) -> Option<String> {
        None
    }
}
