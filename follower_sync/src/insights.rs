//! Aggregate insights merged with the active alert

use crate::error::{RemoteError, Result, TrackerError};
use crate::remote::{AlertSource, MilestoneEta, RemoteCollaborator, WireInsights};
use growth_math::SampleThreshold;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Summary of growth statistics, ready to render
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightsSummary {
    pub current_followers: u64,
    pub next_milestone: u64,
    pub average_daily_growth: f64,
    pub progress_percentage: f64,
    /// Rendered as supplied; may be free text
    pub estimated_days_to_milestone: MilestoneEta,
    pub alert_text: Option<String>,
}

impl InsightsSummary {
    pub fn from_wire(wire: WireInsights, alert_text: Option<String>) -> Self {
        Self {
            current_followers: wire.current_followers,
            next_milestone: wire.next_milestone,
            average_daily_growth: wire.average_daily_growth,
            progress_percentage: wire.progress_percentage,
            estimated_days_to_milestone: wire.estimated_days_to_milestone,
            alert_text: non_empty(alert_text),
        }
    }

    /// One text block; the alert, when present, is appended as its own section
    pub fn render(&self) -> String {
        let mut text = format!(
            "Insights:\n\
             - Current Followers: {}\n\
             - Next Milestone: {}\n\
             - Average Daily Growth: {} per day\n\
             - Progress: {}%\n\
             - Estimated Time: {}",
            self.current_followers,
            self.next_milestone,
            self.average_daily_growth,
            self.progress_percentage,
            self.estimated_days_to_milestone,
        );
        if let Some(alert) = &self.alert_text {
            text.push_str(&render_alert(alert));
        }
        text
    }
}

fn render_alert(alert: &str) -> String {
    format!("\n\nAlert:\n{}", alert)
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

/// The two endpoints an insights request reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightsEndpoint {
    Aggregate,
    Alert,
}

/// Whatever could be retrieved, plus what failed
#[derive(Debug, Clone, PartialEq)]
pub struct InsightsReport {
    pub summary: Option<InsightsSummary>,
    /// Alert text; also merged into `summary` when both are present
    pub alert: Option<String>,
    pub failures: Vec<(InsightsEndpoint, RemoteError)>,
}

impl InsightsReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Single renderable block
    pub fn render(&self) -> String {
        match (&self.summary, &self.alert) {
            (Some(summary), _) => summary.render(),
            (None, Some(alert)) => format!("Insights are unavailable right now.{}", render_alert(alert)),
            (None, None) => "Insights are unavailable right now.".to_string(),
        }
    }
}

pub struct InsightsAggregator<R: ?Sized> {
    remote: Arc<R>,
    threshold: SampleThreshold,
    alert_source: AlertSource,
}

impl<R> InsightsAggregator<R>
where
    R: RemoteCollaborator + ?Sized,
{
    pub fn new(remote: Arc<R>, threshold: SampleThreshold) -> Self {
        Self {
            remote,
            threshold,
            alert_source: AlertSource::default(),
        }
    }

    pub fn with_alert_source(mut self, source: AlertSource) -> Self {
        self.alert_source = source;
        self
    }

    /// Read the current alert text from `source`
    pub async fn fetch_alert(
        &self,
        source: AlertSource,
        token: &CancellationToken,
    ) -> Result<Option<String>> {
        let reply = self.remote.alert(source).await;
        if token.is_cancelled() {
            return Err(TrackerError::Cancelled);
        }

        let alert = reply.map_err(|e| {
            warn!(error = %e, source = source.path(), "alert request failed");
            TrackerError::Remote(e)
        })?;
        Ok(non_empty(alert))
    }

    /// Fetch aggregate statistics and merge the alert into them.
    ///
    /// `cached_alert` is alert text the caller already holds; when it is empty
    /// the alert endpoint is queried alongside the aggregate. Either endpoint
    /// may fail without hiding the other's data. Only when both fail is the
    /// call an error. A service reply that there is no data to aggregate is
    /// always `InsufficientData`.
    pub async fn insights(
        &self,
        samples: usize,
        cached_alert: Option<&str>,
        token: &CancellationToken,
    ) -> Result<InsightsReport> {
        self.threshold.ensure(samples, "Insights")?;

        let cached = non_empty(cached_alert.map(str::to_string));
        let (aggregate, alert) = match cached {
            Some(text) => (self.remote.insights().await, Ok(Some(text))),
            None => {
                debug!("fetching insights and alert together");
                tokio::join!(self.remote.insights(), self.remote.alert(self.alert_source))
            }
        };

        if token.is_cancelled() {
            return Err(TrackerError::Cancelled);
        }

        // A service-reported lack of data answers the whole request, alert or not
        let aggregate = match aggregate {
            Ok(wire) => Ok(wire),
            Err(e) => match aggregate_error(e) {
                TrackerError::Remote(e) => Err(e),
                other => {
                    warn!(error = %other, "service has no data for insights");
                    return Err(other);
                }
            },
        };

        let mut failures = Vec::new();
        let alert = match alert {
            Ok(text) => non_empty(text),
            Err(e) => {
                warn!(error = %e, "alert unavailable for insights");
                failures.push((InsightsEndpoint::Alert, e));
                None
            }
        };

        let summary = match aggregate {
            Ok(wire) => Some(InsightsSummary::from_wire(wire, alert.clone())),
            Err(e) => {
                warn!(error = %e, "aggregate insights unavailable");
                if alert.is_none() {
                    return Err(TrackerError::Remote(e));
                }
                failures.push((InsightsEndpoint::Aggregate, e));
                None
            }
        };

        Ok(InsightsReport {
            summary,
            alert,
            failures,
        })
    }
}

fn aggregate_error(err: RemoteError) -> TrackerError {
    let no_data = match &err {
        RemoteError::Status { message, .. } => {
            let lower = message.to_ascii_lowercase();
            lower.contains("no data") || lower.contains("not enough data")
        }
        _ => false,
    };
    if no_data {
        TrackerError::InsufficientData(err.to_string())
    } else {
        TrackerError::Remote(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(eta: MilestoneEta) -> WireInsights {
        WireInsights {
            current_followers: 480,
            next_milestone: 500,
            average_daily_growth: 4.5,
            progress_percentage: 96.0,
            estimated_days_to_milestone: eta,
        }
    }

    #[test]
    fn test_render_with_alert_section() {
        let summary = InsightsSummary::from_wire(
            wire(MilestoneEta::Days(4)),
            Some("Follower activity is normal.".to_string()),
        );
        let text = summary.render();
        assert!(text.starts_with("Insights:\n- Current Followers: 480"));
        assert!(text.contains("- Estimated Time: 4 days"));
        assert!(text.ends_with("\n\nAlert:\nFollower activity is normal."));
    }

    #[test]
    fn test_blank_alert_is_dropped() {
        let summary = InsightsSummary::from_wire(
            wire(MilestoneEta::Text("Growth rate too low to predict milestone".into())),
            Some("   ".to_string()),
        );
        assert!(summary.alert_text.is_none());
        assert!(!summary.render().contains("Alert:"));
        assert!(summary
            .render()
            .contains("Estimated Time: Growth rate too low to predict milestone"));
    }

    #[test]
    fn test_report_without_summary_still_shows_alert() {
        let report = InsightsReport {
            summary: None,
            alert: Some("Big surge in followers!".to_string()),
            failures: vec![(
                InsightsEndpoint::Aggregate,
                RemoteError::Network("timed out".to_string()),
            )],
        };
        assert!(!report.is_complete());
        assert!(report.render().contains("Big surge in followers!"));
    }

    #[test]
    fn test_aggregate_error_mapping() {
        let no_data = aggregate_error(RemoteError::Status {
            status: 200,
            message: "No data available for insights".to_string(),
        });
        assert!(matches!(no_data, TrackerError::InsufficientData(_)));

        let down = aggregate_error(RemoteError::Network("refused".to_string()));
        assert!(matches!(down, TrackerError::Remote(_)));
    }
}
