//! Multi-day forecast requests

use crate::error::{RemoteError, Result, TrackerError};
use crate::remote::{RemoteCollaborator, WireForecastPoint};
use chrono::NaiveDate;
use growth_math::SampleThreshold;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Horizons offered by the front end
pub const FORECAST_PRESETS: [u32; 3] = [7, 10, 30];

/// Shown when the service returns too few forecast points to display
pub const FORECAST_TOO_SHORT: &str =
    "Not enough data to forecast. Please add more data points.";

/// A single projected observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForecastPoint {
    /// 1-based position in the horizon
    pub day_index: u32,
    pub date: NaiveDate,
    pub projected_count: u64,
}

/// A displayable forecast covering exactly the requested horizon
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Forecast {
    pub days: u32,
    pub points: Vec<ForecastPoint>,
}

impl Forecast {
    pub fn heading(&self) -> String {
        format!("Forecast Results for {} days", self.days)
    }

    /// Projection for the last day of the horizon
    pub fn final_point(&self) -> Option<&ForecastPoint> {
        self.points.last()
    }
}

/// Outcome of a forecast request that reached the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForecastOutcome {
    Ready(Forecast),
    /// The service answered with too few points to display. Not an error.
    TooShort {
        points: usize,
        message: &'static str,
    },
}

pub struct ForecastRequester<R: ?Sized> {
    remote: Arc<R>,
    threshold: SampleThreshold,
}

impl<R> ForecastRequester<R>
where
    R: RemoteCollaborator + ?Sized,
{
    pub fn new(remote: Arc<R>, threshold: SampleThreshold) -> Self {
        Self { remote, threshold }
    }

    pub fn threshold(&self) -> SampleThreshold {
        self.threshold
    }

    /// Request a `days`-long projection.
    ///
    /// `samples` is the number of historical observations the client holds.
    /// When it does not pass the threshold no request is made.
    pub async fn forecast(
        &self,
        samples: usize,
        days: u32,
        token: &CancellationToken,
    ) -> Result<ForecastOutcome> {
        if days == 0 {
            return Err(TrackerError::Validation(
                "Forecast horizon must be at least one day".to_string(),
            ));
        }
        self.threshold.ensure(samples, "Forecasting")?;

        debug!(days, samples, "requesting forecast");
        let reply = self.remote.forecast(days).await;
        if token.is_cancelled() {
            return Err(TrackerError::Cancelled);
        }

        let wire = reply.map_err(|e| {
            if e.reports_insufficient_data() {
                TrackerError::InsufficientData(e.to_string())
            } else {
                warn!(error = %e, "forecast request failed");
                TrackerError::Remote(e)
            }
        })?;

        let points = normalize(wire)?;
        if !self.threshold.is_met(points.len()) {
            warn!(received = points.len(), "forecast too short to display");
            return Ok(ForecastOutcome::TooShort {
                points: points.len(),
                message: FORECAST_TOO_SHORT,
            });
        }

        if points.len() != days as usize {
            return Err(RemoteError::Contract(format!(
                "requested {} forecast days, received {}",
                days,
                points.len()
            ))
            .into());
        }

        info!(days, "forecast ready");
        Ok(ForecastOutcome::Ready(Forecast { days, points }))
    }
}

/// Bring service points into `{day_index, date, projected_count}` form.
///
/// Points without a day index take their position. Indices must run 1..=n with
/// no gaps and dates must increase with the index. Projections are truncated
/// to whole followers and floored at zero.
pub fn normalize(wire: Vec<WireForecastPoint>) -> std::result::Result<Vec<ForecastPoint>, RemoteError> {
    let mut indexed: Vec<(u32, WireForecastPoint)> = wire
        .into_iter()
        .enumerate()
        .map(|(pos, point)| (point.day.unwrap_or(pos as u32 + 1), point))
        .collect();
    indexed.sort_by_key(|(day, _)| *day);

    let mut points = Vec::with_capacity(indexed.len());
    for (expected, (day, point)) in (1u32..).zip(indexed) {
        if day != expected {
            return Err(RemoteError::Contract(format!(
                "forecast day {} found where day {} was expected",
                day, expected
            )));
        }
        if !point.forecasted_count.is_finite() {
            return Err(RemoteError::Contract(format!(
                "forecast for day {} is not a number",
                day
            )));
        }
        if let Some(previous) = points.last().map(|p: &ForecastPoint| p.date) {
            if point.date <= previous {
                return Err(RemoteError::Contract(format!(
                    "forecast dates out of order at day {}",
                    day
                )));
            }
        }

        points.push(ForecastPoint {
            day_index: day,
            date: point.date,
            projected_count: point.forecasted_count.trunc().max(0.0) as u64,
        });
    }

    Ok(points)
}
