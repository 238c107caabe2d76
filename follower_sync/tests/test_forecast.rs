mod common;

use common::{forecast_points, server_error, Calls, MockRemote};
use follower_sync::forecast::{FORECAST_PRESETS, FORECAST_TOO_SHORT};
use follower_sync::{ForecastOutcome, ForecastRequester, RemoteError, TrackerError};
use growth_math::SampleThreshold;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn requester(remote: &Arc<MockRemote>) -> ForecastRequester<MockRemote> {
    ForecastRequester::new(Arc::clone(remote), SampleThreshold::default())
}

#[tokio::test]
async fn test_two_entries_never_reach_the_service() {
    let remote = Arc::new(MockRemote::with_series(2));
    let forecaster = requester(&remote);

    let result = forecaster.forecast(2, 7, &CancellationToken::new()).await;

    assert!(matches!(result, Err(TrackerError::InsufficientData(_))));
    assert_eq!(Calls::get(&remote.calls.forecast), 0);
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(3)]
#[tokio::test]
async fn test_threshold_is_exclusive(#[case] samples: usize) {
    let remote = Arc::new(MockRemote::with_series(samples));
    let forecaster = requester(&remote);

    let err = forecaster
        .forecast(samples, 10, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("at least 4"));
    assert_eq!(Calls::get(&remote.calls.forecast), 0);
}

#[rstest]
#[case(FORECAST_PRESETS[0])]
#[case(FORECAST_PRESETS[1])]
#[case(FORECAST_PRESETS[2])]
#[tokio::test]
async fn test_forecast_covers_requested_horizon(#[case] days: u32) {
    let remote = Arc::new(MockRemote::with_series(5));
    let forecaster = requester(&remote);

    let outcome = forecaster
        .forecast(5, days, &CancellationToken::new())
        .await
        .unwrap();

    let ForecastOutcome::Ready(forecast) = outcome else {
        panic!("Expected a displayable forecast");
    };
    assert_eq!(forecast.points.len(), days as usize);
    assert_eq!(forecast.heading(), format!("Forecast Results for {} days", days));
    let indices: Vec<u32> = forecast.points.iter().map(|p| p.day_index).collect();
    assert_eq!(indices, (1..=days).collect::<Vec<_>>());
    // 200 + 1 * 2.5 truncated
    assert_eq!(forecast.points[0].projected_count, 202);
}

#[tokio::test]
async fn test_short_response_is_a_soft_failure() {
    let remote = Arc::new(MockRemote::with_series(6));
    remote.reply_forecast(Ok(forecast_points(3)));
    let forecaster = requester(&remote);

    let outcome = forecaster
        .forecast(6, 7, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ForecastOutcome::TooShort {
            points: 3,
            message: FORECAST_TOO_SHORT,
        }
    );
}

#[tokio::test]
async fn test_wrong_horizon_breaks_contract() {
    let remote = Arc::new(MockRemote::with_series(6));
    remote.reply_forecast(Ok(forecast_points(5)));
    let forecaster = requester(&remote);

    let err = forecaster
        .forecast(6, 7, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, TrackerError::Remote(RemoteError::Contract(_))));
}

#[tokio::test]
async fn test_service_reported_shortage_is_insufficient_data() {
    let remote = Arc::new(MockRemote::with_series(6));
    remote.reply_forecast(Err(RemoteError::Status {
        status: 400,
        message: "Not enough data to forecast".to_string(),
    }));
    let forecaster = requester(&remote);

    let err = forecaster
        .forecast(6, 7, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, TrackerError::InsufficientData(_)));
    assert_eq!(Calls::get(&remote.calls.forecast), 1);
}

#[tokio::test]
async fn test_service_failure_is_remote_error() {
    let remote = Arc::new(MockRemote::with_series(6));
    remote.reply_forecast(Err(server_error()));
    let forecaster = requester(&remote);

    let err = forecaster
        .forecast(6, 7, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_cancelled_view_discards_forecast() {
    let remote = Arc::new(MockRemote::with_series(6));
    let forecaster = requester(&remote);
    let token = CancellationToken::new();
    token.cancel();

    let result = forecaster.forecast(6, 7, &token).await;

    assert!(matches!(result, Err(TrackerError::Cancelled)));
}

#[tokio::test]
async fn test_zero_day_horizon_is_rejected() {
    let remote = Arc::new(MockRemote::with_series(6));
    let forecaster = requester(&remote);

    let result = forecaster.forecast(6, 0, &CancellationToken::new()).await;

    assert!(matches!(result, Err(TrackerError::Validation(_))));
    assert_eq!(Calls::get(&remote.calls.forecast), 0);
}

#[tokio::test]
async fn test_custom_threshold() {
    let remote = Arc::new(MockRemote::with_series(6));
    let forecaster = ForecastRequester::new(Arc::clone(&remote), SampleThreshold::new(6));

    let result = forecaster.forecast(6, 7, &CancellationToken::new()).await;

    assert!(matches!(result, Err(TrackerError::InsufficientData(_))));
    assert_eq!(forecaster.threshold().minimum_required(), 7);
}
