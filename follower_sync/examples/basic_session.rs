//! Walk through a session against a running tracker service.
//!
//! Set TRACKER_BASE_URL (or a .env file) to point at the service, then run
//! `cargo run -p follower_sync --example basic_session`.

use follower_sync::forecast::FORECAST_PRESETS;
use follower_sync::{ForecastOutcome, HttpRemote, TrackerConfig, TrackerSession};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("follower_sync=debug")
        .init();

    let config = TrackerConfig::from_env()?;
    let remote = Arc::new(HttpRemote::new(config.clone())?);
    let mut session = TrackerSession::new(remote, &config)?;

    let report = session.mount().await;
    println!("Initial load complete: {}", report.is_complete());

    let view = session.current_page();
    println!(
        "Page {} of {}",
        view.page.page_number,
        view.page.page_count()
    );
    for row in &view.rows {
        println!("  {} {:>6} ({:+})", row.date, row.count, row.delta);
    }

    // Try every preset horizon
    for days in FORECAST_PRESETS {
        match session.forecast(days).await {
            Ok(ForecastOutcome::Ready(forecast)) => {
                let last = forecast.final_point().map(|p| p.projected_count);
                println!("{}: ends at {:?}", forecast.heading(), last);
            }
            Ok(ForecastOutcome::TooShort { message, .. }) => println!("{}", message),
            Err(e) => println!("Forecast unavailable: {}", e.user_message()),
        }
    }

    match session.insights().await {
        Ok(report) => println!("\n{}", report.render()),
        Err(e) => println!("Insights unavailable: {}", e.user_message()),
    }

    session.unmount();
    Ok(())
}
