use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use follower_sync::forecast::FORECAST_PRESETS;
use follower_sync::{
    AlertSource, AlertState, ClearOutcome, ForecastOutcome, HttpRemote, Settled, TrackerConfig,
    TrackerSession,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "tracker")]
#[command(about = "Track follower counts against a remote tracker service")]
#[command(version)]
struct Cli {
    /// Service base URL, overrides TRACKER_BASE_URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show one page of entries with day-over-day changes
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Record a new observation
    Add {
        date: String,
        count: String,
        /// Overwrite the entry if the date already exists
        #[arg(long)]
        upsert: bool,
    },
    /// Replace the entry for a date
    Update {
        original_date: String,
        new_date: String,
        new_count: String,
    },
    Delete {
        date: String,
    },
    /// Delete every entry
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Request a projection (presets: 7, 10, 30)
    Forecast {
        #[arg(long, default_value_t = FORECAST_PRESETS[0])]
        days: u32,
    },
    Insights,
    Alerts {
        /// Read the detailed activity alert
        #[arg(long)]
        detailed: bool,
    },
    Changelog,
    /// Print the export reference, or save the export to a file
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = TrackerConfig::from_env().context("failed to load tracker configuration")?;
    if let Some(base_url) = cli.base_url {
        config = TrackerConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..config
        };
    }
    info!(base_url = %config.base_url, "tracker client starting");

    let remote = Arc::new(HttpRemote::new(config.clone()).context("failed to build HTTP client")?);
    let mut session = TrackerSession::new(remote, &config)?;

    let report = session.mount().await;
    for failure in &report.failures {
        warn!(error = %failure, "initial load incomplete");
    }

    match cli.command {
        Command::List { page } => {
            session.go_to_page(page);
            let view = session.current_page();
            println!(
                "Page {} of {} ({} entries)",
                view.page.page_number,
                view.page.page_count(),
                view.page.total_entries
            );
            for row in view.rows {
                println!("{}  {:>8}  {:+}", row.date, row.count, row.delta);
            }
            if let Some(text) = session.alert().text() {
                println!("\nAlert: {}", text);
            }
        }
        Command::Add {
            date,
            count,
            upsert,
        } => {
            let settled = if upsert {
                session.upsert(&date, &count).await
            } else {
                session.add(&date, &count).await
            };
            report_settled("Entry saved", settled.map_err(user_error)?);
        }
        Command::Update {
            original_date,
            new_date,
            new_count,
        } => {
            let settled = session
                .update(&original_date, &new_date, &new_count)
                .await
                .map_err(user_error)?;
            report_settled("Entry updated", settled);
        }
        Command::Delete { date } => {
            let settled = session.delete(&date).await.map_err(user_error)?;
            report_settled("Entry deleted", settled);
        }
        Command::Clear { yes } => {
            let confirm = |prompt: &str| yes || ask(prompt);
            match session.clear_all(&confirm).await.map_err(user_error)? {
                ClearOutcome::Cleared => println!("All data cleared."),
                ClearOutcome::Declined => println!("Nothing was deleted."),
            }
        }
        Command::Forecast { days } => match session.forecast(days).await.map_err(user_error)? {
            ForecastOutcome::Ready(forecast) => {
                println!("{}", forecast.heading());
                for point in &forecast.points {
                    println!(
                        "Day {:>2}  {}  {}",
                        point.day_index, point.date, point.projected_count
                    );
                }
            }
            ForecastOutcome::TooShort { message, .. } => println!("{}", message),
        },
        Command::Insights => {
            let insights = session.insights().await.map_err(user_error)?;
            println!("{}", insights.render());
            for (endpoint, error) in &insights.failures {
                warn!(?endpoint, %error, "part of the insights could not be loaded");
            }
        }
        Command::Alerts { detailed } => {
            let source = if detailed {
                AlertSource::Detailed
            } else {
                AlertSource::Basic
            };
            match session.refresh_alert(source).await.map_err(user_error)? {
                AlertState::Active(text) => println!("{}", text),
                _ => println!("No active alerts."),
            }
        }
        Command::Changelog => {
            for release in session.changelog().await.map_err(user_error)? {
                println!("{}\n", release.render());
            }
        }
        Command::Export { out } => match out {
            Some(path) => {
                let entries = session.download().await.map_err(user_error)?;
                follower_sync::export::save_csv(&path, &entries)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("Saved {} entries to {}", entries.len(), path.display());
            }
            None => println!("{}", session.export_url()?),
        },
    }

    session.unmount();
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("follower_sync=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn user_error(err: follower_sync::TrackerError) -> anyhow::Error {
    anyhow::anyhow!(err.user_message())
}

fn report_settled(done: &str, settled: Settled) {
    match settled {
        Settled::Refreshed(snapshot) => println!("{}. {} entries on record.", done, snapshot.len()),
        Settled::Stale(err) => println!("{}, but the list could not be reloaded: {}", done, err),
    }
}

fn ask(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}
