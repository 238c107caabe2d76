//! # Follower Sync
//!
//! Client-side state and synchronization for a follower tracking service.
//!
//! ## Features
//!
//! - Canonical entry store, replaced wholesale after every accepted change
//! - Serialized create/update/delete/clear with a full reload afterwards
//! - Multi-day forecast requests guarded by a minimum-sample threshold
//! - Aggregate insights merged with the active alert, tolerant of partial failure
//! - CSV export and a changelog reader
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use follower_sync::{HttpRemote, TrackerConfig, TrackerSession};
//! use std::sync::Arc;
//!
//! # async fn run() -> follower_sync::Result<()> {
//! let config = TrackerConfig::from_env()?;
//! let remote = Arc::new(HttpRemote::new(config.clone())?);
//! let mut session = TrackerSession::new(remote, &config)?;
//!
//! // Load entries and the alert banner
//! let report = session.mount().await;
//! println!("loaded: {}", report.is_complete());
//!
//! // Record today's count
//! session.add("2024-01-05", "180").await?;
//!
//! // Show the first page with day-over-day changes
//! for row in session.current_page().rows {
//!     println!("{} {} {:+}", row.date, row.count, row.delta);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod forecast;
pub mod insights;
pub mod remote;
pub mod session;
pub mod sync;
pub mod validate;

// Re-export commonly used types
pub use crate::config::{CountField, DeleteKey, TrackerConfig};
pub use crate::data::{EntryStore, FetchedEntries, StoreSnapshot};
pub use crate::error::{RemoteError, Result, TrackerError};
pub use crate::export::DataLoader;
pub use crate::forecast::{Forecast, ForecastOutcome, ForecastPoint, ForecastRequester};
pub use crate::insights::{InsightsAggregator, InsightsReport, InsightsSummary};
pub use crate::remote::{AlertSource, ChangelogRelease, HttpRemote, RemoteCollaborator};
pub use crate::session::{AlertState, MountReport, PageView, TrackerSession};
pub use crate::sync::{ClearOutcome, Confirmation, MutationPhase, Settled, SyncCoordinator};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
