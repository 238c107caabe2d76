//! # Follower Tracker
//!
//! `follower_tracker` bundles the workspace crates behind one import.
//!
//! - [`math`] is `growth_math`: the entry model, day-over-day deltas, page
//!   slicing and the minimum-sample threshold.
//! - [`sync`] is `follower_sync`: the remote service seam, the entry store and
//!   everything that reads from or writes to the service.
//!
//! ## Example
//!
//! ```
//! use follower_tracker::math::{compute, page_count, Entry};
//!
//! let entries = vec![
//!     Entry::parse("2024-01-03", 130).unwrap(),
//!     Entry::parse("2024-01-01", 100).unwrap(),
//!     Entry::parse("2024-01-02", 150).unwrap(),
//! ];
//! let deltas: Vec<i64> = compute(&entries).iter().map(|d| d.delta).collect();
//! assert_eq!(deltas, vec![0, 50, -20]);
//! assert_eq!(page_count(23, 10).unwrap(), 3);
//! ```

pub use follower_sync as sync;
pub use growth_math as math;

pub use follower_sync::{
    ForecastOutcome, HttpRemote, InsightsReport, RemoteCollaborator, Settled, TrackerConfig,
    TrackerError, TrackerSession,
};
pub use growth_math::{DerivedEntry, Entry, SampleThreshold};

/// Connect a session to the service described by `config`
///
/// # Examples
///
/// ```
/// use follower_tracker::{connect, TrackerConfig};
///
/// let session = connect(TrackerConfig::new("http://localhost:5000")).unwrap();
/// assert!(session.is_mounted());
/// ```
pub fn connect(config: TrackerConfig) -> follower_sync::Result<TrackerSession<HttpRemote>> {
    let remote = std::sync::Arc::new(HttpRemote::new(config.clone())?);
    TrackerSession::new(remote, &config)
}
