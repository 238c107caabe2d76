//! # Growth Math
//!
//! Pure calculations over follower count observations.
//! This crate holds the entry model together with the day-over-day delta
//! engine, page slicing and the minimum-sample threshold shared by the
//! forecast and insights requests.

use thiserror::Error;

pub mod deltas;
pub mod entry;
pub mod pagination;
pub mod threshold;

pub use deltas::compute;
pub use entry::{DerivedEntry, Entry};
pub use pagination::{page, page_count, Page, PageCursor, DEFAULT_PAGE_SIZE};
pub use threshold::{SampleThreshold, DEFAULT_SAMPLE_THRESHOLD};

/// Errors that can occur in growth calculations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for growth math operations
pub type Result<T> = std::result::Result<T, MathError>;
