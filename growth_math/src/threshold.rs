//! Minimum-sample precondition for forecasts and insights

use crate::{MathError, Result};

/// Requests need strictly more than this many observations
pub const DEFAULT_SAMPLE_THRESHOLD: usize = 3;

/// Exclusive lower bound on the number of samples a request needs.
///
/// A threshold of 3 accepts 4 or more samples and rejects 3 or fewer. The same
/// bound applies to forecast inputs, forecast outputs and insights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleThreshold {
    floor: usize,
}

impl SampleThreshold {
    pub fn new(floor: usize) -> Self {
        Self { floor }
    }

    /// The exclusive bound
    pub fn floor(&self) -> usize {
        self.floor
    }

    /// Smallest sample count that passes
    pub fn minimum_required(&self) -> usize {
        self.floor.saturating_add(1)
    }

    pub fn is_met(&self, available: usize) -> bool {
        available > self.floor
    }

    /// Fail with `InsufficientData` unless `available` passes the threshold
    pub fn ensure(&self, available: usize, purpose: &str) -> Result<()> {
        if self.is_met(available) {
            return Ok(());
        }
        Err(MathError::InsufficientData(format!(
            "{} needs at least {} data points, found {}",
            purpose,
            self.minimum_required(),
            available
        )))
    }
}

impl Default for SampleThreshold {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_THRESHOLD)
    }
}
