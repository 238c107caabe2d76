//! Error types for the follower_sync crate

use growth_math::MathError;
use thiserror::Error;

/// Failures talking to the remote tracker service
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// The request never produced a response (connect, timeout, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with a non-success status
    #[error("Service error ({status}): {message}")]
    Status { status: u16, message: String },

    /// The keyed resource does not exist on the service
    #[error("Not found: {0}")]
    NotFound(String),

    /// The response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// The response decoded but broke the request/response contract
    #[error("Contract violation: {0}")]
    Contract(String),
}

impl RemoteError {
    /// Whether the failure is on the service's side and likely to pass
    /// without the request changing
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteError::Network(_) => true,
            RemoteError::Status { status, .. } => *status >= 500 || *status == 429,
            RemoteError::NotFound(_) | RemoteError::Parse(_) | RemoteError::Contract(_) => false,
        }
    }

    /// Whether the service rejected the request for lack of history
    pub fn reports_insufficient_data(&self) -> bool {
        match self {
            RemoteError::Status { message, .. } => {
                message.to_ascii_lowercase().contains("not enough data")
            }
            _ => false,
        }
    }
}

/// Custom error types for the follower_sync crate
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Bad or missing local input; never reaches the network
    #[error("Validation error: {0}")]
    Validation(String),

    /// The minimum-sample precondition was not met, locally or per the service
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Network or service failure
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Another mutation is still being submitted
    #[error("Another change is still being saved")]
    MutationInFlight,

    /// The owning view went away before the response arrived
    #[error("Request cancelled")]
    Cancelled,

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error reading or writing CSV exports
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, TrackerError>;

impl From<MathError> for TrackerError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::InsufficientData(msg) => TrackerError::InsufficientData(msg),
            MathError::InvalidInput(msg) => TrackerError::Validation(msg),
        }
    }
}

impl TrackerError {
    /// Whether the user may retry the triggering action. Every service
    /// failure leaves local state untouched, so all of them qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TrackerError::Remote(_) | TrackerError::MutationInFlight | TrackerError::Io(_)
        )
    }

    /// Short message suitable for a notice shown to the user
    pub fn user_message(&self) -> String {
        match self {
            TrackerError::Validation(msg) | TrackerError::InsufficientData(msg) => msg.clone(),
            TrackerError::Remote(err) if err.is_transient() => {
                format!("The tracker service is unavailable, please try again. ({})", err)
            }
            TrackerError::Remote(err) => format!(
                "The tracker service rejected the request: {}. Check the input and try again.",
                err
            ),
            other => other.to_string(),
        }
    }
}
