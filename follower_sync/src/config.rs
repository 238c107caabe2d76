//! Client configuration

use crate::error::{Result, TrackerError};
use growth_math::{SampleThreshold, DEFAULT_PAGE_SIZE, DEFAULT_SAMPLE_THRESHOLD};
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Name of the count field in create and update payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountField {
    /// `{"date": ..., "followers": ...}`
    #[default]
    Followers,
    /// `{"date": ..., "count": ...}`
    Count,
}

impl CountField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountField::Followers => "followers",
            CountField::Count => "count",
        }
    }

    fn from_env(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "followers" => Ok(Self::Followers),
            "count" => Ok(Self::Count),
            _ => Err(TrackerError::Config(
                "TRACKER_COUNT_FIELD must be one of: followers, count".to_string(),
            )),
        }
    }
}

/// Where the date key goes on a delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteKey {
    /// `DELETE /delete_entry/{date}`
    #[default]
    PathSegment,
    /// `DELETE /delete_entry` with `{"date": ...}`
    BodyField,
}

impl DeleteKey {
    fn from_env(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "path" | "segment" => Ok(Self::PathSegment),
            "body" | "field" => Ok(Self::BodyField),
            _ => Err(TrackerError::Config(
                "TRACKER_DELETE_KEY must be one of: path, body".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub base_url: String,
    pub page_size: usize,
    pub request_timeout: Duration,
    pub count_field: CountField,
    pub delete_key: DeleteKey,
    pub sample_threshold: SampleThreshold,
}

impl TrackerConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: trim_base_url(base_url.into()),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            count_field: CountField::default(),
            delete_key: DeleteKey::default(),
            sample_threshold: SampleThreshold::default(),
        }
    }

    /// Read settings from the process environment and an optional `.env` file
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let base_url = env::var("TRACKER_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let page_size = parse_var("TRACKER_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(TrackerError::Config(
                "TRACKER_PAGE_SIZE must be greater than zero".to_string(),
            ));
        }

        let timeout_secs = parse_var("TRACKER_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;

        let count_field = match env::var("TRACKER_COUNT_FIELD") {
            Ok(raw) => CountField::from_env(&raw)?,
            Err(_) => CountField::default(),
        };

        let delete_key = match env::var("TRACKER_DELETE_KEY") {
            Ok(raw) => DeleteKey::from_env(&raw)?,
            Err(_) => DeleteKey::default(),
        };

        let threshold = parse_var("TRACKER_SAMPLE_THRESHOLD", DEFAULT_SAMPLE_THRESHOLD)?;

        Ok(Self {
            base_url: trim_base_url(base_url),
            page_size,
            request_timeout: Duration::from_secs(timeout_secs),
            count_field,
            delete_key,
            sample_threshold: SampleThreshold::new(threshold),
        })
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_count_field(mut self, count_field: CountField) -> Self {
        self.count_field = count_field;
        self
    }

    pub fn with_delete_key(mut self, delete_key: DeleteKey) -> Self {
        self.delete_key = delete_key;
        self
    }

    pub fn with_sample_threshold(mut self, threshold: SampleThreshold) -> Self {
        self.sample_threshold = threshold;
        self
    }

    /// Join a path onto the base URL
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

fn trim_base_url(raw: String) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| TrackerError::Config(format!("{} has an invalid value '{}'", name, raw))),
        Err(_) => Ok(default),
    }
}
