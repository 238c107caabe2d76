//! HTTP client for the tracker service

use super::{
    AlertSource, ChangelogRelease, PageRequest, RemoteCollaborator, WireForecastPoint,
    WireInsights,
};
use crate::config::{DeleteKey, TrackerConfig};
use crate::data::{EntriesPayload, FetchedEntries};
use crate::error::RemoteError;
use async_trait::async_trait;
use chrono::NaiveDate;
use growth_math::entry::DATE_FORMAT;
use growth_math::Entry;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Error body the service sends on failure
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InsightsBody {
    Summary(WireInsights),
    Failure(ErrorBody),
}

#[derive(Debug, Deserialize)]
struct AlertBody {
    #[serde(default)]
    alert: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// [`RemoteCollaborator`] backed by the tracker's HTTP API
pub struct HttpRemote {
    config: TrackerConfig,
    client: reqwest::Client,
}

impl HttpRemote {
    pub fn new(config: TrackerConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        self.config.endpoint(path)
    }

    /// Delete keyed by path segment or by a `date` body field, per config
    fn delete_request(&self, date: NaiveDate) -> reqwest::RequestBuilder {
        let key = date.format(DATE_FORMAT).to_string();
        match self.config.delete_key {
            DeleteKey::PathSegment => self.client.delete(self.url(&format!("delete_entry/{}", key))),
            DeleteKey::BodyField => self
                .client
                .delete(self.url("delete_entry"))
                .json(&serde_json::json!({ "date": key })),
        }
    }

    fn entry_body(&self, date_key: &str, entry: &Entry) -> Value {
        let mut body = Map::new();
        body.insert(
            date_key.to_string(),
            Value::String(entry.date.format(DATE_FORMAT).to_string()),
        );
        body.insert(
            self.config.count_field.as_str().to_string(),
            Value::from(entry.count),
        );
        Value::Object(body)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| RemoteError::Parse(e.to_string()))
    }
}

/// Map non-success responses onto [`RemoteError`], pulling the service's
/// `{"error": ...}` message out of the body when there is one.
async fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body.trim().to_string()
            }
        });

    warn!(%url, status = status.as_u16(), %message, "tracker service returned an error");

    if status == StatusCode::NOT_FOUND {
        return Err(RemoteError::NotFound(message));
    }
    Err(RemoteError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl RemoteCollaborator for HttpRemote {
    async fn fetch_entries(&self, page: Option<PageRequest>) -> Result<FetchedEntries, RemoteError> {
        let url = self.url("get_entries");
        debug!(%url, ?page, "GET");
        let mut request = self.client.get(&url);
        if let Some(page) = page {
            request = request.query(&[("page", page.page_number), ("page_size", page.page_size)]);
        }
        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let payload: EntriesPayload = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| RemoteError::Parse(e.to_string()))?;
        Ok(payload.into())
    }

    async fn create_entry(&self, entry: Entry) -> Result<(), RemoteError> {
        let url = self.url("add_entry");
        let response = self
            .client
            .post(&url)
            .json(&self.entry_body("date", &entry))
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        check_status(response).await?;
        Ok(())
    }

    async fn update_entry(&self, original: NaiveDate, replacement: Entry) -> Result<(), RemoteError> {
        let url = self.url(&format!("update_entry/{}", original.format(DATE_FORMAT)));
        let response = self
            .client
            .put(&url)
            .json(&self.entry_body("new_date", &replacement))
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        check_status(response).await?;
        Ok(())
    }

    async fn delete_entry(&self, date: NaiveDate) -> Result<(), RemoteError> {
        let response = self
            .delete_request(date)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        check_status(response).await?;
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), RemoteError> {
        let url = self.url("clear_all");
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        check_status(response).await?;
        Ok(())
    }

    async fn forecast(&self, days: u32) -> Result<Vec<WireForecastPoint>, RemoteError> {
        let url = self.url("forecast");
        let response = self
            .client
            .get(&url)
            .query(&[("days", days)])
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| RemoteError::Parse(e.to_string()))
    }

    async fn insights(&self) -> Result<WireInsights, RemoteError> {
        match self.get_json::<InsightsBody>("insights").await? {
            InsightsBody::Summary(summary) => Ok(summary),
            // The service answers some failures with 200 and an error body
            InsightsBody::Failure(body) => Err(RemoteError::Status {
                status: StatusCode::OK.as_u16(),
                message: body.error,
            }),
        }
    }

    async fn alert(&self, source: AlertSource) -> Result<Option<String>, RemoteError> {
        let body: AlertBody = self.get_json(source.path()).await?;
        if let Some(error) = body.error {
            return Err(RemoteError::Status {
                status: StatusCode::OK.as_u16(),
                message: error,
            });
        }
        Ok(body.alert.filter(|text| !text.trim().is_empty()))
    }

    async fn changelog(&self) -> Result<Vec<ChangelogRelease>, RemoteError> {
        self.get_json("changelog").await
    }

    async fn export_csv(&self) -> Result<String, RemoteError> {
        let url = self.url("download");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let response = check_status(response).await?;
        response
            .text()
            .await
            .map_err(|e| RemoteError::Parse(e.to_string()))
    }

    fn export_url(&self) -> Option<String> {
        Some(self.url("download"))
    }
}
