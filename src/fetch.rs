//! HTTP access to the events feed.

use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::event::{Event, EventsResponse, Filter, ResponseStatus};

/// Shown whenever the feed can't be reached, can't be decoded, or reports an
/// error without a message.
pub const FALLBACK_ERROR: &str = "Failed to fetch events";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid events endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Request to events feed failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Events feed returned malformed JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result of one poll cycle, ready to be applied to dashboard state.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Events(Vec<Event>),
    Failed(String),
}

/// Anything that can produce an events envelope for a filter.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch(&self, filter: &Filter) -> Result<EventsResponse, FetchError>;
}

/// Build the request URL; the `action` parameter is only present when a
/// filter is active.
pub fn request_url(endpoint: &str, filter: &Filter) -> Result<Url, FetchError> {
    let mut url = Url::parse(endpoint).map_err(|e| FetchError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })?;

    if let Some(action) = filter.query_value() {
        url.query_pairs_mut().append_pair("action", action);
    }

    Ok(url)
}

/// Collapse a fetch result into what the dashboard shows. Transport and
/// decode causes are logged and dropped.
pub fn resolve(result: Result<EventsResponse, FetchError>) -> FetchOutcome {
    match result {
        Ok(response) => match response.status {
            ResponseStatus::Success => FetchOutcome::Events(response.events),
            ResponseStatus::Error => FetchOutcome::Failed(
                response
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| FALLBACK_ERROR.to_string()),
            ),
        },
        Err(e) => {
            warn!("Fetching events failed: {}", e);
            FetchOutcome::Failed(FALLBACK_ERROR.to_string())
        }
    }
}

pub struct HttpEventSource {
    client: Client,
    endpoint: String,
}

impl HttpEventSource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        let endpoint = endpoint.into();

        // Surface a bad endpoint at startup rather than on every poll.
        request_url(&endpoint, &Filter::All)?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EventSource for HttpEventSource {
    async fn fetch(&self, filter: &Filter) -> Result<EventsResponse, FetchError> {
        let url = request_url(&self.endpoint, filter)?;
        debug!("GET {}", url);

        // Error envelopes arrive with a 5xx status, so the body is decoded
        // regardless of the status code.
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!("Events feed answered {} ({} bytes)", status, body.len());

        Ok(serde_json::from_str(&body)?)
    }
}
