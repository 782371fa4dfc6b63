// SPDX-License-Identifier: MIT OR Apache-2.0
//! REST client for event history.

use crate::event::StreamEvent;
use std::time::Duration;
use thiserror::Error;

/// Errors from the REST API
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with an error status
    #[error("server returned {code}: {body}")]
    Status {
        /// HTTP status code
        code: u16,
        /// Response body, possibly empty
        body: String,
    },
    /// The request never got an answer
    #[error("request failed: {0}")]
    Transport(String),
    /// Reading the body failed
    #[error("failed to read response: {0}")]
    Io(#[from] std::io::Error),
    /// The body was not the expected JSON
    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<ureq::Error> for ApiError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, response) => Self::Status {
                code,
                body: response.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(transport) => Self::Transport(transport.to_string()),
        }
    }
}

/// Result type for API calls
pub type ApiResult<T> = Result<T, ApiError>;

/// Link to the standalone event page for streaming software
pub fn embed_link(host: &str) -> String {
    format!("{}/events", host.trim_end_matches('/'))
}

/// Blocking HTTP client for the dashboard backend
#[derive(Clone)]
pub struct ApiClient {
    agent: ureq::Agent,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(30))
            .build();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Path of a user's event collection
    pub fn user_events_url(&self, user_id: &str) -> String {
        format!("{}/users/{}/events", self.base_url, user_id)
    }

    /// Fetch a user's event history
    pub fn user_events(&self, user_id: &str) -> ApiResult<Vec<StreamEvent>> {
        let url = self.user_events_url(user_id);
        tracing::debug!("GET {}", url);

        let body = self
            .agent
            .get(&url)
            .set("Accept", "application/json")
            .call()?
            .into_string()?;

        let events: Vec<StreamEvent> = serde_json::from_str(&body)?;
        tracing::info!("Fetched {} events for user {}", events.len(), user_id);
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_link() {
        assert_eq!(embed_link("dashboard.streali.com"), "dashboard.streali.com/events");
        assert_eq!(embed_link("https://streali.tv/"), "https://streali.tv/events");
    }

    #[test]
    fn test_user_events_url_trims_base() {
        let client = ApiClient::new("https://api.streali.tv/");
        assert_eq!(client.base_url(), "https://api.streali.tv");
        assert_eq!(client.user_events_url("7"), "https://api.streali.tv/users/7/events");
    }

    #[test]
    fn test_unreachable_server_is_transport_error() {
        let client = ApiClient::new("http://127.0.0.1:9");
        let err = client.user_events("1").unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
