//! Where a chat turn gets answered: the model directly, or a running
//! search endpoint over HTTP.

use std::sync::Arc;

use async_trait::async_trait;

use geoguide_core::types::{Coordinates, ErrorResponse, HistoryEntry, Message, Reply, SearchRequest};
use geoguide_model::GroundedSearch;

use crate::error::ChatError;

/// Answers one prompt given the prior transcript.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(
        &self,
        history: &[Message],
        prompt: &str,
        location: Option<Coordinates>,
    ) -> Result<Reply, ChatError>;
}

/// Calls the model in-process.
pub struct DirectBackend {
    search: Arc<GroundedSearch>,
}

impl DirectBackend {
    pub fn new(search: Arc<GroundedSearch>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl ChatBackend for DirectBackend {
    async fn send(
        &self,
        history: &[Message],
        prompt: &str,
        location: Option<Coordinates>,
    ) -> Result<Reply, ChatError> {
        Ok(self.search.answer(history, prompt, location).await?)
    }
}

/// Posts each turn to `POST {base}/api/search`.
pub struct HttpBackend {
    http: reqwest::Client,
    url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: format!("{}/api/search", base_url.trim_end_matches('/')),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn send(
        &self,
        history: &[Message],
        prompt: &str,
        location: Option<Coordinates>,
    ) -> Result<Reply, ChatError> {
        let body = SearchRequest {
            prompt: Some(prompt.to_string()),
            location,
            history: history.iter().map(HistoryEntry::from).collect(),
        };

        tracing::debug!(url = %self.url, history = body.history.len(), "Posting search request");
        let resp = self.http.post(&self.url).json(&body).send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorResponse>(&bytes)
                .map(|e| e.error)
                .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
            tracing::warn!(status = status.as_u16(), error = %message, "Search endpoint failed");
            return Err(ChatError::Service(format!("{}: {}", status.as_u16(), message)));
        }

        serde_json::from_slice::<Reply>(&bytes)
            .map_err(|e| ChatError::Service(format!("malformed reply: {}", e)))
    }
}
