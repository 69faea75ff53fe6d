//! Gemini `generateContent` client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use geoguide_core::config::ModelConfig;

use crate::error::ModelError;
use crate::request::GenerateContentRequest;
use crate::response::GenerateContentResponse;

/// A hosted model that answers `generateContent` requests.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Model name, for logs and health output.
    fn name(&self) -> &str;

    /// Send one request. No retry and no timeout.
    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ModelError>;
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// HTTP client for the Generative Language API.
pub struct GeminiClient {
    http: Client,
    api_base: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        api_base: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// Build a client from config, reading the key from the environment.
    pub fn from_config(config: &ModelConfig) -> geoguide_core::Result<Self> {
        let api_key = config.api_key()?;
        Ok(Self::new(&config.api_base, &config.model, api_key))
    }

    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ModelError> {
        let url = self.endpoint();
        tracing::debug!(
            model = %self.model,
            turns = request.contents.len(),
            biased = request.tool_config.is_some(),
            "Sending generateContent request"
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            tracing::warn!(status = status.as_u16(), error = %message, "Gemini API error");
            return Err(ModelError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_slice(&body)?;
        tracing::debug!(candidates = parsed.candidates.len(), "Gemini response received");
        Ok(parsed)
    }
}
