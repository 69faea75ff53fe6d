//! Error types for the chat session.

use geoguide_core::error::GeoguideError;
use geoguide_model::ModelError;

/// Errors from sending a chat turn.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("model error: {0}")]
    Model(#[from] ModelError),
    #[error("search service error: {0}")]
    Service(String),
    #[error("session state error: {0}")]
    State(String),
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Service(err.to_string())
    }
}

impl From<ChatError> for GeoguideError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::EmptyMessage => GeoguideError::Input(err.to_string()),
            other => GeoguideError::Model(other.to_string()),
        }
    }
}
