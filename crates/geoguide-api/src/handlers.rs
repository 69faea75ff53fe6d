//! Route handler functions for all API endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde::{Deserialize, Serialize};

use geoguide_core::types::{Coordinates, Message, Reply, SearchRequest};

use crate::error::ApiError;
use crate::page::CHAT_PAGE_HTML;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model: String,
    pub uptime_secs: u64,
}

/// POST /api/search - answer one prompt with maps grounding.
pub async fn search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<Reply>, ApiError> {
    let Json(req) = payload?;

    let prompt = req
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Prompt is required".to_string()))?;

    let location = req.location.and_then(valid_location);
    let history: Vec<Message> = req.history.into_iter().map(Message::from).collect();

    let reply = state.search.answer(&history, prompt, location).await?;
    Ok(Json(reply))
}

/// Out-of-range coordinates are dropped rather than rejected.
fn valid_location(coords: Coordinates) -> Option<Coordinates> {
    if coords.is_valid() {
        Some(coords)
    } else {
        tracing::warn!(
            latitude = coords.latitude,
            longitude = coords.longitude,
            "Ignoring invalid location"
        );
        None
    }
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.search.model_name().to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET / - the browser chat page.
pub async fn ui() -> impl IntoResponse {
    Html(CHAT_PAGE_HTML)
}
