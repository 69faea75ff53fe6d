//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, compression, a body size
//! limit, and the endpoint handlers.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use geoguide_core::config::ServerConfig;
use geoguide_core::error::{GeoguideError, Result};

use crate::handlers;
use crate::state::AppState;

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server);

    Router::new()
        .route("/", get(handlers::ui))
        .route("/health", get(handlers::health))
        .route("/api/search", post(handlers::search))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Allow the page's own origin, on both loopback spellings.
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        format!("http://{}:{}", server.host, server.port),
        format!("http://127.0.0.1:{}", server.port),
        format!("http://localhost:{}", server.port),
    ]
    .iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

/// Bind the configured address and serve until the process stops.
pub async fn start_server(state: AppState) -> Result<()> {
    let addr = state.config.server.bind_addr();
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| GeoguideError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Starting API server on http://{}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| GeoguideError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
