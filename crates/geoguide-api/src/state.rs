//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use geoguide_core::config::GeoguideConfig;
use geoguide_model::{GenerativeModel, GroundedSearch};

/// Shared application state. Cheap to clone; every field is behind an `Arc`
/// or is `Copy`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GeoguideConfig>,
    /// Grounded search over the injected model client.
    pub search: Arc<GroundedSearch>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: GeoguideConfig, model: Arc<dyn GenerativeModel>) -> Self {
        let search = GroundedSearch::new(model)
            .with_history_window(config.history.max_turns)
            .with_fallback_text(config.chat.fallback_text.clone());
        Self {
            config: Arc::new(config),
            search: Arc::new(search),
            start_time: Instant::now(),
        }
    }
}
