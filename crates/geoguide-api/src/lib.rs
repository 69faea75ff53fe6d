//! GeoGuide HTTP server.
//!
//! Serves the browser chat page, the maps-grounded search endpoint, and a
//! health check.

pub mod error;
pub mod handlers;
pub mod page;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
