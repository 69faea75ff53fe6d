//! Shared foundation for GeoGuide: domain types, configuration and errors.

pub mod config;
pub mod error;
pub mod types;

pub use config::GeoguideConfig;
pub use error::{GeoguideError, Result};
pub use types::*;
