use thiserror::Error;

/// Top-level error type for GeoGuide.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for GeoguideError` where the `?` operator needs to
/// cross crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GeoguideError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Location error: {0}")]
    Location(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for GeoguideError {
    fn from(err: toml::de::Error) -> Self {
        GeoguideError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for GeoguideError {
    fn from(err: toml::ser::Error) -> Self {
        GeoguideError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for GeoguideError {
    fn from(err: serde_json::Error) -> Self {
        GeoguideError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for GeoGuide operations.
pub type Result<T> = std::result::Result<T, GeoguideError>;
