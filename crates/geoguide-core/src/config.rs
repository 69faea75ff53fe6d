use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{GeoguideError, Result};
use crate::types::Coordinates;

/// Top-level configuration for GeoGuide.
///
/// Loaded from `~/.geoguide/config.toml` by default. Every section falls back
/// to its defaults when missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeoguideConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub location: LocationConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl GeoguideConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: GeoguideConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration if the file exists.
    ///
    /// A missing file is `Ok(None)`; any other read or parse failure is an
    /// error.
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        match Self::load(path) {
            Ok(config) => Ok(Some(config)),
            Err(GeoguideError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                debug!("No configuration at {}", path.display());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Generative model provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL of the Generative Language API.
    pub api_base: String,
    /// Model name. Maps grounding requires a Gemini 2.5 model.
    pub model: String,
    /// Environment variable that holds the API key.
    pub api_key_env: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

impl ModelConfig {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(GeoguideError::Config(format!(
                "{} is not set",
                self.api_key_env
            ))),
        }
    }
}

/// Location lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Whether to look up a position at all.
    pub enabled: bool,
    /// Fixed position reported to the model when set (both fields required).
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Ask the positioning source for its most accurate fix.
    pub high_accuracy: bool,
    /// Upper bound on the lookup, in milliseconds.
    pub timeout_ms: u64,
    /// Maximum age of a cached fix, in milliseconds. 0 forces a fresh one.
    pub maximum_age_ms: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            latitude: None,
            longitude: None,
            high_accuracy: true,
            timeout_ms: 5000,
            maximum_age_ms: 0,
        }
    }
}

impl LocationConfig {
    /// The configured fixed position, if both halves are present and valid.
    pub fn fixed_coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Coordinates::new(lat, lng).ok(),
            _ => None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn maximum_age(&self) -> Duration {
        Duration::from_millis(self.maximum_age_ms)
    }
}

/// Conversation history replay settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Replay at most this many prior messages per request. Unset replays all.
    pub max_turns: Option<usize>,
}

/// Chat transcript settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// First assistant message of every session. Empty disables it.
    pub greeting: String,
    /// Reply text used when the model returns no answer.
    pub fallback_text: String,
    /// Reply text used when the model call fails.
    pub apology_text: String,
    /// Endpoint of a running `geoguide serve`; unset calls the model directly.
    pub server_url: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            greeting: "Hi! I'm your map guide. Tell me what you're looking for or where \
                       you want to go, and I'll show you the best options on Google Maps."
                .to_string(),
            fallback_text: "No information found.".to_string(),
            apology_text: "Sorry, I had trouble reaching the search service. Please try again."
                .to_string(),
            server_url: None,
        }
    }
}
