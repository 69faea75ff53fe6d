//! CLI argument definitions for the GeoGuide binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use geoguide_core::config::GeoguideConfig;
use geoguide_core::error::Result;
use geoguide_core::types::Coordinates;

/// GeoGuide: chat with a maps-grounded model.
#[derive(Parser, Debug)]
#[command(name = "geoguide", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Serve the chat page and the search endpoint (the default).
    Serve {
        /// Address to bind.
        #[arg(long)]
        host: Option<String>,
        /// API server port.
        #[arg(short = 'p', long)]
        port: Option<u16>,
    },
    /// Chat in the terminal.
    Chat {
        /// Latitude to report as the current position.
        #[arg(long, requires = "lng", allow_negative_numbers = true)]
        lat: Option<f64>,
        /// Longitude to report as the current position.
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lng: Option<f64>,
        /// Send turns to a running `geoguide serve` instead of the model.
        #[arg(long = "server-url")]
        server_url: Option<String>,
    },
}

impl CliArgs {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve {
            host: None,
            port: None,
        })
    }

    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > GEOGUIDE_CONFIG env var > ~/.geoguide/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("GEOGUIDE_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log filter.
    ///
    /// Priority: --log-level flag > RUST_LOG > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        if let Some(ref level) = self.log_level {
            return level.clone();
        }
        if let Ok(filter) = std::env::var("RUST_LOG") {
            if !filter.trim().is_empty() {
                return filter;
            }
        }
        config_level.to_string()
    }

    /// Fold command-line and environment overrides into `config`.
    pub fn apply_overrides(&self, config: &mut GeoguideConfig) -> Result<()> {
        match self.command() {
            Command::Serve { host, port } => {
                if let Some(host) = host {
                    config.server.host = host;
                }
                config.server.port = resolve_port(port, config.server.port);
            }
            Command::Chat {
                lat,
                lng,
                server_url,
            } => {
                if let (Some(lat), Some(lng)) = (lat, lng) {
                    let coords = Coordinates::new(lat, lng)?;
                    config.location.enabled = true;
                    config.location.latitude = Some(coords.latitude);
                    config.location.longitude = Some(coords.longitude);
                }
                if server_url.is_some() {
                    config.chat.server_url = server_url;
                }
            }
        }
        Ok(())
    }
}

/// Priority: --port flag > GEOGUIDE_PORT env var > config file value.
fn resolve_port(flag: Option<u16>, config_port: u16) -> u16 {
    if let Some(p) = flag {
        return p;
    }
    if let Ok(val) = std::env::var("GEOGUIDE_PORT") {
        if let Ok(p) = val.parse::<u16>() {
            return p;
        }
    }
    config_port
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".geoguide").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".geoguide").join("config.toml");
    }
    PathBuf::from("config.toml")
}
