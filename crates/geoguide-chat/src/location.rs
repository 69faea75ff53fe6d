//! One-shot, best-effort location lookup.
//!
//! Positioning is a capability of the host: it may be missing, refused, or
//! slow. Every failure degrades to "no location" and never blocks chatting.

use std::time::Duration;

use async_trait::async_trait;

use geoguide_core::config::LocationConfig;
use geoguide_core::types::{ConnectionState, Coordinates};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("positioning is not supported here")]
    Unsupported,
    #[error("permission to read the position was denied")]
    PermissionDenied,
    #[error("position unavailable: {0}")]
    Unavailable(String),
    #[error("position lookup timed out after {0:?}")]
    Timeout(Duration),
}

impl LocationError {
    /// Terminal probe state this failure leads to.
    pub fn connection_state(&self) -> ConnectionState {
        match self {
            LocationError::PermissionDenied => ConnectionState::Denied,
            _ => ConnectionState::Error,
        }
    }
}

/// Accuracy, wait bound and freshness requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self::from(&LocationConfig::default())
    }
}

impl From<&LocationConfig> for PositionOptions {
    fn from(config: &LocationConfig) -> Self {
        Self {
            high_accuracy: config.high_accuracy,
            timeout: config.timeout(),
            maximum_age: config.maximum_age(),
        }
    }
}

/// Host positioning capability.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<Coordinates, LocationError>;
}

/// Always reports the same position.
pub struct FixedLocation(pub Coordinates);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

/// A host without positioning.
pub struct NoLocation;

#[async_trait]
impl LocationProvider for NoLocation {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinates, LocationError> {
        Err(LocationError::Unsupported)
    }
}

/// A configured position that cannot be used.
pub struct UnusableLocation(pub String);

#[async_trait]
impl LocationProvider for UnusableLocation {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinates, LocationError> {
        Err(LocationError::Unavailable(self.0.clone()))
    }
}

/// Choose a provider from config: a fixed position if one is configured,
/// otherwise none. A half-set or out-of-range position is unavailable.
pub fn provider_from_config(config: &LocationConfig) -> Box<dyn LocationProvider> {
    if !config.enabled {
        return Box::new(NoLocation);
    }
    match (config.fixed_coordinates(), config.latitude, config.longitude) {
        (Some(coords), _, _) => Box::new(FixedLocation(coords)),
        (None, None, None) => Box::new(NoLocation),
        (None, lat, lng) => Box::new(UnusableLocation(format!(
            "configured position {:?}, {:?} is incomplete or out of range",
            lat, lng
        ))),
    }
}

/// Ask `provider` for a position, giving up after `options.timeout`.
pub async fn acquire_location(
    provider: &dyn LocationProvider,
    options: &PositionOptions,
) -> Result<Coordinates, LocationError> {
    match tokio::time::timeout(options.timeout, provider.current_position(options)).await {
        Ok(result) => result,
        Err(_) => Err(LocationError::Timeout(options.timeout)),
    }
}

/// Probe state plus the position it produced, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LocationStatus {
    state: ConnectionState,
    coordinates: Option<Coordinates>,
}

impl LocationStatus {
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    /// Record the probe outcome. Only the first call has any effect; returns
    /// whether this call performed the transition.
    pub fn resolve(&mut self, outcome: &Result<Coordinates, LocationError>) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        match outcome {
            Ok(coords) => {
                self.state = ConnectionState::Connected;
                self.coordinates = Some(*coords);
            }
            Err(e) => {
                self.state = e.connection_state();
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Refusing;

    #[async_trait]
    impl LocationProvider for Refusing {
        async fn current_position(
            &self,
            _options: &PositionOptions,
        ) -> Result<Coordinates, LocationError> {
            Err(LocationError::PermissionDenied)
        }
    }

    struct NeverAnswers;

    #[async_trait]
    impl LocationProvider for NeverAnswers {
        async fn current_position(
            &self,
            _options: &PositionOptions,
        ) -> Result<Coordinates, LocationError> {
            std::future::pending().await
        }
    }

    fn here() -> Coordinates {
        Coordinates {
            latitude: 41.39,
            longitude: 2.17,
        }
    }

    #[test]
    fn test_default_options() {
        let options = PositionOptions::default();
        assert!(options.high_accuracy);
        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(options.maximum_age, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_fixed_location_succeeds() {
        let result = acquire_location(&FixedLocation(here()), &PositionOptions::default()).await;
        assert_eq!(result, Ok(here()));
    }

    #[tokio::test]
    async fn test_no_location_is_unsupported() {
        let result = acquire_location(&NoLocation, &PositionOptions::default()).await;
        assert_eq!(result, Err(LocationError::Unsupported));
    }

    #[tokio::test]
    async fn test_denied_is_reported() {
        let result = acquire_location(&Refusing, &PositionOptions::default()).await;
        assert_eq!(result, Err(LocationError::PermissionDenied));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out() {
        let options = PositionOptions {
            timeout: Duration::from_millis(5000),
            ..PositionOptions::default()
        };
        let result = acquire_location(&NeverAnswers, &options).await;
        assert_eq!(result, Err(LocationError::Timeout(Duration::from_millis(5000))));
    }

    #[test]
    fn test_error_to_connection_state() {
        assert_eq!(
            LocationError::PermissionDenied.connection_state(),
            ConnectionState::Denied
        );
        assert_eq!(
            LocationError::Unsupported.connection_state(),
            ConnectionState::Error
        );
        assert_eq!(
            LocationError::Timeout(Duration::from_secs(5)).connection_state(),
            ConnectionState::Error
        );
        assert_eq!(
            LocationError::Unavailable("no fix".into()).connection_state(),
            ConnectionState::Error
        );
    }

    #[test]
    fn test_status_resolves_once() {
        let mut status = LocationStatus::default();
        assert_eq!(status.state(), ConnectionState::Connecting);

        assert!(status.resolve(&Ok(here())));
        assert_eq!(status.state(), ConnectionState::Connected);
        assert_eq!(status.coordinates(), Some(here()));

        assert!(!status.resolve(&Err(LocationError::PermissionDenied)));
        assert_eq!(status.state(), ConnectionState::Connected);
        assert_eq!(status.coordinates(), Some(here()));
    }

    #[test]
    fn test_status_failure_keeps_no_coordinates() {
        let mut status = LocationStatus::default();
        assert!(status.resolve(&Err(LocationError::PermissionDenied)));
        assert_eq!(status.state(), ConnectionState::Denied);
        assert!(status.coordinates().is_none());

        assert!(!status.resolve(&Ok(here())));
        assert!(status.coordinates().is_none());
    }

    #[tokio::test]
    async fn test_provider_from_config() {
        let mut config = LocationConfig::default();
        let provider = provider_from_config(&config);
        assert!(provider
            .current_position(&PositionOptions::default())
            .await
            .is_err());

        config.latitude = Some(here().latitude);
        config.longitude = Some(here().longitude);
        let provider = provider_from_config(&config);
        assert_eq!(
            provider.current_position(&PositionOptions::default()).await,
            Ok(here())
        );

        config.enabled = false;
        let provider = provider_from_config(&config);
        assert_eq!(
            provider.current_position(&PositionOptions::default()).await,
            Err(LocationError::Unsupported)
        );
    }

    #[tokio::test]
    async fn test_provider_from_config_bad_position_is_unavailable() {
        let mut config = LocationConfig {
            latitude: Some(here().latitude),
            ..LocationConfig::default()
        };
        let provider = provider_from_config(&config);
        let result = acquire_location(provider.as_ref(), &PositionOptions::default()).await;
        assert!(matches!(result, Err(LocationError::Unavailable(_))));

        config.longitude = Some(200.0);
        let provider = provider_from_config(&config);
        let err = provider
            .current_position(&PositionOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("out of range"));
        assert_eq!(err.connection_state(), ConnectionState::Error);
    }
}
