//! Location resolution for weather fetches.
//!
//! The watch user either stored a city name (use it verbatim) or left it
//! empty, in which case the device position is acquired through a
//! [`LocationSource`].

use async_trait::async_trait;
use std::time::Duration;

use crate::types::{Coordinates, LocationError, LocationQuery};

/// Limits applied to one position acquisition.
#[derive(Debug, Clone, Copy)]
pub struct AcquisitionOptions {
    /// Give up after this long.
    pub timeout: Duration,
    /// A previous fix younger than this may be reused.
    pub maximum_age: Duration,
}

impl Default for AcquisitionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(15_000),
            maximum_age: Duration::from_millis(60_000),
        }
    }
}

/// A source of device position fixes.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn current_position(
        &self,
        options: &AcquisitionOptions,
    ) -> Result<Coordinates, LocationError>;
}

/// Produce the query for the next weather fetch.
///
/// A non-empty stored city short-circuits without touching the device; the
/// empty string means the position must be acquired.
pub async fn resolve(
    preference: &str,
    source: &dyn LocationSource,
    options: &AcquisitionOptions,
) -> Result<LocationQuery, LocationError> {
    if !preference.is_empty() {
        return Ok(LocationQuery::City(preference.to_string()));
    }

    let position = source.current_position(options).await?;
    tracing::debug!(
        latitude = position.latitude,
        longitude = position.longitude,
        "acquired device position"
    );
    Ok(LocationQuery::Coordinates(position))
}

/// Fallback for platforms without a geolocation backend.
#[derive(Debug, Default)]
pub struct UnsupportedSource;

#[async_trait]
impl LocationSource for UnsupportedSource {
    async fn current_position(
        &self,
        _options: &AcquisitionOptions,
    ) -> Result<Coordinates, LocationError> {
        Err(LocationError::ServiceUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedSource {
        fix: Coordinates,
        calls: AtomicUsize,
    }

    impl FixedSource {
        fn new(latitude: f64, longitude: f64) -> Self {
            Self {
                fix: Coordinates {
                    latitude,
                    longitude,
                },
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LocationSource for FixedSource {
        async fn current_position(
            &self,
            _options: &AcquisitionOptions,
        ) -> Result<Coordinates, LocationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.fix)
        }
    }

    #[tokio::test]
    async fn stored_city_skips_the_device() {
        let source = FixedSource::new(47.6, -122.3);
        let query = resolve("Seattle", &source, &AcquisitionOptions::default())
            .await
            .unwrap();

        assert_eq!(query, LocationQuery::City("Seattle".to_string()));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_preference_acquires_position() {
        let source = FixedSource::new(47.6, -122.3);
        let query = resolve("", &source, &AcquisitionOptions::default())
            .await
            .unwrap();

        assert_eq!(
            query,
            LocationQuery::Coordinates(Coordinates {
                latitude: 47.6,
                longitude: -122.3,
            })
        );
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn acquisition_failure_propagates() {
        let err = resolve("", &UnsupportedSource, &AcquisitionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LocationError::ServiceUnavailable));
    }
}
