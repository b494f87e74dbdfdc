use serde::{Deserialize, Serialize};

/// A position fix from the device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// What to ask the weather API about: a position fix or a city by name.
/// Exactly one form is active at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    Coordinates(Coordinates),
    City(String),
}

/// The single value the watch displays: whole-degree Fahrenheit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub temperature: i32,
}

/// Convert an API temperature (Kelvin) to rounded Fahrenheit.
pub fn kelvin_to_fahrenheit(kelvin: f64) -> i32 {
    (kelvin * 9.0 / 5.0 - 459.67).round() as i32
}

/// Location service errors
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Location error: {0}")]
    Location(#[from] LocationError),
    #[error("Weather API returned status {status}")]
    Api { status: u16 },
    #[error("Parse error: {0}")]
    Parse(String),
}
