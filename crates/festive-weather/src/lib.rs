//! Weather for the watch face.
//!
//! Resolves a location (stored city name or device geolocation), fetches
//! current conditions from OpenWeatherMap and normalizes them to the single
//! integer reading the watch displays.

pub mod location;
pub mod provider;
pub mod types;

#[cfg(target_os = "linux")]
mod geoclue;

pub use location::{resolve, AcquisitionOptions, LocationSource, UnsupportedSource};
pub use provider::WeatherProvider;
pub use types::*;

#[cfg(target_os = "linux")]
pub use geoclue::GeoclueSource;
