pub mod config;
pub mod error;
pub mod store;

pub use config::{Config, LocationConfig, SettingsPageConfig, WeatherConfig};
pub use error::{AppError, ConfigError, StoreError};
pub use store::{PreferenceStore, CITY_KEY};

use anyhow::Result;

/// Initialize process-wide services (logging).
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("festive companion core initialized");
    Ok(())
}
