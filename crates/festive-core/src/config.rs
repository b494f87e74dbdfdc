//! Companion configuration: weather API access, geolocation limits and the
//! settings page location. Loaded from a TOML file, created with defaults on
//! first run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.toml";
const PREFERENCES_FILE: &str = "preferences.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// Weather API settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Geolocation acquisition settings
    #[serde(default)]
    pub location: LocationConfig,

    /// Watch settings page
    #[serde(default)]
    pub settings_page: SettingsPageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Current-conditions endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API credential appended to every request
    #[serde(default = "default_api_key")]
    pub api_key: String,

    /// Overall timeout for one fetch, in seconds
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://api.openweathermap.org/data/2.5/weather".to_string()
}

fn default_api_key() -> String {
    "8c467bea8bafbdf81de33ba4aba6cabb".to_string()
}

fn default_http_timeout_secs() -> u64 {
    10
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: default_api_key(),
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Give up on a position fix after this long, in milliseconds
    #[serde(default = "default_location_timeout_ms")]
    pub timeout_ms: u64,

    /// A fix younger than this is reused instead of asking again, in milliseconds
    #[serde(default = "default_maximum_age_ms")]
    pub maximum_age_ms: u64,
}

fn default_location_timeout_ms() -> u64 {
    15_000
}

fn default_maximum_age_ms() -> u64 {
    60_000
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_location_timeout_ms(),
            maximum_age_ms: default_maximum_age_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsPageConfig {
    /// Page the watch app opens for user settings
    #[serde(default = "default_settings_url")]
    pub url: String,
}

fn default_settings_url() -> String {
    "http://blackjack26.github.io/FestiveTimeWebpage".to_string()
}

impl Default for SettingsPageConfig {
    fn default() -> Self {
        Self {
            url: default_settings_url(),
        }
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("festive-companion")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            weather: WeatherConfig::default(),
            location: LocationConfig::default(),
            settings_page: SettingsPageConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default path, creating the file with
    /// defaults if it doesn't exist yet.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(default_config_dir())
    }

    /// Load configuration rooted at the given directory.
    pub fn load_from(config_dir: PathBuf) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if !config_path.exists() {
            let config = Self {
                config_dir,
                ..Self::default()
            };
            config.save()?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(&config_path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.config_dir = config_dir;

        Ok(config)
    }

    /// Write the configuration back to its file.
    pub fn save(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.config_dir)?;
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(self.config_dir.join(CONFIG_FILE), contents)?;
        Ok(())
    }

    /// Path of the persisted user preferences next to the config file.
    pub fn preferences_path(&self) -> PathBuf {
        self.config_dir.join(PREFERENCES_FILE)
    }
}
