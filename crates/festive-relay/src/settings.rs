//! Settings payload from the configuration web page.
//!
//! The page closes with a URL-encoded JSON object. Field values keep their
//! page-side JavaScript looseness (booleans, numbers, strings), so the
//! flags are kept as raw JSON values and tested for truthiness the way the
//! page's scripts would.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::device::ConfigMessage;

/// Settings payload errors
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload is not valid percent-encoding: {0}")]
    Encoding(String),
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything the settings page reports when it closes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPayload {
    pub location: Option<String>,
    pub use_location: Option<Value>,
    pub twenty_four_hour_format: Option<Value>,
    pub battery_display_on_off: Option<Value>,
    pub temperature_format: Option<Value>,
    pub birthday_list: Option<Value>,
    pub invert_colors: Option<Value>,
}

impl SettingsPayload {
    /// Decode the raw webview-closed response: percent-decode, then parse.
    pub fn from_webview(raw: &str) -> Result<Self, PayloadError> {
        let decoded =
            urlencoding::decode(raw).map_err(|e| PayloadError::Encoding(e.to_string()))?;
        Ok(serde_json::from_str(&decoded)?)
    }

    /// Whether the user asked for device location rather than a fixed city.
    pub fn wants_device_location(&self) -> bool {
        is_truthy(self.use_location.as_ref())
    }

    /// The message forwarded to the watch, or `None` when the payload's
    /// temperature-format flag is absent or falsy.
    pub fn config_message(&self) -> Option<ConfigMessage> {
        if !is_truthy(self.temperature_format.as_ref()) {
            return None;
        }

        Some(ConfigMessage {
            twenty_four_hour_format: self.twenty_four_hour_format.clone().unwrap_or(Value::Null),
            battery_display_on_off: self.battery_display_on_off.clone().unwrap_or(Value::Null),
            temperature_format: self.temperature_format.clone().unwrap_or(Value::Null),
            birthday_list: self.birthday_list.clone().unwrap_or(Value::Null),
            invert_colors: self.invert_colors.clone().unwrap_or(Value::Null),
        })
    }
}

/// JavaScript truthiness for the loosely-typed page fields.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}
