//! Messages sent to the watch and the link carrying them.
//!
//! The transport itself (Bluetooth, emulator socket) lives outside this
//! crate; the relay only sees the [`DeviceLink`] trait.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

/// Current weather, the only thing the watch face polls for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeatherMessage {
    pub temperature: i32,
}

/// Display preferences forwarded verbatim from the settings page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMessage {
    pub twenty_four_hour_format: Value,
    pub battery_display_on_off: Value,
    pub temperature_format: Value,
    pub birthday_list: Value,
    pub invert_colors: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DeviceMessage {
    Weather(WeatherMessage),
    Config(ConfigMessage),
}

/// Device messaging channel errors
#[derive(Debug, Error)]
pub enum DeviceSendError {
    #[error("device link is closed")]
    Closed,
    #[error("device rejected the message: {0}")]
    Rejected(String),
}

/// Outbound half of the device messaging channel.
#[async_trait]
pub trait DeviceLink: Send + Sync {
    async fn send(&self, message: DeviceMessage) -> Result<(), DeviceSendError>;
}

/// In-process link backed by a tokio channel. The host runtime owns the
/// receiving half and forwards frames to the transport.
#[derive(Debug, Clone)]
pub struct ChannelLink {
    sender: mpsc::Sender<DeviceMessage>,
}

impl ChannelLink {
    /// Create a link and the receiver the host drains.
    pub fn pair(capacity: usize) -> (Self, mpsc::Receiver<DeviceMessage>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl DeviceLink for ChannelLink {
    async fn send(&self, message: DeviceMessage) -> Result<(), DeviceSendError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| DeviceSendError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weather_message_is_a_single_key_mapping() {
        let json = serde_json::to_value(DeviceMessage::Weather(WeatherMessage {
            temperature: 70,
        }))
        .unwrap();

        assert_eq!(json, serde_json::json!({ "temperature": 70 }));
    }

    #[test]
    fn config_message_has_exactly_five_fixed_keys() {
        let message = ConfigMessage {
            twenty_four_hour_format: Value::Bool(true),
            battery_display_on_off: Value::Bool(false),
            temperature_format: Value::from(1),
            birthday_list: serde_json::json!(["10-09 Robert"]),
            invert_colors: Value::Bool(false),
        };
        let json = serde_json::to_value(&message).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object.len(), 5);
        for key in [
            "twentyFourHourFormat",
            "batteryDisplayOnOff",
            "temperatureFormat",
            "birthdayList",
            "invertColors",
        ] {
            assert!(object.contains_key(key), "missing {key}");
        }
    }

    #[tokio::test]
    async fn channel_link_delivers_messages() {
        let (link, mut receiver) = ChannelLink::pair(4);
        link.send(DeviceMessage::Weather(WeatherMessage { temperature: 32 }))
            .await
            .unwrap();

        let received = receiver.recv().await.unwrap();
        assert_eq!(
            received,
            DeviceMessage::Weather(WeatherMessage { temperature: 32 })
        );
    }

    #[tokio::test]
    async fn send_on_closed_link_is_reported() {
        let (link, receiver) = ChannelLink::pair(1);
        drop(receiver);

        let err = link
            .send(DeviceMessage::Weather(WeatherMessage { temperature: 0 }))
            .await
            .unwrap_err();
        assert!(matches!(err, DeviceSendError::Closed));
    }
}
