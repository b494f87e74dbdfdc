//! Relay between the host runtime, the weather service and the watch.
//!
//! Consumes lifecycle events from the host (ready, app message, settings
//! page opened/closed), drives weather refreshes and forwards messages to
//! the watch over a [`device::DeviceLink`].

pub mod device;
pub mod events;
pub mod session;
pub mod settings;

pub use device::{
    ChannelLink, ConfigMessage, DeviceLink, DeviceMessage, DeviceSendError, WeatherMessage,
};
pub use events::{HostEvent, Relay};
pub use session::Session;
pub use settings::{PayloadError, SettingsPayload};
