//! Companion daemon for the Festive Time watch face.
//!
//! Wires the relay together: config, preference store, weather provider,
//! geolocation source and an in-process device link whose frames are
//! logged. Host events are read from stdin, one command per line:
//!
//!   refresh            deliver an app-message event (weather refresh)
//!   show               deliver a show-configuration event
//!   config <payload>   deliver a webview-closed event with the raw payload
//!   quit               close the event stream and exit

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use url::Url;

use festive_core::{Config, PreferenceStore};
use festive_relay::{ChannelLink, DeviceLink, HostEvent, Relay, Session};
use festive_weather::{AcquisitionOptions, LocationSource, WeatherProvider};

#[cfg(target_os = "linux")]
fn system_location_source() -> Arc<dyn LocationSource> {
    Arc::new(festive_weather::GeoclueSource::new())
}

#[cfg(not(target_os = "linux"))]
fn system_location_source() -> Arc<dyn LocationSource> {
    Arc::new(festive_weather::UnsupportedSource)
}

#[tokio::main]
async fn main() -> Result<()> {
    festive_core::init()?;

    let config = Config::load().context("failed to load configuration")?;
    let store = PreferenceStore::open(config.preferences_path())
        .context("failed to open preference store")?;
    let session = Arc::new(Session::new(store));

    let api_url = Url::parse(&config.weather.api_url).context("invalid weather API URL")?;
    let provider = WeatherProvider::new(
        api_url,
        config.weather.api_key.clone(),
        Duration::from_secs(config.weather.http_timeout_secs),
    )
    .context("failed to create weather provider")?;

    let settings_url =
        Url::parse(&config.settings_page.url).context("invalid settings page URL")?;
    let options = AcquisitionOptions {
        timeout: Duration::from_millis(config.location.timeout_ms),
        maximum_age: Duration::from_millis(config.location.maximum_age_ms),
    };

    let (link, mut outbound) = ChannelLink::pair(16);
    let link: Arc<dyn DeviceLink> = Arc::new(link);

    // Stand-in for the watch transport: log every outbound frame
    tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            match serde_json::to_string(&message) {
                Ok(frame) => tracing::info!(%frame, "outbound device message"),
                Err(e) => tracing::error!("unserializable device message: {e}"),
            }
        }
    });

    let relay = Arc::new(Relay::new(
        session,
        provider,
        system_location_source(),
        link,
        options,
        settings_url,
    ));

    let cancel = relay.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutting down");
            cancel.cancel();
        }
    });

    let (events, receiver) = mpsc::channel(16);
    events
        .send(HostEvent::Ready)
        .await
        .context("event loop closed before start")?;
    tokio::spawn(read_host_events(events));

    relay.run(receiver).await;
    Ok(())
}

/// Translate stdin lines into host events until EOF or `quit`.
async fn read_host_events(events: mpsc::Sender<HostEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        let event = if line.is_empty() {
            continue;
        } else if line == "quit" {
            break;
        } else if line == "refresh" {
            HostEvent::AppMessage
        } else if line == "show" {
            HostEvent::ShowConfiguration
        } else if let Some(payload) = line.strip_prefix("config ") {
            HostEvent::WebviewClosed(payload.to_string())
        } else {
            tracing::warn!(%line, "unknown command");
            continue;
        };

        if events.send(event).await.is_err() {
            break;
        }
    }
}
