//! Host event loop.
//!
//! The host runtime delivers lifecycle events over a channel; the relay
//! handles them one at a time. Weather refreshes run as spawned tasks, so
//! a new trigger can overlap one still in flight; the session's generation
//! counter keeps a stale refresh from overwriting a newer reading.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use url::Url;

use festive_weather::{location, AcquisitionOptions, LocationSource, WeatherProvider};

use crate::device::{DeviceLink, DeviceMessage, WeatherMessage};
use crate::session::Session;
use crate::settings::SettingsPayload;

/// Lifecycle events delivered by the host runtime.
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// The watch-face application opened and the companion is live.
    Ready,
    /// The watch sent a message; its payload is not inspected, it only
    /// asks for a weather refresh.
    AppMessage,
    /// The user opened the settings page.
    ShowConfiguration,
    /// The settings page closed with its URL-encoded response.
    WebviewClosed(String),
}

pub struct Relay {
    session: Arc<Session>,
    provider: Arc<WeatherProvider>,
    source: Arc<dyn LocationSource>,
    link: Arc<dyn DeviceLink>,
    options: AcquisitionOptions,
    settings_url: Url,
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl Relay {
    pub fn new(
        session: Arc<Session>,
        provider: WeatherProvider,
        source: Arc<dyn LocationSource>,
        link: Arc<dyn DeviceLink>,
        options: AcquisitionOptions,
        settings_url: Url,
    ) -> Self {
        Self {
            session,
            provider: Arc::new(provider),
            source,
            link,
            options,
            settings_url,
            tracker: TaskTracker::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Token the host can use to stop the loop.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Page the user's settings live on.
    pub fn settings_url(&self) -> &Url {
        &self.settings_url
    }

    /// Consume host events until the channel closes or the loop is
    /// cancelled, then wait for in-flight refreshes.
    pub async fn run(&self, mut events: mpsc::Receiver<HostEvent>) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => self.handle(event).await,
                    None => break,
                },
            }
        }

        self.tracker.close();
        self.tracker.wait().await;
    }

    async fn handle(&self, event: HostEvent) {
        match event {
            HostEvent::Ready => {
                tracing::info!("companion ready");
                self.spawn_refresh();
            }
            HostEvent::AppMessage => {
                tracing::debug!("app message received");
                self.spawn_refresh();
            }
            HostEvent::ShowConfiguration => {
                tracing::info!(url = %self.settings_url, "opening settings page");
            }
            HostEvent::WebviewClosed(raw) => self.on_webview_closed(&raw).await,
        }
    }

    fn spawn_refresh(&self) {
        let generation = self.session.next_generation();
        let session = self.session.clone();
        let provider = self.provider.clone();
        let source = self.source.clone();
        let link = self.link.clone();
        let options = self.options;

        self.tracker.spawn(async move {
            refresh(generation, session, provider, source, link, options).await;
        });
    }

    async fn on_webview_closed(&self, raw: &str) {
        let payload = match SettingsPayload::from_webview(raw) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("discarding settings payload: {e}");
                return;
            }
        };
        tracing::info!("settings page returned a payload");

        if let Err(e) = self.session.apply_settings(&payload) {
            tracing::error!("failed to persist city preference: {e}");
            return;
        }

        self.spawn_refresh();

        if let Some(message) = payload.config_message() {
            match self.link.send(DeviceMessage::Config(message)).await {
                Ok(()) => tracing::info!("settings forwarded to watch"),
                Err(e) => tracing::warn!("failed to forward settings to watch: {e}"),
            }
        }
    }
}

/// One weather refresh: resolve the location, fetch the reading, send it.
///
/// Every failure is logged and ends the refresh without a message; a
/// refresh that is no longer the newest drops its send.
pub(crate) async fn refresh(
    generation: u64,
    session: Arc<Session>,
    provider: Arc<WeatherProvider>,
    source: Arc<dyn LocationSource>,
    link: Arc<dyn DeviceLink>,
    options: AcquisitionOptions,
) {
    let city = session.city();
    let query = match location::resolve(&city, source.as_ref(), &options).await {
        Ok(query) => query,
        Err(e) => {
            tracing::warn!("could not determine location: {e}");
            return;
        }
    };

    let reading = match provider.current(&query).await {
        Ok(reading) => reading,
        Err(e) => {
            tracing::warn!("weather fetch failed: {e}");
            return;
        }
    };

    if !session.is_current(generation) {
        tracing::debug!(generation, "dropping stale weather reading");
        return;
    }

    let message = DeviceMessage::Weather(WeatherMessage {
        temperature: reading.temperature,
    });
    match link.send(message).await {
        Ok(()) => tracing::info!(temperature = reading.temperature, "weather sent to watch"),
        Err(e) => tracing::warn!("failed to send weather to watch: {e}"),
    }
}
