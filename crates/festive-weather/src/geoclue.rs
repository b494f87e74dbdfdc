//! Device position via GeoClue2 over D-Bus.
//!
//! One acquisition creates a GeoClue client, starts it and polls its
//! `Location` property until the service publishes a fix. The property is
//! read directly through `org.freedesktop.DBus.Properties` (bypasses the
//! zbus cache). A fix younger than `maximum_age` is reused without touching
//! the bus again.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use zbus::zvariant::{ObjectPath, OwnedObjectPath, OwnedValue};
use zbus::Connection;

use crate::location::{AcquisitionOptions, LocationSource};
use crate::types::{Coordinates, LocationError};

const DESKTOP_ID: &str = "festive-companion";
const GEOCLUE_SERVICE: &str = "org.freedesktop.GeoClue2";
// GClueAccuracyLevel, EXACT
const ACCURACY_EXACT: u32 = 8;
const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[zbus::proxy(
    interface = "org.freedesktop.GeoClue2.Manager",
    default_service = "org.freedesktop.GeoClue2",
    default_path = "/org/freedesktop/GeoClue2/Manager",
    gen_blocking = false
)]
trait Manager {
    /// GetClient method - allocate a client object for this caller
    fn get_client(&self) -> zbus::Result<OwnedObjectPath>;
}

#[zbus::proxy(
    interface = "org.freedesktop.GeoClue2.Client",
    default_service = "org.freedesktop.GeoClue2",
    gen_blocking = false
)]
trait Client {
    /// Start method - begin position acquisition
    fn start(&self) -> zbus::Result<()>;

    /// Stop method - end position acquisition
    fn stop(&self) -> zbus::Result<()>;

    /// DesktopId property - identifies the requesting application
    #[zbus(property)]
    fn desktop_id(&self) -> zbus::Result<String>;

    /// DesktopId property setter
    #[zbus(property)]
    fn set_desktop_id(&self, id: &str) -> zbus::Result<()>;

    /// RequestedAccuracyLevel property
    #[zbus(property)]
    fn requested_accuracy_level(&self) -> zbus::Result<u32>;

    /// RequestedAccuracyLevel property setter
    #[zbus(property)]
    fn set_requested_accuracy_level(&self, level: u32) -> zbus::Result<()>;
}

#[zbus::proxy(
    interface = "org.freedesktop.GeoClue2.Location",
    default_service = "org.freedesktop.GeoClue2",
    gen_blocking = false
)]
trait Location {
    #[zbus(property)]
    fn latitude(&self) -> zbus::Result<f64>;

    #[zbus(property)]
    fn longitude(&self) -> zbus::Result<f64>;
}

/// Read the client's `Location` property directly from D-Bus (bypasses the
/// zbus property cache, which would not see updates published after Start).
async fn client_location_path(
    connection: &Connection,
    client_path: &ObjectPath<'_>,
) -> zbus::Result<OwnedObjectPath> {
    let value: OwnedValue = connection
        .call_method(
            Some(GEOCLUE_SERVICE),
            client_path,
            Some("org.freedesktop.DBus.Properties"),
            "Get",
            &("org.freedesktop.GeoClue2.Client", "Location"),
        )
        .await?
        .body()
        .deserialize()?;

    let path = value
        .try_into()
        .map_err(|e: zbus::zvariant::Error| zbus::Error::from(e))?;
    Ok(path)
}

fn map_zbus_error(err: zbus::Error) -> LocationError {
    match &err {
        zbus::Error::MethodError(name, _, _)
            if name.as_str() == "org.freedesktop.DBus.Error.AccessDenied" =>
        {
            LocationError::PermissionDenied
        }
        _ => LocationError::Other(err.to_string()),
    }
}

/// GeoClue2-backed [`LocationSource`].
#[derive(Debug, Default)]
pub struct GeoclueSource {
    last_fix: Mutex<Option<(Coordinates, Instant)>>,
}

impl GeoclueSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn acquire(&self) -> Result<Coordinates, LocationError> {
        let connection = Connection::system()
            .await
            .map_err(|_| LocationError::ServiceUnavailable)?;

        let manager = ManagerProxy::new(&connection)
            .await
            .map_err(map_zbus_error)?;
        let client_path = manager.get_client().await.map_err(map_zbus_error)?;

        let client = ClientProxy::builder(&connection)
            .path(&client_path)
            .map_err(map_zbus_error)?
            .build()
            .await
            .map_err(map_zbus_error)?;

        // GeoClue refuses Start from clients without an identity
        client
            .set_desktop_id(DESKTOP_ID)
            .await
            .map_err(|e| map_zbus_error(e.into()))?;
        client
            .set_requested_accuracy_level(ACCURACY_EXACT)
            .await
            .map_err(|e| map_zbus_error(e.into()))?;
        client.start().await.map_err(map_zbus_error)?;

        // Location stays "/" until the service publishes the first fix
        let mut poll = tokio::time::interval(POLL_INTERVAL);
        let location_path = loop {
            poll.tick().await;
            let path = client_location_path(&connection, &client_path)
                .await
                .map_err(map_zbus_error)?;
            if path.as_str() != "/" {
                break path;
            }
        };

        let location = LocationProxy::builder(&connection)
            .path(&location_path)
            .map_err(map_zbus_error)?
            .build()
            .await
            .map_err(map_zbus_error)?;

        let fix = Coordinates {
            latitude: location.latitude().await.map_err(|e| map_zbus_error(e.into()))?,
            longitude: location
                .longitude()
                .await
                .map_err(|e| map_zbus_error(e.into()))?,
        };

        if let Err(e) = client.stop().await {
            tracing::debug!("failed to stop GeoClue client: {e}");
        }

        Ok(fix)
    }
}

#[async_trait]
impl LocationSource for GeoclueSource {
    async fn current_position(
        &self,
        options: &AcquisitionOptions,
    ) -> Result<Coordinates, LocationError> {
        if let Some((fix, at)) = *self.last_fix.lock() {
            if at.elapsed() <= options.maximum_age {
                tracing::debug!("reusing position fix within maximum age");
                return Ok(fix);
            }
        }

        let fix = tokio::time::timeout(options.timeout, self.acquire())
            .await
            .map_err(|_| LocationError::Timeout)??;

        *self.last_fix.lock() = Some((fix, Instant::now()));
        Ok(fix)
    }
}
