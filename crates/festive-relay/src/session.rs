//! Per-session state: the cached city preference and the refresh
//! generation counter.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use festive_core::{PreferenceStore, StoreError, CITY_KEY};

use crate::settings::SettingsPayload;

/// State shared by the event handlers and in-flight refreshes.
///
/// The cached city always reflects the last value written to the store in
/// this session; [`Session::apply_settings`] re-reads the store after
/// writing to keep that invariant.
pub struct Session {
    store: PreferenceStore,
    city: Mutex<String>,
    generation: AtomicU64,
}

impl Session {
    /// Read the stored preference once and cache it.
    pub fn new(store: PreferenceStore) -> Self {
        let city = store.get(CITY_KEY).unwrap_or_default();
        if city.is_empty() {
            tracing::debug!("no stored city, device location will be used");
        } else {
            tracing::debug!(%city, "using stored city");
        }

        Self {
            store,
            city: Mutex::new(city),
            generation: AtomicU64::new(0),
        }
    }

    /// The cached city preference; empty means "use device location".
    pub fn city(&self) -> String {
        self.city.lock().clone()
    }

    /// Persist the location choice from a settings payload.
    ///
    /// The city name is written first; a truthy use-device-location flag
    /// then overwrites it with the empty sentinel, so the flag wins when
    /// both are present. The cache is refreshed from the store afterwards.
    pub fn apply_settings(&self, payload: &SettingsPayload) -> Result<(), StoreError> {
        if let Some(location) = &payload.location {
            self.store.set(CITY_KEY, location)?;
        }
        if payload.wants_device_location() {
            self.store.set(CITY_KEY, "")?;
        }

        let current = self.store.get(CITY_KEY).unwrap_or_default();
        *self.city.lock() = current;
        Ok(())
    }

    /// Stamp a new refresh; older stamps become stale.
    pub fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether a stamped refresh is still the most recent one.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_in(dir: &tempfile::TempDir) -> Session {
        let store = PreferenceStore::open(dir.path().join("preferences.json")).unwrap();
        Session::new(store)
    }

    fn payload(json: serde_json::Value) -> SettingsPayload {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn starts_with_empty_preference() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(session_in(&dir).city(), "");
    }

    #[test]
    fn settings_location_is_persisted_and_cached() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(&dir);

        session
            .apply_settings(&payload(serde_json::json!({ "location": "Seattle" })))
            .unwrap();
        assert_eq!(session.city(), "Seattle");

        // a fresh session sees the persisted value
        assert_eq!(session_in(&dir).city(), "Seattle");
    }

    #[test]
    fn use_location_flag_wins_over_city() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(&dir);

        session
            .apply_settings(&payload(serde_json::json!({
                "location": "Seattle",
                "useLocation": true
            })))
            .unwrap();

        assert_eq!(session.city(), "");
        assert_eq!(session_in(&dir).city(), "");
    }

    #[test]
    fn generation_marks_older_refreshes_stale() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(&dir);

        let first = session.next_generation();
        assert!(session.is_current(first));

        let second = session.next_generation();
        assert!(!session.is_current(first));
        assert!(session.is_current(second));
    }
}
