//! Persistent key-value store for user preferences.
//!
//! A small JSON file holding string values. The watch companion keeps a
//! single entry in it, the chosen city name, where the empty string means
//! "no city override; use device location".

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// Key under which the chosen city name is persisted.
pub const CITY_KEY: &str = "city";

/// File-backed string store with get/set semantics.
#[derive(Debug)]
pub struct PreferenceStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl PreferenceStore {
    /// Open the store at the given path, reading existing values if the
    /// file is already there.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let values = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Read a value. Returns `None` for keys that were never written.
    pub fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    /// Write a value and persist the store to disk.
    pub fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock();
        values.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&*values)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> PreferenceStore {
        PreferenceStore::open(dir.path().join("preferences.json")).unwrap()
    }

    #[test]
    fn unwritten_key_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.get(CITY_KEY), None);
    }

    #[test]
    fn set_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.set(CITY_KEY, "Seattle").unwrap();
        assert_eq!(store.get(CITY_KEY).as_deref(), Some("Seattle"));
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        store_in(&dir).set(CITY_KEY, "Portland").unwrap();

        let reopened = store_in(&dir);
        assert_eq!(reopened.get(CITY_KEY).as_deref(), Some("Portland"));
    }

    #[test]
    fn empty_value_overwrites_previous_city() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.set(CITY_KEY, "Seattle").unwrap();
        store.set(CITY_KEY, "").unwrap();
        assert_eq!(store.get(CITY_KEY).as_deref(), Some(""));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "not json").unwrap();

        let err = PreferenceStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}
