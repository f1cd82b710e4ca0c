//! Persistence of the saber configuration in a local key-value store.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

use crate::config::SaberConfiguration;
use crate::error::{StoreError, StoreResult};

/// Key under which the configuration is stored.
pub const STORAGE_KEY: &str = "customSaberConfig";

/// Local, synchronous string store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> StoreResult<()>;
    /// Returns whether a value was present.
    fn remove(&mut self, key: &str) -> StoreResult<bool>;
}

/// In-process store, used by tests and throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<bool> {
        Ok(self.entries.remove(key).is_some())
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        let valid = !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(path, value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<bool> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Reads and writes the saved [`SaberConfiguration`]. Read problems never surface as
/// errors: anything unreadable counts as "nothing saved".
#[derive(Debug)]
pub struct ConfigStore<S> {
    store: S,
}

impl<S: KeyValueStore> ConfigStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// The saved configuration, repaired field by field, or `None` when absent or unreadable.
    pub fn load(&self) -> Option<SaberConfiguration> {
        let raw = match self.store.get(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Failed to read saved saber: {}", e);
                return None;
            }
        };
        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Saved saber is not valid JSON ({}), ignoring it", e);
                return None;
            }
        };
        if !value.is_object() {
            log::warn!("Saved saber is not a JSON object, ignoring it");
            return None;
        }
        Some(SaberConfiguration::validate(&value))
    }

    pub fn load_or_default(&self) -> SaberConfiguration {
        self.load().unwrap_or_default()
    }

    pub fn has_saved(&self) -> bool {
        matches!(self.store.get(STORAGE_KEY), Ok(Some(_)))
    }

    /// Stamp `config` with the current time and write it. Returns the stamped copy.
    pub fn save(&mut self, config: &SaberConfiguration) -> StoreResult<SaberConfiguration> {
        let stamped = SaberConfiguration {
            timestamp: Some(now_millis()),
            ..config.clone()
        };
        let json = serde_json::to_string(&stamped)?;
        self.store.set(STORAGE_KEY, &json)?;
        log::info!(
            "Saved saber: {} blade, {}/{}/{} hilt",
            stamped.blade_color,
            stamped.pommel_type,
            stamped.grip_type,
            stamped.emitter_type
        );
        Ok(stamped)
    }

    /// Delete the saved configuration. Returns whether one existed.
    pub fn clear(&mut self) -> StoreResult<bool> {
        let removed = self.store.remove(STORAGE_KEY)?;
        if removed {
            log::info!("Deleted saved saber configuration");
        }
        Ok(removed)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use procgen::{BladeColor, PartKind};

    #[test]
    fn save_then_load_round_trips_with_timestamp() {
        let mut configs = ConfigStore::new(MemoryStore::new());
        assert!(configs.load().is_none());
        assert!(!configs.has_saved());

        let config = SaberConfiguration::create_default().apply_part_change(PartKind::Blade, "green");
        let stamped = configs.save(&config).unwrap();
        assert!(stamped.timestamp.is_some());

        let loaded = configs.load().unwrap();
        assert_eq!(loaded, stamped);
        assert_eq!(loaded.blade_color, BladeColor::Green);
    }

    #[test]
    fn unreadable_payloads_count_as_absent() {
        let mut store = MemoryStore::new();
        for raw in ["{not json", "[1,2,3]", "\"blue\"", "42"] {
            store.set(STORAGE_KEY, raw).unwrap();
            let configs = ConfigStore::new(store.clone());
            assert!(configs.load().is_none(), "{raw}");
            assert_eq!(configs.load_or_default(), SaberConfiguration::create_default());
        }

        store.set(STORAGE_KEY, r#"{"bladeColor":"purple","gripType":"nope"}"#).unwrap();
        let loaded = ConfigStore::new(store).load().unwrap();
        assert_eq!(loaded.blade_color, BladeColor::Purple);
        assert_eq!(loaded.grip_type, procgen::GripType::Smooth);
    }

    #[test]
    fn clear_reports_whether_anything_was_deleted() {
        let mut configs = ConfigStore::new(MemoryStore::new());
        assert!(!configs.clear().unwrap());
        configs.save(&SaberConfiguration::create_default()).unwrap();
        assert!(configs.clear().unwrap());
        assert!(configs.load().is_none());
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let mut configs = ConfigStore::new(FileStore::new(dir.path().join("saves")));
        let config = SaberConfiguration::create_default().toggle_blade();
        configs.save(&config).unwrap();
        assert!(dir.path().join("saves").join("customSaberConfig.json").exists());

        let reopened = ConfigStore::new(FileStore::new(dir.path().join("saves")));
        assert!(!reopened.load().unwrap().blade_on);

        let mut store = reopened.into_inner();
        assert!(store.remove(STORAGE_KEY).unwrap());
        assert!(!store.remove(STORAGE_KEY).unwrap());
        assert_eq!(store.get(STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        assert!(matches!(store.set("../escape", "x"), Err(StoreError::InvalidKey(_))));
        assert!(matches!(store.get(""), Err(StoreError::InvalidKey(_))));
    }
}
