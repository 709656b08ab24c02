//! Client configuration and the process-wide configuration slot
//!
//! A [`Configuration`] is built exactly once per `configure` call from the
//! API key plus host identity resolved through the external collaborators,
//! and is immutable afterwards. The [`ConfigStore`] holds the active value
//! in a single slot: `configure` replaces it wholesale (last write wins, no
//! field merging), every other operation takes an `Arc` snapshot and keeps
//! that snapshot for the whole flight of its network call, so a concurrent
//! re-configure can never tear an in-flight payload.

use std::sync::{Arc, RwLock};

/// Active client configuration, immutable once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// Opaque API credential attached to every request
    pub api_key: String,
    /// Host application bundle identifier
    pub bundle_id: String,
    /// Host application version string
    pub version: String,
    /// Host application build string
    pub build: String,
    /// Stable per-installation identifier
    pub device_uuid: String,
}

/// Single mutable slot holding the active [`Configuration`]
#[derive(Default)]
pub struct ConfigStore {
    slot: RwLock<Option<Arc<Configuration>>>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current configuration. Last write wins.
    pub fn set(&self, config: Configuration) {
        let mut slot = self.slot.write().unwrap_or_else(|p| p.into_inner());
        *slot = Some(Arc::new(config));
    }

    /// Atomic snapshot of the current configuration, if any
    pub fn get(&self) -> Option<Arc<Configuration>> {
        self.slot
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub fn is_configured(&self) -> bool {
        self.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(api_key: &str) -> Configuration {
        Configuration {
            api_key: api_key.to_string(),
            bundle_id: "com.example.demo".to_string(),
            version: "1.2.0".to_string(),
            build: "42".to_string(),
            device_uuid: "device-0001".to_string(),
        }
    }

    #[test]
    fn test_store_starts_empty() {
        let store = ConfigStore::new();
        assert!(store.get().is_none());
        assert!(!store.is_configured());
    }

    #[test]
    fn test_last_write_wins() {
        let store = ConfigStore::new();
        store.set(make_config("key1"));
        store.set(Configuration {
            bundle_id: "com.example.other".to_string(),
            ..make_config("key2")
        });

        let current = store.get().unwrap();
        assert_eq!(current.api_key, "key2");
        assert_eq!(current.bundle_id, "com.example.other");
        // No field bleed from the first write
        assert_eq!(current.version, "1.2.0");
    }

    #[test]
    fn test_snapshot_outlives_replacement() {
        let store = ConfigStore::new();
        store.set(make_config("key1"));

        let snapshot = store.get().unwrap();
        store.set(make_config("key2"));

        // An in-flight holder keeps the value it captured
        assert_eq!(snapshot.api_key, "key1");
        assert_eq!(store.get().unwrap().api_key, "key2");
    }
}
