//! Host-wide settings store handle
//!
//! The override blob is mirrored into one named slot of a settings store
//! shared with the rest of the host.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

/// Key of the slot holding the serialized user templates
pub const PREF_STORE_KEY: &str = "templatestore.user_templates";

/// A string key-value settings store
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);
}

/// In-memory settings store
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        debug!(%key, value_len = value.len(), "MemorySettings::set: called");
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        debug!(%key, "MemorySettings::remove: called");
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.remove(key);
    }
}
