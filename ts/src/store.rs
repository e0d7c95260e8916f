//! Override store
//!
//! Persists the serialized user-template layer as a single blob. The blob
//! lives in the settings store under [`PREF_STORE_KEY`] and is mirrored to a
//! configuration file:
//!
//! ```text
//! ~/.config/templatestore/
//! └── templates.yml    # absent when there are no user templates
//! ```
//!
//! Reading is best-effort: a missing or unreadable file leaves the blob empty.
//! Writing surfaces every failure except a failed cleanup of an empty file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{TemplateError, TemplateResult};
use crate::settings::{PREF_STORE_KEY, SettingsStore};

/// File name of the user template blob inside the configuration directory
pub const OVERRIDE_FILE_NAME: &str = "templates.yml";

/// Default location of the user template blob
pub fn default_override_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("templatestore")
        .join(OVERRIDE_FILE_NAME)
}

/// Persistence adapter for the user-template blob
pub struct OverrideStore {
    path: PathBuf,
    settings: Arc<dyn SettingsStore>,
}

impl OverrideStore {
    /// Create the store and load any previously saved blob
    pub fn open(path: impl Into<PathBuf>, settings: Arc<dyn SettingsStore>) -> Self {
        let store = Self {
            path: path.into(),
            settings,
        };
        debug!(path = ?store.path, "OverrideStore::open: called");
        store.load();
        store
    }

    /// Path of the backing configuration file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the configuration file into the settings slot.
    ///
    /// Absence is normal; an unreadable file is logged and treated as empty.
    pub fn load(&self) {
        debug!(path = ?self.path, "OverrideStore::load: called");
        if !self.path.exists() {
            debug!("OverrideStore::load: no configuration file");
            self.settings.remove(PREF_STORE_KEY);
            return;
        }

        match fs::read_to_string(&self.path) {
            Ok(content) => {
                debug!(content_len = content.len(), "OverrideStore::load: read configuration file");
                self.settings.set(PREF_STORE_KEY, content);
            }
            Err(e) => {
                error!(path = ?self.path, error = %e, "Failed to read user templates");
                self.settings.remove(PREF_STORE_KEY);
            }
        }
    }

    /// Current blob, empty when nothing is stored
    pub fn get(&self) -> String {
        self.settings.get(PREF_STORE_KEY).unwrap_or_default()
    }

    /// Replace the blob in memory; nothing is written until `save`
    pub fn set(&self, value: String) {
        debug!(value_len = value.len(), "OverrideStore::set: called");
        self.settings.set(PREF_STORE_KEY, value);
    }

    /// Write the blob to the configuration file, or delete the file when the
    /// blob is empty
    pub fn save(&self) -> TemplateResult<()> {
        let value = self.get();
        debug!(path = ?self.path, value_len = value.len(), "OverrideStore::save: called");

        if value.is_empty() {
            if self.path.exists() {
                match fs::remove_file(&self.path) {
                    Ok(()) => info!(path = ?self.path, "Removed empty user template configuration"),
                    Err(e) => warn!(path = ?self.path, error = %e, "Can't delete empty template configuration"),
                }
            }
            return Ok(());
        }

        self.write_atomic(&value)?;
        info!(path = ?self.path, "Saved user templates");
        Ok(())
    }

    /// Write to a sibling temp file, then rename over the target
    fn write_atomic(&self, value: &str) -> TemplateResult<()> {
        let write_err = |source| TemplateError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let temp_path = self.path.with_extension(format!("{}.tmp", Uuid::now_v7().simple()));
        debug!(?temp_path, "OverrideStore::write_atomic: writing temp file");
        fs::write(&temp_path, value).map_err(write_err)?;

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(write_err(e));
        }
        Ok(())
    }
}
