//! Definition source
//!
//! Locates the bundled definitions resource and its optional localization
//! bundle, and reads them into raw template records.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::embedded;
use crate::error::{TemplateError, TemplateResult};
use crate::record::{TemplateRecord, Translations, parse_document};

/// Logical name of the bundled definitions
pub const DEFAULT_DEFINITIONS: &str = "default-templates";

/// Somewhere named resources can be read from
pub trait ResourceBundle: Send + Sync {
    /// Read a resource by file name; `Ok(None)` when it does not exist
    fn open(&self, name: &str) -> TemplateResult<Option<String>>;

    /// Human readable location for log messages
    fn describe(&self) -> String;
}

/// Resources compiled into the binary
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedBundle;

impl ResourceBundle for EmbeddedBundle {
    fn open(&self, name: &str) -> TemplateResult<Option<String>> {
        Ok(embedded::get_embedded(name).map(str::to_string))
    }

    fn describe(&self) -> String {
        "embedded".to_string()
    }
}

/// Resources stored as files in a directory
#[derive(Debug, Clone)]
pub struct DirectoryBundle {
    root: PathBuf,
}

impl DirectoryBundle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceBundle for DirectoryBundle {
    fn open(&self, name: &str) -> TemplateResult<Option<String>> {
        let path = self.root.join(name);
        debug!(?path, "DirectoryBundle::open: called");
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TemplateError::Io(e)),
        }
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Reads built-in template definitions from a resource bundle
pub struct DefinitionSource {
    bundle: Box<dyn ResourceBundle>,
    name: String,
    locale: Option<String>,
}

impl DefinitionSource {
    /// Source for the named definitions in the given bundle
    pub fn new(bundle: impl ResourceBundle + 'static, name: impl Into<String>) -> Self {
        let name = name.into();
        debug!(%name, location = %bundle.describe(), "DefinitionSource::new: called");
        Self {
            bundle: Box::new(bundle),
            name,
            locale: None,
        }
    }

    /// The definitions compiled into the binary
    pub fn embedded() -> Self {
        Self::new(EmbeddedBundle, DEFAULT_DEFINITIONS)
    }

    /// Use a locale such as `de_DE` or `de-DE.UTF-8` for the localization lookup
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    fn definitions_file(&self) -> String {
        format!("{}.yml", self.name)
    }

    /// Localization file names, most specific first
    pub fn localization_candidates(&self) -> Vec<String> {
        let mut candidates = Vec::new();
        if let Some(locale) = self.locale.as_deref() {
            let tag = locale.split('.').next().unwrap_or("").replace('-', "_");
            let parts: Vec<&str> = tag.split('_').filter(|p| !p.is_empty()).collect();
            for len in (1..=parts.len()).rev() {
                candidates.push(format!("{}.l10n_{}.yml", self.name, parts[..len].join("_")));
            }
        }
        candidates.push(format!("{}.l10n.yml", self.name));
        candidates
    }

    /// Load the first localization bundle found; problems only cost translations
    fn read_translations(&self) -> Option<Translations> {
        for candidate in self.localization_candidates() {
            match self.bundle.open(&candidate) {
                Ok(Some(content)) => {
                    return match serde_yaml::from_str::<Translations>(&content) {
                        Ok(translations) => {
                            debug!(%candidate, count = translations.len(), "read_translations: loaded");
                            Some(translations)
                        }
                        Err(e) => {
                            warn!(%candidate, error = %e, "Failed to parse localization bundle");
                            None
                        }
                    };
                }
                Ok(None) => debug!(%candidate, "read_translations: not found"),
                Err(e) => {
                    warn!(%candidate, error = %e, "Failed to read localization bundle");
                    return None;
                }
            }
        }
        debug!(name = %self.name, "read_translations: no bundle, using literal strings");
        None
    }

    /// Read every raw built-in record, in source order
    pub fn read_builtins(&self) -> TemplateResult<Vec<TemplateRecord>> {
        let file = self.definitions_file();
        debug!(%file, "DefinitionSource::read_builtins: called");

        let content = self.bundle.open(&file)?.ok_or_else(|| {
            TemplateError::ResourceUnavailable(format!("{} in {}", file, self.bundle.describe()))
        })?;
        let translations = self.read_translations();
        let records = parse_document(&file, &content, translations.as_ref())?;

        info!(count = records.len(), source = %self.bundle.describe(), "Read built-in template definitions");
        Ok(records)
    }
}
