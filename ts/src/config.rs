//! Configuration for templatestore

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::context::{ContextType, StaticContextRegistry};
use crate::definitions::{DEFAULT_DEFINITIONS, DefinitionSource, DirectoryBundle};
use crate::store::default_override_path;

/// A context registered with the stock variable-syntax validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File holding the user template blob
    #[serde(rename = "override-file")]
    pub override_file: PathBuf,

    /// Directory with the definitions resources; embedded ones when unset
    #[serde(rename = "bundle-dir")]
    pub bundle_dir: Option<PathBuf>,

    /// Logical name of the definitions resource
    pub definitions: String,

    /// Locale for the localization lookup, e.g. `de_DE`
    pub locale: Option<String>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Known contexts
    pub contexts: Vec<ContextConfig>,
}

fn default_contexts() -> Vec<ContextConfig> {
    vec![
        ContextConfig {
            id: "sql".to_string(),
            name: "SQL".to_string(),
        },
        ContextConfig {
            id: "sql.ddl".to_string(),
            name: "SQL DDL".to_string(),
        },
    ]
}

/// Locale from the usual environment variables
fn env_locale() -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.is_empty() && value != "C" && value != "POSIX")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            override_file: default_override_path(),
            bundle_dir: None,
            definitions: DEFAULT_DEFINITIONS.to_string(),
            locale: None,
            log_level: None,
            contexts: default_contexts(),
        }
    }
}

impl Config {
    /// Load config from file, or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            return Self::load_from_file(config_path)
                .context(format!("Failed to load config from {}", config_path.display()));
        }

        // Try default locations
        let default_paths = [
            Some(PathBuf::from("templatestore.yml")),
            dirs::config_dir().map(|p| p.join("templatestore").join("templatestore.yml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                match Self::load_from_file(path) {
                    Ok(config) => return Ok(config),
                    Err(e) => tracing::warn!("Failed to load config from {}: {}", path.display(), e),
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Config::default())
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        tracing::info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Configured locale, falling back to the environment
    pub fn effective_locale(&self) -> Option<String> {
        self.locale.clone().or_else(env_locale)
    }

    /// Definition source for the configured bundle and locale
    pub fn definition_source(&self) -> DefinitionSource {
        let source = match &self.bundle_dir {
            Some(dir) => DefinitionSource::new(DirectoryBundle::new(dir), self.definitions.clone()),
            None => DefinitionSource::embedded(),
        };
        match self.effective_locale() {
            Some(locale) => source.with_locale(locale),
            None => source,
        }
    }

    /// Registry with every configured context
    pub fn registry(&self) -> StaticContextRegistry {
        let mut registry = StaticContextRegistry::new();
        for context in &self.contexts {
            registry.register(ContextType::new(&context.id, &context.name));
        }
        registry
    }
}
