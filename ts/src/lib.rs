//! TemplateStore - layered catalog of editor templates
//!
//! Combines templates bundled with the application with user-defined or
//! user-overridden templates kept in a local configuration file. Built-in
//! templates are validated against the contexts they apply to; user templates
//! take precedence by id and are persisted on an explicit save.
//!
//! # Architecture
//!
//! ```text
//! DefinitionSource ──raw records──▶ merger ──built-in layer──┐
//!        ▲                            ▲                     ▼
//!   ResourceBundle             ContextRegistry        TemplateCatalog
//!                                                           ▲ │
//!                                    OverrideStore ◀─blob───┘ │
//!                                    (settings slot + file) ──┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use templatestore::{DefinitionSource, MemorySettings, OverrideStore, TemplateCatalog};
//!
//! let store = OverrideStore::open("templates.yml", Arc::new(MemorySettings::new()));
//! let mut catalog = TemplateCatalog::new(DefinitionSource::embedded(), None, store);
//! catalog.initialize()?;
//! for template in catalog.list_by_context("sql") {
//!     println!("{}", template.name);
//! }
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod context;
pub mod definitions;
pub mod embedded;
pub mod error;
pub mod merger;
pub mod record;
pub mod settings;
pub mod store;

pub use catalog::TemplateCatalog;
pub use context::{BodyValidator, ContextRegistry, ContextType, StaticContextRegistry};
pub use definitions::{DefinitionSource, DirectoryBundle, EmbeddedBundle, ResourceBundle};
pub use error::{TemplateError, TemplateResult, ValidationError};
pub use record::TemplateRecord;
pub use settings::{MemorySettings, PREF_STORE_KEY, SettingsStore};
pub use store::OverrideStore;
