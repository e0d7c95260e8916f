//! Error types for template loading, validation and persistence

use std::path::PathBuf;

use thiserror::Error;

/// Body rejected by a context validator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors from catalog and store operations
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template already exists: {0}")]
    Duplicate(String),

    #[error("No template id specified")]
    MissingId,

    #[error("Unknown context '{context}' for template {template}")]
    UnknownContext { template: String, context: String },

    #[error("Template '{template}' validation failed in context '{context}': {source}")]
    Validation {
        template: String,
        context: String,
        #[source]
        source: ValidationError,
    },

    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("Failed to parse {resource}: {message}")]
    Parse { resource: String, message: String },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;
