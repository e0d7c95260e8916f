//! Context registry: which contexts exist and how template bodies are
//! checked for each of them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::ValidationError;

/// Capability supplied by the host to gate templates by context
pub trait ContextRegistry: Send + Sync {
    /// Whether a context with this id is registered
    fn exists(&self, context_id: &str) -> bool;

    /// Check a template body against the context's rules
    fn validate(&self, context_id: &str, body: &str) -> Result<(), ValidationError>;
}

/// Body validation rule attached to a context
pub enum BodyValidator {
    /// Accept every body
    AcceptAll,
    /// Check `${name}` variable references
    VariableSyntax,
    /// Host supplied check
    Custom(Box<dyn Fn(&str) -> Result<(), ValidationError> + Send + Sync>),
}

impl fmt::Debug for BodyValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AcceptAll => write!(f, "AcceptAll"),
            Self::VariableSyntax => write!(f, "VariableSyntax"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl BodyValidator {
    pub fn validate(&self, body: &str) -> Result<(), ValidationError> {
        match self {
            Self::AcceptAll => Ok(()),
            Self::VariableSyntax => check_variables(body),
            Self::Custom(check) => check(body),
        }
    }
}

static VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\$|\$\{([^}]*)(\})?").expect("variable pattern is valid"));
static VARIABLE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.]+$").expect("variable name pattern is valid"));

/// Validate `${name}` references; `$$` is an escaped dollar sign
pub fn check_variables(body: &str) -> Result<(), ValidationError> {
    for caps in VARIABLE.captures_iter(body) {
        let Some(name) = caps.get(1) else {
            continue;
        };
        let pos = caps.get(0).map_or(0, |m| m.start());
        if caps.get(2).is_none() {
            return Err(ValidationError::new(format!(
                "unterminated variable reference at offset {}",
                pos
            )));
        }
        // `${type:arg}` style arguments are allowed after the name
        let ident = name.as_str().split(':').next().unwrap_or("").trim();
        if ident.is_empty() {
            return Err(ValidationError::new(format!("empty variable name at offset {}", pos)));
        }
        if !VARIABLE_NAME.is_match(ident) {
            return Err(ValidationError::new(format!("invalid variable name '{}'", ident)));
        }
    }
    Ok(())
}

/// A registered context
#[derive(Debug)]
pub struct ContextType {
    pub id: String,
    pub name: String,
    pub validator: BodyValidator,
}

impl ContextType {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            validator: BodyValidator::VariableSyntax,
        }
    }

    pub fn with_validator(mut self, validator: BodyValidator) -> Self {
        self.validator = validator;
        self
    }
}

/// Registry backed by a fixed set of context types
#[derive(Debug, Default)]
pub struct StaticContextRegistry {
    contexts: BTreeMap<String, ContextType>,
}

impl StaticContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a context, replacing any previous one with the same id
    pub fn register(&mut self, context: ContextType) {
        debug!(id = %context.id, "StaticContextRegistry::register: called");
        self.contexts.insert(context.id.clone(), context);
    }

    pub fn with_context(mut self, context: ContextType) -> Self {
        self.register(context);
        self
    }

    /// Remove a context; templates bound to it drop out on the next load
    pub fn unregister(&mut self, context_id: &str) -> Option<ContextType> {
        debug!(%context_id, "StaticContextRegistry::unregister: called");
        self.contexts.remove(context_id)
    }

    pub fn get(&self, context_id: &str) -> Option<&ContextType> {
        self.contexts.get(context_id)
    }

    pub fn contexts(&self) -> impl Iterator<Item = &ContextType> {
        self.contexts.values()
    }
}

impl ContextRegistry for StaticContextRegistry {
    fn exists(&self, context_id: &str) -> bool {
        self.contexts.contains_key(context_id)
    }

    fn validate(&self, context_id: &str, body: &str) -> Result<(), ValidationError> {
        match self.contexts.get(context_id) {
            Some(context) => context.validator.validate(body),
            None => Err(ValidationError::new(format!("unknown context '{}'", context_id))),
        }
    }
}
