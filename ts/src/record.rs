//! Template records and the YAML document shape shared by the bundled
//! definitions and the persisted user overrides.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{TemplateError, TemplateResult};

/// A single template as known to the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TemplateRecord {
    /// Stable identifier; absent only on malformed deletion markers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Display name
    pub name: String,

    /// Display description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Activation context the template belongs to
    #[serde(rename = "context", default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,

    /// Raw template text
    #[serde(default)]
    pub body: String,

    /// Offered by the editor when true
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Inserted without confirmation when it is the only proposal
    #[serde(default = "default_true")]
    pub auto_insert: bool,

    /// Deletion marker in the built-in stream, tombstone in the override layer
    #[serde(rename = "deleted", default, skip_serializing_if = "is_false")]
    pub is_custom: bool,

    /// Originates from the override layer
    #[serde(rename = "user-defined", default, skip_serializing_if = "is_false")]
    pub is_user_defined: bool,
}

fn default_true() -> bool {
    true
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl TemplateRecord {
    /// Create an enabled, non-custom record
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        context_id: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            name: name.into(),
            description: String::new(),
            context_id: Some(context_id.into()),
            body: body.into(),
            enabled: true,
            auto_insert: true,
            is_custom: false,
            is_user_defined: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn user_defined(mut self) -> Self {
        self.is_user_defined = true;
        self
    }

    /// A tombstone hiding the built-in with the given id
    pub fn tombstone(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: name.into(),
            description: String::new(),
            context_id: None,
            body: String::new(),
            enabled: false,
            auto_insert: false,
            is_custom: true,
            is_user_defined: true,
        }
    }

    /// The id, or an empty string for id-less records
    pub fn id_str(&self) -> &str {
        self.id.as_deref().unwrap_or("")
    }

    /// Context id, or an empty string when absent
    pub fn context_str(&self) -> &str {
        self.context_id.as_deref().unwrap_or("")
    }
}

/// Entry as it appears in a YAML document, before mandatory-field checks
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawTemplate {
    id: Option<String>,
    name: Option<String>,
    description: Option<String>,
    context: Option<String>,
    body: Option<String>,
    enabled: Option<bool>,
    auto_insert: Option<bool>,
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    user_defined: bool,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    templates: Vec<serde_yaml::Value>,
}

#[derive(Serialize)]
struct Document<'a> {
    templates: &'a [TemplateRecord],
}

/// Key to localized text, used for `%key` values
pub type Translations = HashMap<String, String>;

/// Resolve a `%key` literal through the translations, keeping the literal
/// when there is no bundle or no such key
fn localize(value: String, translations: Option<&Translations>) -> String {
    match (value.strip_prefix('%'), translations) {
        (Some(key), Some(bundle)) => match bundle.get(key) {
            Some(text) => text.clone(),
            None => {
                debug!(%key, "localize: key missing from bundle");
                value
            }
        },
        _ => value,
    }
}

/// Parse a template document into records.
///
/// The document must parse as a whole; individual entries that fail to decode
/// or lack a name are logged and skipped. An entry flagged `deleted`, or one
/// with an id but no body, becomes a deletion marker.
pub fn parse_document(
    resource: &str,
    content: &str,
    translations: Option<&Translations>,
) -> TemplateResult<Vec<TemplateRecord>> {
    debug!(%resource, content_len = content.len(), "parse_document: called");
    if content.trim().is_empty() {
        debug!(%resource, "parse_document: empty document");
        return Ok(Vec::new());
    }

    let doc: RawDocument = serde_yaml::from_str(content).map_err(|e| TemplateError::Parse {
        resource: resource.to_string(),
        message: e.to_string(),
    })?;

    let mut records = Vec::with_capacity(doc.templates.len());
    for (index, value) in doc.templates.into_iter().enumerate() {
        let raw: RawTemplate = match serde_yaml::from_value(value) {
            Ok(raw) => raw,
            Err(e) => {
                error!(%resource, %index, error = %e, "Malformed template entry");
                continue;
            }
        };
        match into_record(raw, translations) {
            Some(record) => records.push(record),
            None => error!(%resource, %index, "Template entry has no name"),
        }
    }

    debug!(%resource, count = records.len(), "parse_document: complete");
    Ok(records)
}

fn into_record(raw: RawTemplate, translations: Option<&Translations>) -> Option<TemplateRecord> {
    let name = localize(raw.name?, translations);
    let is_custom = raw.deleted || (raw.id.is_some() && raw.body.is_none());
    Some(TemplateRecord {
        id: raw.id,
        name,
        description: raw
            .description
            .map(|d| localize(d, translations))
            .unwrap_or_default(),
        context_id: raw.context,
        body: raw.body.unwrap_or_default(),
        enabled: raw.enabled.unwrap_or(true),
        auto_insert: raw.auto_insert.unwrap_or(true),
        is_custom,
        is_user_defined: raw.user_defined,
    })
}

/// Serialize records into the document grammar read by `parse_document`
pub fn write_document(records: &[TemplateRecord]) -> TemplateResult<String> {
    debug!(count = records.len(), "write_document: called");
    serde_yaml::to_string(&Document { templates: records }).map_err(|e| TemplateError::Parse {
        resource: "override layer".to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
templates:
  - id: sql.select
    name: "%select.name"
    description: "%select.description"
    context: sql
    body: "SELECT * FROM ${table}"
  - id: sql.gone
    name: gone
    context: sql
  - name: nameless-marker
    deleted: true
  - id: broken
    context: sql
    body: "x"
  - "not a mapping"
"#;

    #[test]
    fn test_parse_resolves_translations() {
        let mut bundle = Translations::new();
        bundle.insert("select.name".to_string(), "sel".to_string());

        let records = parse_document("test", DOC, Some(&bundle)).unwrap();
        assert_eq!(records[0].name, "sel");
        // Missing key keeps the literal
        assert_eq!(records[0].description, "%select.description");
        assert_eq!(records[0].context_id.as_deref(), Some("sql"));
        assert!(records[0].enabled);
        assert!(!records[0].is_custom);
    }

    #[test]
    fn test_parse_without_bundle_keeps_literals() {
        let records = parse_document("test", DOC, None).unwrap();
        assert_eq!(records[0].name, "%select.name");
    }

    #[test]
    fn test_parse_marks_deletion_markers() {
        let records = parse_document("test", DOC, None).unwrap();
        // nameless entry and non-mapping entry are rejected
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].id.as_deref(), Some("sql.gone"));
        assert!(records[1].is_custom);
        assert!(records[2].id.is_none());
        assert!(records[2].is_custom);
    }

    #[test]
    fn test_parse_rejects_invalid_document() {
        let result = parse_document("test", "templates: [", None);
        assert!(matches!(result, Err(TemplateError::Parse { .. })));
    }

    #[test]
    fn test_parse_empty_document() {
        assert!(parse_document("test", "  \n", None).unwrap().is_empty());
    }

    #[test]
    fn test_write_then_parse_preserves_fields() {
        let records = vec![
            TemplateRecord::new("a", "A", "sql", "")
                .with_description("empty body")
                .with_enabled(false)
                .user_defined(),
            TemplateRecord::tombstone("b", "B"),
        ];

        let text = write_document(&records).unwrap();
        let parsed = parse_document("blob", &text, None).unwrap();
        assert_eq!(parsed, records);
    }
}
