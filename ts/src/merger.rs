//! Template merger
//!
//! Filters raw built-in records down to the canonical built-in layer.
//! Rejections are logged and skipped, never fatal: one bad contributed
//! template must not keep the rest of the catalog from loading.
//!
//! Deletion markers found in the built-in stream are reported only. Hiding a
//! built-in is the override layer's job, arbitrated by the catalog.

use tracing::{debug, error, info};

use crate::context::ContextRegistry;
use crate::error::{TemplateError, TemplateResult};
use crate::record::TemplateRecord;

/// Whether the record's context is set and, with a registry, registered
pub fn context_exists(record: &TemplateRecord, registry: Option<&dyn ContextRegistry>) -> bool {
    match (record.context_id.as_deref(), registry) {
        (None, _) => false,
        (Some(_), None) => true,
        (Some(context_id), Some(registry)) => registry.exists(context_id),
    }
}

/// Check a record's context and body.
///
/// Without a registry every record with a context passes.
pub fn validate_record(record: &TemplateRecord, registry: Option<&dyn ContextRegistry>) -> TemplateResult<()> {
    if !context_exists(record, registry) {
        return Err(TemplateError::UnknownContext {
            template: record.name.clone(),
            context: record.context_str().to_string(),
        });
    }
    if let (Some(registry), Some(context_id)) = (registry, record.context_id.as_deref()) {
        registry
            .validate(context_id, &record.body)
            .map_err(|source| TemplateError::Validation {
                template: record.name.clone(),
                context: context_id.to_string(),
                source,
            })?;
    }
    Ok(())
}

/// Build the built-in layer from raw records, preserving source order
pub fn merge(raw: Vec<TemplateRecord>, registry: Option<&dyn ContextRegistry>) -> Vec<TemplateRecord> {
    debug!(count = raw.len(), has_registry = registry.is_some(), "merge: called");
    let mut merged = Vec::with_capacity(raw.len());

    for record in raw {
        if record.is_custom {
            match record.id.as_deref() {
                None => error!(name = %record.name, "No template id specified"),
                Some(id) => info!(%id, name = %record.name, "Template {} deleted", record.name),
            }
            continue;
        }

        match validate_record(&record, registry) {
            Ok(()) => merged.push(record),
            Err(TemplateError::UnknownContext { template, context }) => {
                debug!(%template, %context, "merge: context not available, skipping");
            }
            Err(e) => {
                error!(name = %record.name, context = %record.context_str(), error = %e, "Template '{}' validation failed", record.name);
            }
        }
    }

    debug!(count = merged.len(), "merge: complete");
    merged
}
