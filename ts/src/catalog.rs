//! Template catalog
//!
//! Single source of truth for the templates that exist right now. Two layers
//! are combined by id:
//!
//! 1. Built-in layer: bundled definitions that passed the merger, immutable
//! 2. Override layer: user records read from the override store
//!
//! The override layer always wins. An override record with `deleted: true`
//! (a tombstone) hides the built-in with the same id. Mutations only touch the
//! override layer and are persisted by an explicit `save`.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error, info, warn};

use crate::context::ContextRegistry;
use crate::definitions::DefinitionSource;
use crate::error::{TemplateError, TemplateResult};
use crate::merger::{merge, validate_record};
use crate::record::{TemplateRecord, parse_document, write_document};
use crate::store::OverrideStore;

/// Insert a record, replacing one with the same id in place
fn upsert(records: &mut Vec<TemplateRecord>, record: TemplateRecord) {
    match records.iter_mut().find(|r| r.id == record.id) {
        Some(existing) => *existing = record,
        None => records.push(record),
    }
}

#[derive(Debug, Default)]
struct OverrideState {
    records: Vec<TemplateRecord>,
    /// Ids of stored overrides that failed validation on load
    hidden: HashSet<String>,
    dirty: bool,
}

impl OverrideState {
    fn find(&self, id: &str) -> Option<&TemplateRecord> {
        self.records.iter().find(|r| r.id.as_deref() == Some(id))
    }

    fn remove(&mut self, id: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id.as_deref() != Some(id));
        self.hidden.remove(id);
        before != self.records.len()
    }
}

/// In-memory catalog of built-in and user templates
pub struct TemplateCatalog {
    source: DefinitionSource,
    registry: Option<Arc<dyn ContextRegistry>>,
    store: OverrideStore,
    builtins: Vec<TemplateRecord>,
    state: Mutex<OverrideState>,
}

impl TemplateCatalog {
    /// Create an empty catalog; call `initialize` to load it
    pub fn new(source: DefinitionSource, registry: Option<Arc<dyn ContextRegistry>>, store: OverrideStore) -> Self {
        debug!(has_registry = registry.is_some(), "TemplateCatalog::new: called");
        Self {
            source,
            registry,
            store,
            builtins: Vec::new(),
            state: Mutex::new(OverrideState::default()),
        }
    }

    fn registry(&self) -> Option<&dyn ContextRegistry> {
        self.registry.as_deref()
    }

    fn state(&self) -> MutexGuard<'_, OverrideState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the context registry; takes effect on the next `initialize`
    pub fn set_registry(&mut self, registry: Option<Arc<dyn ContextRegistry>>) {
        debug!(has_registry = registry.is_some(), "TemplateCatalog::set_registry: called");
        self.registry = registry;
    }

    /// Load both layers.
    ///
    /// The override layer is loaded even when the built-in definitions cannot
    /// be read; that failure is returned afterwards so the host can carry on
    /// without built-in templates.
    pub fn initialize(&mut self) -> TemplateResult<()> {
        debug!("TemplateCatalog::initialize: called");
        let builtins = self
            .source
            .read_builtins()
            .map(|raw| merge(raw, self.registry()));

        self.builtins.clear();
        let result = match builtins {
            Ok(records) => {
                for record in records {
                    upsert(&mut self.builtins, record);
                }
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to read built-in templates");
                Err(e)
            }
        };

        let state = self.load_overrides();
        info!(
            builtins = self.builtins.len(),
            overrides = state.records.len(),
            "Template catalog initialized"
        );
        *self.state() = state;
        result
    }

    /// Re-read the override file, then `initialize`
    pub fn reload(&mut self) -> TemplateResult<()> {
        debug!("TemplateCatalog::reload: called");
        self.store.load();
        self.initialize()
    }

    fn load_overrides(&self) -> OverrideState {
        let blob = self.store.get();
        let mut state = OverrideState::default();
        if blob.trim().is_empty() {
            debug!("load_overrides: no user templates stored");
            return state;
        }

        let records = match parse_document("user templates", &blob, None) {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "Failed to parse user templates, ignoring them");
                return state;
            }
        };

        for mut record in records {
            let Some(id) = record.id.clone() else {
                error!(name = %record.name, "No template id specified");
                continue;
            };
            record.is_user_defined = true;
            if !record.is_custom {
                if let Err(e) = validate_record(&record, self.registry()) {
                    warn!(%id, error = %e, "User template is not valid, using defaults");
                    state.hidden.insert(id);
                } else {
                    state.hidden.remove(&id);
                }
            }
            upsert(&mut state.records, record);
        }
        state
    }

    fn is_builtin(&self, id: &str) -> bool {
        self.builtins.iter().any(|r| r.id.as_deref() == Some(id))
    }

    /// Effective record for an id under the given override state
    fn resolve(&self, state: &OverrideState, id: &str) -> Option<TemplateRecord> {
        if let Some(record) = state.find(id) {
            if record.is_custom {
                return None;
            }
            if !state.hidden.contains(id) {
                return Some(record.clone());
            }
        }
        self.builtins.iter().find(|r| r.id.as_deref() == Some(id)).cloned()
    }

    fn assemble(&self, state: &OverrideState) -> Vec<TemplateRecord> {
        let mut out = Vec::with_capacity(self.builtins.len() + state.records.len());
        for builtin in &self.builtins {
            if let Some(record) = self.resolve(state, builtin.id_str()) {
                out.push(record);
            }
        }
        for record in &state.records {
            let id = record.id_str();
            if record.is_custom || state.hidden.contains(id) || self.is_builtin(id) {
                continue;
            }
            out.push(record.clone());
        }
        out
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Effective record for an id, enabled or not
    pub fn get(&self, id: &str) -> Option<TemplateRecord> {
        let state = self.state();
        self.resolve(&state, id)
    }

    /// Enabled templates: built-ins in source order, then user additions
    pub fn list(&self) -> Vec<TemplateRecord> {
        self.list_all().into_iter().filter(|r| r.enabled).collect()
    }

    /// Every effective template, disabled ones included
    pub fn list_all(&self) -> Vec<TemplateRecord> {
        let state = self.state();
        self.assemble(&state)
    }

    /// Enabled templates for one context
    pub fn list_by_context(&self, context_id: &str) -> Vec<TemplateRecord> {
        self.list()
            .into_iter()
            .filter(|r| r.context_id.as_deref() == Some(context_id))
            .collect()
    }

    /// First enabled template with the given name
    pub fn find_by_name(&self, name: &str) -> Option<TemplateRecord> {
        self.list().into_iter().find(|r| r.name == name)
    }

    /// The validated built-in layer
    pub fn builtins(&self) -> &[TemplateRecord] {
        &self.builtins
    }

    /// The override layer as stored, tombstones included
    pub fn overrides(&self) -> Vec<TemplateRecord> {
        self.state().records.clone()
    }

    /// Whether there are mutations not yet saved
    pub fn is_dirty(&self) -> bool {
        self.state().dirty
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    fn checked_id(&self, record: &TemplateRecord) -> TemplateResult<String> {
        let id = record.id.clone().ok_or(TemplateError::MissingId)?;
        validate_record(record, self.registry())?;
        Ok(id)
    }

    /// Add a new user template
    pub fn add(&self, mut record: TemplateRecord) -> TemplateResult<()> {
        debug!(id = ?record.id, "TemplateCatalog::add: called");
        let id = self.checked_id(&record)?;
        let mut state = self.state();
        if self.resolve(&state, &id).is_some() {
            return Err(TemplateError::Duplicate(id));
        }

        record.is_custom = false;
        record.is_user_defined = true;
        state.hidden.remove(&id);
        upsert(&mut state.records, record);
        state.dirty = true;
        info!(%id, "Added template");
        Ok(())
    }

    /// Replace an existing template; built-ins are overridden, not modified
    pub fn update(&self, mut record: TemplateRecord) -> TemplateResult<()> {
        debug!(id = ?record.id, "TemplateCatalog::update: called");
        let id = self.checked_id(&record)?;
        let mut state = self.state();
        if self.resolve(&state, &id).is_none() {
            return Err(TemplateError::NotFound(id));
        }

        record.is_custom = false;
        record.is_user_defined = true;
        state.hidden.remove(&id);
        upsert(&mut state.records, record);
        state.dirty = true;
        info!(%id, "Updated template");
        Ok(())
    }

    /// Delete a template: user additions are dropped, built-ins get a tombstone
    pub fn remove(&self, id: &str) -> TemplateResult<()> {
        debug!(%id, "TemplateCatalog::remove: called");
        let mut state = self.state();
        let Some(current) = self.resolve(&state, id) else {
            return Err(TemplateError::NotFound(id.to_string()));
        };

        if self.is_builtin(id) {
            state.hidden.remove(id);
            upsert(&mut state.records, TemplateRecord::tombstone(id, current.name));
        } else {
            state.remove(id);
        }
        state.dirty = true;
        info!(%id, "Removed template");
        Ok(())
    }

    /// Enable or disable a template, overriding a built-in if needed
    pub fn set_enabled(&self, id: &str, enabled: bool) -> TemplateResult<()> {
        debug!(%id, %enabled, "TemplateCatalog::set_enabled: called");
        let mut state = self.state();
        let Some(mut record) = self.resolve(&state, id) else {
            return Err(TemplateError::NotFound(id.to_string()));
        };
        if record.enabled == enabled {
            return Ok(());
        }

        record.enabled = enabled;
        record.is_user_defined = true;
        state.hidden.remove(id);
        upsert(&mut state.records, record);
        state.dirty = true;
        Ok(())
    }

    /// Drop the override for an id; returns whether there was one
    pub fn revert(&self, id: &str) -> bool {
        debug!(%id, "TemplateCatalog::revert: called");
        let mut state = self.state();
        let removed = state.remove(id);
        state.dirty |= removed;
        removed
    }

    /// Drop every tombstone; returns how many built-ins came back
    pub fn restore_deleted(&self) -> usize {
        debug!("TemplateCatalog::restore_deleted: called");
        let mut state = self.state();
        let before = state.records.len();
        state.records.retain(|r| !r.is_custom);
        let restored = before - state.records.len();
        state.dirty |= restored > 0;
        restored
    }

    /// Drop the whole override layer
    pub fn restore_defaults(&self) {
        debug!("TemplateCatalog::restore_defaults: called");
        let mut state = self.state();
        state.records.clear();
        state.hidden.clear();
        state.dirty = true;
    }

    /// Serialize the override layer and persist it.
    ///
    /// Write failures are returned; an empty layer removes the backing file.
    pub fn save(&self) -> TemplateResult<()> {
        debug!("TemplateCatalog::save: called");
        let mut state = self.state();
        let blob = if state.records.is_empty() {
            String::new()
        } else {
            write_document(&state.records)?
        };

        self.store.set(blob);
        self.store.save()?;
        state.dirty = false;
        Ok(())
    }

    /// Serialized override layer as it would be saved
    pub fn export(&self) -> TemplateResult<String> {
        let state = self.state();
        if state.records.is_empty() {
            return Ok(String::new());
        }
        write_document(&state.records)
    }
}
