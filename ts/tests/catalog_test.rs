//! Integration tests for the template catalog
//!
//! These exercise the full path: definitions on disk, merge, override file,
//! save and re-initialize.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use proptest::prelude::*;
use templatestore::{
    ContextRegistry, ContextType, DefinitionSource, DirectoryBundle, MemorySettings, OverrideStore, PREF_STORE_KEY,
    SettingsStore, StaticContextRegistry, TemplateCatalog, TemplateRecord,
};
use tempfile::TempDir;

// =============================================================================
// Helpers
// =============================================================================

struct Fixture {
    temp: TempDir,
}

impl Fixture {
    fn new(definitions: &str) -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        fs::write(temp.path().join("defs.yml"), definitions).expect("Failed to write definitions");
        Self { temp }
    }

    fn override_path(&self) -> PathBuf {
        self.temp.path().join("config").join("templates.yml")
    }

    fn catalog(&self, registry: Option<StaticContextRegistry>) -> TemplateCatalog {
        self.catalog_with_settings(registry, Arc::new(MemorySettings::new()))
    }

    fn catalog_with_settings(
        &self,
        registry: Option<StaticContextRegistry>,
        settings: Arc<dyn SettingsStore>,
    ) -> TemplateCatalog {
        let store = OverrideStore::open(self.override_path(), settings);
        let registry = registry.map(|r| Arc::new(r) as Arc<dyn ContextRegistry>);
        let mut catalog = TemplateCatalog::new(
            DefinitionSource::new(DirectoryBundle::new(self.temp.path()), "defs"),
            registry,
            store,
        );
        catalog.initialize().expect("Failed to initialize catalog");
        catalog
    }
}

fn sql_registry() -> StaticContextRegistry {
    StaticContextRegistry::new().with_context(ContextType::new("sql", "SQL"))
}

fn ids(records: &[TemplateRecord]) -> Vec<String> {
    records.iter().map(|r| r.id_str().to_string()).collect()
}

const T1: &str = r#"
templates:
  - id: t1
    name: select-all
    context: sql
    body: "SELECT * FROM ${table}"
"#;

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_registry_gates_builtins_across_reloads() {
    let fixture = Fixture::new(T1);

    let mut catalog = fixture.catalog(Some(sql_registry()));
    assert_eq!(ids(&catalog.list()), vec!["t1"]);

    let mut registry = sql_registry();
    registry.unregister("sql");
    catalog.set_registry(Some(Arc::new(registry)));
    catalog.reload().unwrap();
    assert!(catalog.list().is_empty());
}

#[test]
fn test_invalid_builtin_body_is_absent() {
    let fixture = Fixture::new(
        r#"
templates:
  - id: bad
    name: broken
    context: sql
    body: "SELECT ${table"
  - id: good
    name: fine
    context: sql
    body: "SELECT 1"
"#,
    );
    let catalog = fixture.catalog(Some(sql_registry()));
    assert_eq!(ids(&catalog.list()), vec!["good"]);
    assert!(catalog.get("bad").is_none());
}

#[test]
fn test_deletion_marker_then_override_returns_override() {
    let fixture = Fixture::new(
        r#"
templates:
  - id: x
    name: marker
    deleted: true
  - id: x
    name: builtin
    context: sql
    body: "SELECT 1"
"#,
    );
    fs::create_dir_all(fixture.override_path().parent().unwrap()).unwrap();
    fs::write(
        fixture.override_path(),
        "templates:\n  - id: x\n    name: mine\n    context: sql\n    body: SELECT 2\n    user-defined: true\n",
    )
    .unwrap();

    let catalog = fixture.catalog(Some(sql_registry()));
    let record = catalog.get("x").unwrap();
    assert_eq!(record.name, "mine");
    assert!(record.is_user_defined);
    assert_eq!(catalog.builtins().len(), 1);
    assert_eq!(catalog.builtins()[0].name, "builtin");
}

#[test]
fn test_additive_override_removed_deletes_file() {
    let fixture = Fixture::new(T1);
    fs::create_dir_all(fixture.override_path().parent().unwrap()).unwrap();
    fs::write(
        fixture.override_path(),
        "templates:\n  - id: u1\n    name: mine\n    context: sql\n    body: SELECT 2\n    user-defined: true\n",
    )
    .unwrap();

    let catalog = fixture.catalog(Some(sql_registry()));
    assert_eq!(ids(&catalog.list()), vec!["t1", "u1"]);

    catalog.remove("u1").unwrap();
    catalog.save().unwrap();
    assert!(!fixture.override_path().exists());

    let reopened = fixture.catalog(Some(sql_registry()));
    assert_eq!(ids(&reopened.list()), vec!["t1"]);
}

#[test]
fn test_round_trip_after_mutations() {
    let fixture = Fixture::new(T1);
    let catalog = fixture.catalog(Some(sql_registry()));
    catalog
        .add(TemplateRecord::new("u1", "first", "sql", "SELECT ${a}").with_description("desc"))
        .unwrap();
    catalog
        .add(TemplateRecord::new("u2", "second", "sql", "SELECT 2"))
        .unwrap();
    catalog
        .update(TemplateRecord::new("t1", "select-all", "sql", "SELECT id FROM ${table}"))
        .unwrap();
    catalog.remove("u2").unwrap();
    catalog.set_enabled("u1", false).unwrap();
    let before = catalog.overrides();
    catalog.save().unwrap();

    let reopened = fixture.catalog(Some(sql_registry()));
    assert_eq!(reopened.overrides(), before);
    assert_eq!(reopened.get("t1").unwrap().body, "SELECT id FROM ${table}");
    assert!(!reopened.get("u1").unwrap().enabled);
}

#[test]
fn test_round_trip_of_tombstone() {
    let fixture = Fixture::new(T1);
    let catalog = fixture.catalog(Some(sql_registry()));
    catalog.remove("t1").unwrap();
    catalog.save().unwrap();
    assert!(fixture.override_path().exists());

    let reopened = fixture.catalog(Some(sql_registry()));
    assert!(reopened.list().is_empty());
    assert_eq!(reopened.overrides(), catalog.overrides());
}

#[test]
fn test_empty_override_layer_leaves_no_file() {
    let fixture = Fixture::new(T1);
    let catalog = fixture.catalog(Some(sql_registry()));
    catalog.save().unwrap();
    assert!(!fixture.override_path().exists());

    let reopened = fixture.catalog(Some(sql_registry()));
    assert!(reopened.overrides().is_empty());
}

#[test]
fn test_save_is_idempotent() {
    let fixture = Fixture::new(T1);
    let catalog = fixture.catalog(Some(sql_registry()));
    catalog
        .add(TemplateRecord::new("u1", "mine", "sql", "SELECT 1"))
        .unwrap();

    catalog.save().unwrap();
    let first = fs::read_to_string(fixture.override_path()).unwrap();
    catalog.save().unwrap();
    let second = fs::read_to_string(fixture.override_path()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_settings_slot_mirrors_file() {
    let fixture = Fixture::new(T1);
    let settings = Arc::new(MemorySettings::new());
    let catalog = fixture.catalog_with_settings(Some(sql_registry()), settings.clone());
    catalog
        .add(TemplateRecord::new("u1", "mine", "sql", "SELECT 1"))
        .unwrap();
    catalog.save().unwrap();

    let on_disk = fs::read_to_string(fixture.override_path()).unwrap();
    assert_eq!(settings.get(PREF_STORE_KEY), Some(on_disk));
}

#[test]
fn test_catalog_is_shareable_across_threads() {
    let fixture = Fixture::new(T1);
    let catalog = Arc::new(fixture.catalog(Some(sql_registry())));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let catalog = Arc::clone(&catalog);
            std::thread::spawn(move || {
                catalog
                    .add(TemplateRecord::new(format!("u{}", i), "mine", "sql", "SELECT 1"))
                    .unwrap();
                catalog.save().unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let reopened = fixture.catalog(Some(sql_registry()));
    assert_eq!(reopened.overrides().len(), 8);
}

#[test]
fn test_without_registry_every_context_passes() {
    let fixture = Fixture::new(
        r#"
templates:
  - id: j
    name: java
    context: java
    body: "${unterminated"
  - id: n
    name: no-context
    body: "x"
"#,
    );
    let catalog = fixture.catalog(None);
    // A missing context is never accepted
    assert_eq!(ids(&catalog.list()), vec!["j"]);
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_unknown_contexts_never_reach_catalog(contexts in proptest::collection::vec("[a-z]{1,6}", 1..8)) {
        let mut yaml = String::from("templates:\n");
        for (i, context) in contexts.iter().enumerate() {
            yaml.push_str(&format!("  - id: t{}\n    name: n{}\n    context: {}\n    body: x\n", i, i, context));
        }
        let fixture = Fixture::new(&yaml);
        let catalog = fixture.catalog(Some(sql_registry()));

        for record in catalog.list_all() {
            prop_assert_eq!(record.context_id.as_deref(), Some("sql"));
        }
        let expected = contexts.iter().filter(|c| c.as_str() == "sql").count();
        prop_assert!(catalog.list_all().len() <= expected);
    }
}
