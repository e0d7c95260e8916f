//! Embedded template resources
//!
//! Compiled into the binary from `templates/` at build time.

use tracing::debug;

/// Built-in template definitions
pub const DEFAULT_TEMPLATES: &str = include_str!("../templates/default-templates.yml");

/// Base localization bundle
pub const DEFAULT_TEMPLATES_L10N: &str = include_str!("../templates/default-templates.l10n.yml");

/// German localization bundle
pub const DEFAULT_TEMPLATES_L10N_DE: &str = include_str!("../templates/default-templates.l10n_de.yml");

/// Get an embedded resource by file name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "default-templates.yml" => Some(DEFAULT_TEMPLATES),
        "default-templates.l10n.yml" => Some(DEFAULT_TEMPLATES_L10N),
        "default-templates.l10n_de.yml" => Some(DEFAULT_TEMPLATES_L10N_DE),
        _ => {
            debug!(%name, "get_embedded: no match found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_embedded_definitions() {
        let defs = get_embedded("default-templates.yml").unwrap();
        assert!(defs.contains("sql.select.all"));
        assert!(defs.contains("%select.all.name"));
    }

    #[test]
    fn test_get_embedded_bundles() {
        assert!(get_embedded("default-templates.l10n.yml").unwrap().contains("select.all.name"));
        assert!(get_embedded("default-templates.l10n_de.yml").is_some());
    }

    #[test]
    fn test_get_embedded_unknown() {
        assert!(get_embedded("default-templates.l10n_fr.yml").is_none());
    }
}
