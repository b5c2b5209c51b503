//! Destination Naming
//!
//! Pure resolution of archive base names (no extension) from an app snapshot
//! and the user's ordered attribute keys. Unknown keys and attributes the app
//! does not have are skipped; a selection that resolves to nothing falls back
//! to the app's display name so archives are never nameless.

use std::collections::HashSet;

use host_traits::apps::InstalledApp;

/// Attribute keys understood by the resolver.
const ATTR_NAME: &str = "name";
const ATTR_PACKAGE: &str = "package";
const ATTR_VERSION_NAME: &str = "version_name";
const ATTR_VERSION_CODE: &str = "version_code";

/// Resolve the base file name for `app` from ordered attribute keys.
pub fn resolve_name(app: &InstalledApp, attributes: &[String], separator: &str) -> String {
    let mut pieces: Vec<String> = Vec::with_capacity(attributes.len());
    for key in attributes {
        let value = match key.as_str() {
            ATTR_NAME => Some(app.display_name.clone()),
            ATTR_PACKAGE => Some(app.package_name.clone()),
            ATTR_VERSION_NAME => app.version_name.clone(),
            ATTR_VERSION_CODE => Some(app.version_code.to_string()),
            _ => None,
        };
        match value {
            Some(v) if !v.trim().is_empty() => pieces.push(v),
            _ => {}
        }
    }

    let joined = sanitize(&pieces.join(separator));
    if joined.is_empty() {
        sanitize(&app.display_name)
    } else {
        joined
    }
}

/// Disambiguate `desired` against names already present in the destination:
/// the first free of `desired`, `desired (1)`, `desired (2)`, ...
pub fn unique_name(desired: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(desired) {
        return desired.to_string();
    }
    let mut n = 1u32;
    loop {
        let candidate = format!("{desired} ({n})");
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Strip characters that are illegal or troublesome in file names across
/// the supported filesystems, then trim stray whitespace.
fn sanitize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') && !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn app() -> InstalledApp {
        InstalledApp {
            package_name: "com.example.notes".into(),
            display_name: "Notes".into(),
            primary_source: PathBuf::from("/data/app/base.apk"),
            split_sources: vec![],
            version_name: Some("2.1.0".into()),
            version_code: 210,
            icon: None,
            system: false,
            installed_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn joins_attributes_in_order() {
        let attrs: Vec<String> = ["name", "package", "version_name"]
            .map(String::from)
            .to_vec();
        assert_eq!(
            resolve_name(&app(), &attrs, "-"),
            "Notes-com.example.notes-2.1.0"
        );
    }

    #[test]
    fn skips_unknown_and_missing_attributes() {
        let mut a = app();
        a.version_name = None;
        let attrs: Vec<String> = ["name", "color", "version_name", "version_code"]
            .map(String::from)
            .to_vec();
        assert_eq!(resolve_name(&a, &attrs, "_"), "Notes_210");
    }

    #[test]
    fn empty_selection_falls_back_to_display_name() {
        assert_eq!(resolve_name(&app(), &[], "-"), "Notes");
        let attrs = vec!["nonsense".to_string()];
        assert_eq!(resolve_name(&app(), &attrs, "-"), "Notes");
    }

    #[test]
    fn sanitizes_illegal_characters() {
        let mut a = app();
        a.display_name = "No/tes: *draft?*".into();
        assert_eq!(resolve_name(&a, &["name".to_string()], "-"), "Notes draft");
    }

    #[test]
    fn collisions_get_a_counter() {
        let mut taken = HashSet::new();
        assert_eq!(unique_name("Notes", &taken), "Notes");

        taken.insert("Notes".to_string());
        assert_eq!(unique_name("Notes", &taken), "Notes (1)");

        taken.insert("Notes (1)".to_string());
        assert_eq!(unique_name("Notes", &taken), "Notes (2)");
    }
}
