//! Admin-managed migration settings.
//!
//! Three options steer the migration. They are stored as host options and
//! re-read at the start of every operation, so a value saved in the admin
//! takes effect on the very next import or page render.
//!
//! | Option | Meaning | Default |
//! |--------|---------|---------|
//! | `gallery_migrate_excluded_types` | post types the bulk import skips | `attachment, nav_menu_item, revision` |
//! | `gallery_migrate_use_template` | copy settings from the template gallery | `0` |
//! | `gallery_migrate_convert_on_render` | convert `[gallery]` when pages render | `1` |
//!
//! Flags follow host truthiness: an empty string and `"0"` are off,
//! anything else is on.

use crate::store::{OptionStore, StoreError};
use std::collections::BTreeMap;

pub const OPT_EXCLUDED_TYPES: &str = "gallery_migrate_excluded_types";
pub const OPT_USE_TEMPLATE: &str = "gallery_migrate_use_template";
pub const OPT_CONVERT_ON_RENDER: &str = "gallery_migrate_convert_on_render";
/// Id of the migration summary post. Not user-editable.
pub const OPT_SUMMARY_POST_ID: &str = "gallery_migrate_summary_post_id";

pub const DEFAULT_EXCLUDED_TYPES: &str = "attachment, nav_menu_item, revision";
pub const DEFAULT_USE_TEMPLATE: &str = "0";
pub const DEFAULT_CONVERT_ON_RENDER: &str = "1";

/// The three managed options with their defaults, in display order.
pub const MANAGED_OPTIONS: &[(&str, &str)] = &[
    (OPT_EXCLUDED_TYPES, DEFAULT_EXCLUDED_TYPES),
    (OPT_USE_TEMPLATE, DEFAULT_USE_TEMPLATE),
    (OPT_CONVERT_ON_RENDER, DEFAULT_CONVERT_ON_RENDER),
];

/// A fresh read of the managed options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub excluded_types: Vec<String>,
    pub use_template: bool,
    pub auto_convert: bool,
}

impl Settings {
    /// Read all managed options, applying defaults for absent ones.
    pub fn load<O: OptionStore + ?Sized>(options: &O) -> Result<Self, StoreError> {
        let excluded = read_or_default(options, OPT_EXCLUDED_TYPES, DEFAULT_EXCLUDED_TYPES)?;
        let use_template = read_or_default(options, OPT_USE_TEMPLATE, DEFAULT_USE_TEMPLATE)?;
        let auto_convert =
            read_or_default(options, OPT_CONVERT_ON_RENDER, DEFAULT_CONVERT_ON_RENDER)?;
        Ok(Self {
            excluded_types: parse_type_list(&excluded),
            use_template: is_truthy(&use_template),
            auto_convert: is_truthy(&auto_convert),
        })
    }
}

fn read_or_default<O: OptionStore + ?Sized>(
    options: &O,
    name: &str,
    default: &str,
) -> Result<String, StoreError> {
    Ok(options
        .get_option(name)?
        .unwrap_or_else(|| default.to_string()))
}

/// `"attachment, revision ,"` → `["attachment", "revision"]`.
pub fn parse_type_list(raw: &str) -> Vec<String> {
    strip_whitespace(raw)
        .split(',')
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

pub fn strip_whitespace(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Host option truthiness.
pub fn is_truthy(value: &str) -> bool {
    !(value.is_empty() || value == "0")
}

/// Write the managed defaults and return them.
pub fn restore_defaults<O: OptionStore + ?Sized>(
    options: &mut O,
) -> Result<BTreeMap<String, String>, StoreError> {
    let mut restored = BTreeMap::new();
    for (name, default) in MANAGED_OPTIONS {
        options.set_option(name, default)?;
        restored.insert(name.to_string(), default.to_string());
    }
    Ok(restored)
}

/// Current values of the managed options, defaults filled in.
pub fn current_values<O: OptionStore + ?Sized>(
    options: &O,
) -> Result<Vec<(String, String)>, StoreError> {
    MANAGED_OPTIONS
        .iter()
        .map(|(name, default)| Ok((name.to_string(), read_or_default(options, name, default)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn load_uses_defaults_when_unset() {
        let store = MemoryStore::new();
        let settings = Settings::load(&store).unwrap();
        assert_eq!(
            settings.excluded_types,
            vec!["attachment", "nav_menu_item", "revision"]
        );
        assert!(!settings.use_template);
        assert!(settings.auto_convert);
    }

    #[test]
    fn load_reflects_latest_saved_values() {
        let mut store = MemoryStore::new();
        store.set_option(OPT_CONVERT_ON_RENDER, "0").unwrap();
        assert!(!Settings::load(&store).unwrap().auto_convert);
        store.set_option(OPT_CONVERT_ON_RENDER, "1").unwrap();
        assert!(Settings::load(&store).unwrap().auto_convert);
    }

    #[test]
    fn empty_excluded_list_excludes_nothing() {
        let mut store = MemoryStore::new();
        store.set_option(OPT_EXCLUDED_TYPES, " ").unwrap();
        assert!(Settings::load(&store).unwrap().excluded_types.is_empty());
    }

    #[test]
    fn truthiness_follows_host_rules() {
        assert!(!is_truthy(""));
        assert!(!is_truthy("0"));
        assert!(is_truthy("1"));
        assert!(is_truthy("yes"));
        assert!(is_truthy("00"));
    }

    #[test]
    fn restore_defaults_writes_exactly_three_options() {
        let mut store = MemoryStore::new();
        store.set_option(OPT_USE_TEMPLATE, "1").unwrap();
        store.set_option(OPT_SUMMARY_POST_ID, "77").unwrap();

        let restored = restore_defaults(&mut store).unwrap();
        assert_eq!(restored.len(), 3);
        assert_eq!(restored[OPT_USE_TEMPLATE], "0");
        assert_eq!(store.get_option(OPT_USE_TEMPLATE).unwrap().as_deref(), Some("0"));
        // Unmanaged options are untouched
        assert_eq!(
            store.get_option(OPT_SUMMARY_POST_ID).unwrap().as_deref(),
            Some("77")
        );
    }
}
