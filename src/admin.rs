//! Admin entry points.
//!
//! Each call returns an [`AdminResponse`], the JSON shape the settings page
//! consumes: `code` is `0` on success and `-1` on failure, `message` is
//! shown to the user verbatim, `payload` carries optional data.
//!
//! ```json
//! {"code": 0, "message": "3 WP Galleries found. 3 Modula Galleries created / updated.", "payload": {"count": 3}}
//! ```

use crate::config::MigrateConfig;
use crate::error::MigrateError;
use crate::import::run_bulk_import;
use crate::settings::{MANAGED_OPTIONS, OPT_EXCLUDED_TYPES, parse_type_list, strip_whitespace};
use crate::store::{Store, StoreError};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};

pub const SETTINGS_SAVED: &str = "Settings have been saved.";
pub const DEFAULTS_RESTORED: &str = "Default settings restored.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminResponse {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl AdminResponse {
    pub fn ok(message: impl Into<String>, payload: Option<serde_json::Value>) -> Self {
        Self {
            code: 0,
            message: message.into(),
            payload,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            code: -1,
            message: message.into(),
            payload: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

impl From<StoreError> for AdminResponse {
    fn from(e: StoreError) -> Self {
        error!(error = %e, "store failure in admin call");
        AdminResponse::err(MigrateError::from(e).to_string())
    }
}

/// Run the bulk import.
pub fn import_all(store: &mut dyn Store, config: &MigrateConfig) -> AdminResponse {
    match run_bulk_import(store, config) {
        Ok(summary) => AdminResponse::ok(
            summary.message(),
            Some(json!({
                "count": summary.galleries.len(),
                "found": summary.galleries_found,
                "created": summary.created,
                "updated": summary.updated,
                "summary_post_id": summary.summary_post_id,
            })),
        ),
        Err(e) if e.is_not_found() => AdminResponse {
            code: -1,
            message: e.to_string(),
            payload: Some(json!({ "count": 0 })),
        },
        Err(e) => {
            error!(error = %e, "bulk import failed");
            AdminResponse::err(e.to_string())
        }
    }
}

/// Save managed options from `name=value` pairs.
///
/// All pairs are checked before any is written. Whitespace is removed from
/// the excluded post types, and each of them must be a registered type.
pub fn save_settings(store: &mut dyn Store, pairs: &[(String, String)]) -> AdminResponse {
    let mut accepted = Vec::with_capacity(pairs.len());
    for (name, value) in pairs {
        if !MANAGED_OPTIONS.iter().any(|(managed, _)| *managed == name.as_str()) {
            return AdminResponse::err(format!("Error. Unknown setting \"{name}\"."));
        }
        if name == OPT_EXCLUDED_TYPES {
            let value = strip_whitespace(value);
            if let Some(unknown) = parse_type_list(&value)
                .into_iter()
                .find(|post_type| !store.post_type_exists(post_type))
            {
                return AdminResponse::err(format!(
                    "Error. Unknown post type \"{unknown}\" to exclude."
                ));
            }
            accepted.push((name.as_str(), value));
        } else {
            accepted.push((name.as_str(), value.trim().to_string()));
        }
    }

    for (name, value) in &accepted {
        if let Err(e) = store.set_option(name, value) {
            return e.into();
        }
    }
    info!(count = accepted.len(), "settings saved");
    AdminResponse::ok(SETTINGS_SAVED, None)
}

/// Reset the managed options to their defaults.
pub fn restore_defaults(store: &mut dyn Store) -> AdminResponse {
    match crate::settings::restore_defaults(store) {
        Ok(restored) => AdminResponse::ok(DEFAULTS_RESTORED, Some(json!(restored))),
        Err(e) => e.into(),
    }
}
