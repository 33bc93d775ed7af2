//! Error taxonomy of the migration.
//!
//! | Variant | Meaning | Handling |
//! |---------|---------|----------|
//! | `NotFound` | nothing to migrate | reported, not fatal to the host |
//! | `Validation` | malformed input (e.g. no usable images) | aborts the current reference |
//! | `Store` | persistence call failed | aborts the current operation |
//! | `Configuration` | template gallery required but absent | aborts, names the template |
//!
//! Bulk import stops at the first of these. Render-time conversion never
//! propagates them; it logs and falls back to the original output.

use crate::store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Fatal error. Missing setting template. Looking for Modula Gallery Post: \"{template}\".")]
    Configuration { template: String },
}

impl MigrateError {
    /// Whether the error only means "nothing to do".
    pub fn is_not_found(&self) -> bool {
        matches!(self, MigrateError::NotFound(_))
    }
}
