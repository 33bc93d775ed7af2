//! Attachment → Modula image translation.
//!
//! Each WP gallery id names an attachment post. Its fields map onto a Modula
//! image record as follows, starting from [`ImageDefaults`]:
//!
//! | Modula field | Source |
//! |--------------|--------|
//! | `id` | the attachment id |
//! | `title` | attachment title |
//! | `description` | attachment caption (excerpt) |
//! | `alt` | alt-text meta (`_wp_attachment_image_alt`) |
//! | `halign`, `valign`, `link`, `target` | defaults only |
//!
//! A title, caption or alt text that is empty or absent keeps the value from
//! [`ImageDefaults`].
//!
//! The caption rather than the long description fills `description`
//! because the stock Modula settings caption images from that field.
//!
//! ## Missing images
//!
//! An id that is not numeric, does not exist, or is not an attachment is
//! skipped with a warning. Only when a non-empty id list produces no image
//! at all is the gallery rejected, since writing it would silently replace
//! a populated gallery with an empty one.

use crate::config::{ImageDefaults, SourceConfig};
use crate::error::MigrateError;
use crate::store::{Store, StoreError, meta_as_text};
use crate::types::{GalleryImage, PostId};
use tracing::warn;

/// Translate one attachment id. `Ok(None)` means "not an image, skip it".
pub fn translate_image(
    store: &dyn Store,
    id: &str,
    defaults: &ImageDefaults,
    source: &SourceConfig,
) -> Result<Option<GalleryImage>, StoreError> {
    let Ok(id) = id.trim().parse::<PostId>() else {
        return Ok(None);
    };
    let Some(post) = store.get_post(id)? else {
        return Ok(None);
    };
    if post.post_type != source.attachment_type {
        return Ok(None);
    }
    let alt = store
        .get_meta(id, &source.alt_key)?
        .as_ref()
        .and_then(meta_as_text)
        .unwrap_or_default();

    Ok(Some(GalleryImage {
        id,
        title: or_default(post.title, &defaults.title),
        description: or_default(post.excerpt, &defaults.description),
        alt: or_default(alt, &defaults.alt),
        halign: defaults.halign.clone(),
        valign: defaults.valign.clone(),
        link: defaults.link.clone(),
        target: defaults.target.clone(),
    }))
}

/// An empty attachment field keeps the configured default.
fn or_default(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

/// Translate a list of ids, skipping the ones that are not attachments.
///
/// Empty input gives an empty list. Non-empty input that yields nothing is a
/// validation error.
pub fn translate_ids(
    store: &dyn Store,
    ids: &[String],
    defaults: &ImageDefaults,
    source: &SourceConfig,
) -> Result<Vec<GalleryImage>, MigrateError> {
    let mut images = Vec::with_capacity(ids.len());
    for id in ids {
        match translate_image(store, id, defaults, source)? {
            Some(image) => images.push(image),
            None => warn!(id = %id, "skipping gallery entry that is not an attachment"),
        }
    }
    if images.is_empty() && !ids.is_empty() {
        return Err(MigrateError::Validation(format!(
            "None of the gallery images ({}) could be found.",
            ids.join(",")
        )));
    }
    Ok(images)
}
