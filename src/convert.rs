//! Render-time conversion of WP galleries.
//!
//! [`GalleryConverter`] is registered as a [`ShortcodeFilter`]. When a page
//! renders a `[gallery]` shortcode, it decides whether to convert, finds or
//! creates the matching Modula gallery, and replaces the output with the
//! Modula rendering wrapped in `<div class="gallery-migrate-wrap">`.
//!
//! ## Decision
//!
//! | `mod` attribute | auto-convert off | auto-convert on |
//! |-----------------|------------------|-----------------|
//! | affirmative (`yes`, `ja`, `1`, `true`, `y`, `j`) | convert | convert |
//! | negative (`no`, `nein`, `0`, `false`, `n`) | keep | keep |
//! | absent or anything else | keep | convert |
//!
//! ## Position
//!
//! The filter only sees the shortcode's attributes, not where it sits in the
//! post. The position is recovered by scanning the post body for the first
//! gallery whose normalized id list equals this one. Two galleries in one
//! post with the same ids therefore share the first one's Modula gallery.
//!
//! An existing gallery is reused while its stored images still match the
//! shortcode's ids. When the ids were edited since the gallery was written,
//! the gallery is rewritten in place (images, settings and provenance).
//! Ids that no longer resolve to an attachment do not count as an edit.
//!
//! Failures never break the page: they are logged and the original output
//! is returned.

use crate::config::MigrateConfig;
use crate::error::MigrateError;
use crate::identity::GalleryIndex;
use crate::render::{RenderContext, ShortcodeFilter};
use crate::settings::Settings;
use crate::shortcode::{Attributes, OVERRIDE_ATTRIBUTE, Override, normalize_ids, scan_shortcodes, split_ids};
use crate::store::{Store, StoreError};
use crate::translate::translate_ids;
use crate::types::{GalleryImage, GalleryRef, Post, PostId};
use crate::writer::{GalleryWriter, SettingsSource};
use maud::{PreEscaped, html};
use tracing::{debug, warn};

/// Position of the first gallery span in `post` whose ids match `ids`.
pub fn locate_position(post: &Post, token: &str, ids: &str) -> Option<usize> {
    let wanted = normalize_ids(ids);
    scan_shortcodes(&post.content, token)
        .into_iter()
        .find(|span| span.ids().map(normalize_ids).as_deref() == Some(wanted.as_str()))
        .map(|span| span.position)
}

/// Find or create the Modula gallery for the shortcode of `post` with `ids`.
pub fn convert_one(
    store: &mut dyn Store,
    config: &MigrateConfig,
    post: &Post,
    ids: &str,
    settings: SettingsSource,
) -> Result<GalleryRef, MigrateError> {
    let position = locate_position(post, &config.source.token, ids).ok_or_else(|| {
        MigrateError::NotFound(format!(
            "No gallery with ids \"{ids}\" in post {}.",
            post.id
        ))
    })?;

    let ids = split_ids(ids);
    let existing = GalleryIndex::new(&*store, config).resolve(post.id, position)?;
    let stored = match existing {
        Some(gallery_id) => {
            let stored = stored_image_ids(&*store, config, gallery_id)?;
            if same_ids(&stored, &ids) {
                debug!(post_id = post.id, position, gallery_id, "reusing Modula gallery");
                return Ok(GalleryRef { gallery_id });
            }
            Some((gallery_id, stored))
        }
        None => None,
    };

    if ids.is_empty() {
        return Err(MigrateError::Validation(
            "Gallery shortcode has no image ids.".to_string(),
        ));
    }
    let images = translate_ids(&*store, &ids, &config.image_defaults, &config.source)?;
    if let Some((gallery_id, stored)) = stored {
        let translated: Vec<PostId> = images.iter().map(|image| image.id).collect();
        if translated == stored {
            debug!(post_id = post.id, position, gallery_id, "reusing Modula gallery");
            return Ok(GalleryRef { gallery_id });
        }
        debug!(post_id = post.id, position, gallery_id, "gallery ids changed, rewriting");
    }
    GalleryWriter::new(store, config).upsert(&images, settings, post.id, position)
}

/// Image ids stored on a gallery, in order. An unreadable list reads as empty.
fn stored_image_ids(
    store: &dyn Store,
    config: &MigrateConfig,
    gallery_id: PostId,
) -> Result<Vec<PostId>, StoreError> {
    let Some(value) = store.get_meta(gallery_id, &config.target.images_key)? else {
        return Ok(Vec::new());
    };
    let images: Vec<GalleryImage> = serde_json::from_value(value).unwrap_or_else(|e| {
        warn!(gallery_id, error = %e, "unreadable Modula image list");
        Vec::new()
    });
    Ok(images.iter().map(|image| image.id).collect())
}

fn same_ids(stored: &[PostId], ids: &[String]) -> bool {
    stored.len() == ids.len()
        && stored
            .iter()
            .zip(ids)
            .all(|(stored, id)| id.parse::<PostId>().is_ok_and(|id| id == *stored))
}

/// Replaces WP gallery output with the converted Modula gallery.
#[derive(Debug, Default, Clone, Copy)]
pub struct GalleryConverter;

impl GalleryConverter {
    fn convert(
        &self,
        attrs: &Attributes,
        context: &mut RenderContext<'_>,
    ) -> Result<Option<String>, MigrateError> {
        let settings = Settings::load(&*context.store)?;
        let decision = Override::parse(attrs.get(OVERRIDE_ATTRIBUTE).map(String::as_str));
        if !decision.should_convert(settings.auto_convert) {
            debug!(post_id = context.post.id, ?decision, "leaving gallery unconverted");
            return Ok(None);
        }
        let Some(ids) = attrs.get("ids") else {
            debug!(post_id = context.post.id, "gallery without ids, nothing to convert");
            return Ok(None);
        };

        let gallery = convert_one(
            &mut *context.store,
            context.config,
            context.post,
            ids,
            SettingsSource::from_flag(settings.use_template),
        )?;
        let config = context.config;
        let wrapped = html! {
            div class=(config.render.wrapper_class) {
                p class="clear" {}
                (PreEscaped(config.gallery_shortcode(gallery.gallery_id)))
            }
        };
        Ok(Some(context.do_shortcode(&wrapped.into_string())?))
    }
}

impl ShortcodeFilter for GalleryConverter {
    fn filter(
        &self,
        output: String,
        tag: &str,
        attrs: &Attributes,
        context: &mut RenderContext<'_>,
    ) -> String {
        if tag != context.config.source.tag {
            return output;
        }
        match self.convert(attrs, context) {
            Ok(Some(converted)) => converted,
            Ok(None) => output,
            Err(e) => {
                warn!(post_id = context.post.id, error = %e, "gallery conversion failed, keeping original");
                output
            }
        }
    }
}
