//! Bulk import: every WP gallery in the site becomes a Modula gallery.
//!
//! ```text
//! posts containing the token (minus excluded types)
//!   → load each post on its own
//!   → scan shortcodes → read ids → translate attachments → upsert gallery
//!   → rewrite the summary post
//! ```
//!
//! Posts are loaded one at a time rather than all at once; on large sites
//! the number of posts, not the run time, is what limits an import.
//!
//! ## Failure semantics
//!
//! The first fatal error stops the run and is returned. Galleries written
//! before it stay written and the summary post is not updated. Running the
//! import again is safe: every shortcode maps to the same gallery through its
//! provenance, so galleries are updated rather than duplicated.
//!
//! Shortcodes without ids (or with an empty id list) keep their position but
//! produce no gallery. A run that converts nothing leaves the summary post
//! as it was.

use crate::config::MigrateConfig;
use crate::error::MigrateError;
use crate::settings::Settings;
use crate::shortcode::{scan_shortcodes, split_ids};
use crate::store::Store;
use crate::summary::write_summary;
use crate::translate::translate_ids;
use crate::types::{ConvertedGallery, Post, PostId, SourceGalleryRef};
use crate::writer::{GalleryWriter, SettingsSource, WriteOutcome};
use serde::Serialize;
use tracing::{debug, info, warn};

pub const NO_GALLERIES_MESSAGE: &str = "No WP Galleries found.";

/// Result of a successful bulk import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    /// Posts that contained the token.
    pub posts_scanned: usize,
    /// Shortcodes with a non-empty id list.
    pub galleries_found: usize,
    /// Shortcodes skipped for lack of ids.
    pub skipped: usize,
    pub created: usize,
    pub updated: usize,
    pub galleries: Vec<ConvertedGallery>,
    /// The summary post written by this run. `None` when nothing was
    /// converted and the previous summary was left alone.
    pub summary_post_id: Option<PostId>,
}

impl ImportSummary {
    pub fn message(&self) -> String {
        format!(
            "{} WP Galleries found. {} Modula Galleries created / updated.",
            self.galleries_found,
            self.galleries.len()
        )
    }
}

/// Every shortcode span of a post as a gallery reference. Spans without an
/// `ids` attribute are kept with an empty id list.
pub fn gallery_refs(post: &Post, token: &str) -> Vec<SourceGalleryRef> {
    scan_shortcodes(&post.content, token)
        .into_iter()
        .map(|span| SourceGalleryRef {
            source_post_id: post.id,
            position: span.position,
            ids: span.ids().unwrap_or_default().to_string(),
        })
        .collect()
}

/// Convert every WP gallery in the store.
pub fn run_bulk_import(
    store: &mut dyn Store,
    config: &MigrateConfig,
) -> Result<ImportSummary, MigrateError> {
    let settings = Settings::load(&*store)?;
    let settings_source = SettingsSource::from_flag(settings.use_template);

    let post_ids = store.find_posts_containing(&config.source.token, &settings.excluded_types)?;
    if post_ids.is_empty() {
        return Err(MigrateError::NotFound(NO_GALLERIES_MESSAGE.to_string()));
    }
    debug!(posts = post_ids.len(), excluded = ?settings.excluded_types, "starting bulk import");

    let mut summary = ImportSummary {
        posts_scanned: post_ids.len(),
        galleries_found: 0,
        skipped: 0,
        created: 0,
        updated: 0,
        galleries: Vec::new(),
        summary_post_id: None,
    };

    for post_id in post_ids {
        let Some(post) = store.get_post(post_id)? else {
            warn!(post_id, "post vanished during import");
            continue;
        };
        let refs = gallery_refs(&post, &config.source.token);
        if refs.is_empty() {
            warn!(post_id, title = %post.title, "no complete shortcode in post");
        }

        for gallery_ref in refs {
            let ids = split_ids(&gallery_ref.ids);
            if ids.is_empty() {
                warn!(post_id, position = gallery_ref.position, "shortcode has no image ids");
                summary.skipped += 1;
                continue;
            }
            summary.galleries_found += 1;

            let images = translate_ids(&*store, &ids, &config.image_defaults, &config.source)?;
            let (gallery, outcome) = GalleryWriter::new(&mut *store, config).upsert_with_outcome(
                &images,
                settings_source,
                post_id,
                gallery_ref.position,
            )?;
            match outcome {
                WriteOutcome::Created => summary.created += 1,
                WriteOutcome::Updated => summary.updated += 1,
            }
            summary.galleries.push(ConvertedGallery {
                source_post_id: post_id,
                position: gallery_ref.position,
                gallery,
                image_count: images.len(),
            });
        }
    }

    if summary.galleries.is_empty() {
        debug!(skipped = summary.skipped, "nothing converted, summary post left alone");
    } else {
        summary.summary_post_id = Some(write_summary(store, config, &summary.galleries)?);
    }
    info!(
        found = summary.galleries_found,
        created = summary.created,
        updated = summary.updated,
        "bulk import finished"
    );
    Ok(summary)
}
