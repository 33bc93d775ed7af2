//! The migration summary post.
//!
//! After a bulk import, editors need to find every post whose gallery was
//! converted. The summary post lists them, one paragraph per gallery:
//!
//! ```html
//! <div class="mig-supp-wrap">
//!   <p><a href="/wp-admin/post.php?post=12&amp;action=edit">Summer Trip</a> [[modula id="40"]] / 1</p>
//! </div>
//! ```
//!
//! The doubled brackets keep the host from expanding the shortcode when the
//! summary itself is viewed. The position is shown 1-based, matching the
//! generated gallery titles.
//!
//! There is one summary post per site. Its id is kept in an option; if that
//! post is gone or trashed a new one is created.

use crate::config::MigrateConfig;
use crate::settings::OPT_SUMMARY_POST_ID;
use crate::store::{Store, StoreError};
use crate::types::{ConvertedGallery, NewPost, PostId, PostStatus};
use maud::{Markup, PreEscaped, html};

/// Render the summary markup.
///
/// `titles` yields the title of each source post, in `entries` order.
pub fn render_summary(
    config: &MigrateConfig,
    entries: &[ConvertedGallery],
    titles: &[String],
) -> Markup {
    html! {
        div class="mig-supp-wrap" {
            @for (entry, title) in entries.iter().zip(titles) {
                p {
                    a href=(config.edit_link(entry.source_post_id)) { (title) }
                    " [" (PreEscaped(config.gallery_shortcode(entry.gallery.gallery_id))) "]"
                    " / " (entry.position + 1)
                }
            }
        }
    }
}

/// Create or replace the summary post. Returns its id.
pub fn write_summary(
    store: &mut dyn Store,
    config: &MigrateConfig,
    entries: &[ConvertedGallery],
) -> Result<PostId, StoreError> {
    let mut titles = Vec::with_capacity(entries.len());
    for entry in entries {
        let title = store
            .get_post(entry.source_post_id)?
            .map(|p| p.title)
            .unwrap_or_default();
        titles.push(title);
    }

    let post = NewPost {
        post_type: "post".to_string(),
        status: PostStatus::Draft,
        title: config.summary.title.clone(),
        content: render_summary(config, entries, &titles).into_string(),
    };

    let existing = match store.get_option(OPT_SUMMARY_POST_ID)? {
        Some(raw) => match raw.trim().parse::<PostId>() {
            Ok(id) => store
                .post_status(id)?
                .filter(|status| *status != PostStatus::Trash)
                .map(|_| id),
            Err(_) => None,
        },
        None => None,
    };

    let id = match existing {
        Some(id) => {
            store.update_post(id, post)?;
            id
        }
        None => store.insert_post(post)?,
    };
    store.set_option(OPT_SUMMARY_POST_ID, &id.to_string())?;
    Ok(id)
}
