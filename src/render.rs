//! Shortcode render pipeline.
//!
//! A minimal stand-in for the host CMS's shortcode dispatcher. Content is
//! split into text and shortcodes ([`tokenize`]); each shortcode is rendered
//! by its default handler and the result is then handed through every
//! registered [`ShortcodeFilter`], in registration order. A filter receives
//! the output so far and returns the output to use, which is how the gallery
//! converter swaps a WP gallery for a Modula one at render time.
//!
//! ```text
//! [gallery ids="1,2"]  →  default gallery markup  →  filter 1  →  filter 2  →  page
//! ```
//!
//! Default handlers:
//!
//! | Tag | Output |
//! |-----|--------|
//! | `source.tag` (`gallery`) | one `<figure>` per resolvable attachment |
//! | `target.shortcode_tag` (`modula`) | one `<figure>` per stored gallery image |
//! | anything else | the shortcode text, unchanged |
//!
//! Escaped shortcodes (`[[modula id="3"]]`) print with one bracket pair
//! removed and are never expanded.

use crate::config::MigrateConfig;
use crate::shortcode::{Attributes, Segment, split_ids, tokenize};
use crate::store::{Store, StoreError};
use crate::types::{GalleryImage, Post, PostId};
use maud::{Markup, html};
use tracing::{debug, warn};

/// What a filter can see and touch while a post renders.
pub struct RenderContext<'a> {
    pub store: &'a mut dyn Store,
    pub config: &'a MigrateConfig,
    /// The post being rendered.
    pub post: &'a Post,
}

impl RenderContext<'_> {
    /// Expand shortcodes in `text` with the default handlers only.
    ///
    /// Filters are not applied, so a filter may call this on its own output
    /// without recursing into itself.
    pub fn do_shortcode(&mut self, text: &str) -> Result<String, StoreError> {
        let mut out = String::with_capacity(text.len());
        for segment in tokenize(text) {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Escaped(inner) => out.push_str(inner),
                Segment::Shortcode { raw, shortcode } => {
                    out.push_str(&self.default_output(raw, &shortcode.tag, &shortcode.attrs)?);
                }
            }
        }
        Ok(out)
    }

    fn default_output(
        &self,
        raw: &str,
        tag: &str,
        attrs: &Attributes,
    ) -> Result<String, StoreError> {
        if tag == self.config.source.tag {
            let ids = attrs.get("ids").map(|ids| split_ids(ids)).unwrap_or_default();
            return Ok(self.wp_gallery(&ids)?.into_string());
        }
        if tag == self.config.target.shortcode_tag {
            let gallery_id = attrs.get("id").and_then(|id| id.trim().parse::<PostId>().ok());
            return match gallery_id {
                Some(gallery_id) => Ok(self.modula_gallery(gallery_id)?.into_string()),
                None => Ok(String::new()),
            };
        }
        Ok(raw.to_string())
    }

    fn wp_gallery(&self, ids: &[String]) -> Result<Markup, StoreError> {
        let source = &self.config.source;
        let mut attachments = Vec::with_capacity(ids.len());
        for id in ids {
            let Ok(id) = id.parse::<PostId>() else {
                continue;
            };
            if let Some(post) = self.store.get_post(id)?
                && post.post_type == source.attachment_type
            {
                attachments.push(post);
            }
        }
        Ok(html! {
            div class="gallery" {
                @for attachment in &attachments {
                    figure class="gallery-item" data-id=(attachment.id) {
                        span class="gallery-title" { (attachment.title) }
                        @if !attachment.excerpt.is_empty() {
                            figcaption { (attachment.excerpt) }
                        }
                    }
                }
            }
        })
    }

    fn modula_gallery(&self, gallery_id: PostId) -> Result<Markup, StoreError> {
        let target = &self.config.target;
        let images: Vec<GalleryImage> = match self.store.get_meta(gallery_id, &target.images_key)? {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!(gallery_id, error = %e, "unreadable Modula image list");
                Vec::new()
            }),
            None => Vec::new(),
        };
        Ok(html! {
            div class="modula modula-gallery" data-id=(gallery_id) {
                @for image in &images {
                    figure class="modula-item" data-id=(image.id)
                        data-halign=(image.halign) data-valign=(image.valign) {
                        span class="modula-title" title=(image.alt) { (image.title) }
                        @if !image.description.is_empty() {
                            figcaption { (image.description) }
                        }
                    }
                }
            }
        })
    }
}

/// A hook run after a shortcode's default handler.
///
/// Implementations must return `output` untouched for shortcodes they do not
/// handle.
pub trait ShortcodeFilter {
    fn filter(
        &self,
        output: String,
        tag: &str,
        attrs: &Attributes,
        context: &mut RenderContext<'_>,
    ) -> String;
}

/// Renders post content with a set of registered filters.
#[derive(Default)]
pub struct ShortcodePipeline {
    filters: Vec<Box<dyn ShortcodeFilter>>,
}

impl ShortcodePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: impl ShortcodeFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Render `post.content`.
    pub fn render(
        &self,
        store: &mut dyn Store,
        config: &MigrateConfig,
        post: &Post,
    ) -> Result<String, StoreError> {
        let mut context = RenderContext {
            store,
            config,
            post,
        };
        let mut out = String::with_capacity(post.content.len());
        for segment in tokenize(&post.content) {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Escaped(inner) => out.push_str(inner),
                Segment::Shortcode { raw, shortcode } => {
                    let mut output = context.default_output(raw, &shortcode.tag, &shortcode.attrs)?;
                    for filter in &self.filters {
                        output = filter.filter(output, &shortcode.tag, &shortcode.attrs, &mut context);
                    }
                    out.push_str(&output);
                }
            }
        }
        debug!(post_id = post.id, filters = self.filters.len(), "rendered post");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ContentStore, MetaStore};
    use crate::test_helpers::*;
    use serde_json::json;

    fn render_plain(content: &str) -> String {
        let mut store = fixture_store();
        let config = MigrateConfig::default();
        let page = post(60, "page", "Page", content);
        ShortcodePipeline::new()
            .render(&mut store, &config, &page)
            .unwrap()
    }

    /// Appends the tag name, so ordering and arguments are visible.
    struct Tagger;

    impl ShortcodeFilter for Tagger {
        fn filter(
            &self,
            output: String,
            tag: &str,
            _attrs: &Attributes,
            _context: &mut RenderContext<'_>,
        ) -> String {
            format!("{output}<!--{tag}-->")
        }
    }

    #[test]
    fn text_passes_through() {
        assert_eq!(render_plain("<p>Hello</p>"), "<p>Hello</p>");
    }

    #[test]
    fn gallery_renders_one_figure_per_attachment() {
        let html = render_plain(r#"<p>a</p>[gallery ids="101, 103, 9000"]<p>b</p>"#);
        assert!(html.starts_with("<p>a</p><div class=\"gallery\">"));
        assert!(html.ends_with("</div><p>b</p>"));
        assert_eq!(html.matches("<figure").count(), 2);
        assert!(html.contains("Dawn"));
        assert!(html.contains("<figcaption>Boats</figcaption>"));
    }

    #[test]
    fn unknown_shortcode_is_kept_verbatim() {
        let html = render_plain(r#"x [caption width="3"] y"#);
        assert_eq!(html, r#"x [caption width="3"] y"#);
    }

    #[test]
    fn escaped_shortcode_prints_single_brackets() {
        let html = render_plain(r#"see [[modula id="3"]] here"#);
        assert_eq!(html, r#"see [modula id="3"] here"#);
    }

    #[test]
    fn modula_renders_stored_images() {
        let mut store = fixture_store();
        let config = MigrateConfig::default();
        let images = sample_images(&store, &config, &["104", "105"]);
        let gallery = add_gallery(&mut store, &config, "g", crate::types::PostStatus::Draft);
        store
            .set_meta(gallery, "modula-images", serde_json::to_value(&images).unwrap())
            .unwrap();
        let mut context = RenderContext {
            store: &mut store,
            config: &config,
            post: &post(60, "page", "Page", ""),
        };

        let html = context
            .do_shortcode(&format!(r#"[modula id="{gallery}"]"#))
            .unwrap();
        assert!(html.contains(&format!(r#"data-id="{gallery}""#)));
        assert_eq!(html.matches("<figure").count(), 2);
        assert!(html.contains(r#"title="Wooden pier""#));
    }

    #[test]
    fn modula_with_unreadable_images_renders_empty() {
        let mut store = fixture_store();
        let config = MigrateConfig::default();
        store.set_meta(4, "modula-images", json!("garbage")).unwrap();
        let page = post(60, "page", "Page", r#"[modula id="4"]"#);
        let html = ShortcodePipeline::new()
            .render(&mut store, &config, &page)
            .unwrap();
        assert!(!html.contains("<figure"));
        assert!(store.get_post(4).unwrap().is_some());
    }

    #[test]
    fn filters_run_after_default_output_in_order() {
        let mut store = fixture_store();
        let config = MigrateConfig::default();
        let page = post(60, "page", "Page", r#"[caption] and [gallery]"#);
        let html = ShortcodePipeline::new()
            .with_filter(Tagger)
            .with_filter(Tagger)
            .render(&mut store, &config, &page)
            .unwrap();
        assert_eq!(
            html,
            r#"[caption]<!--caption--><!--caption--> and <div class="gallery"></div><!--gallery--><!--gallery-->"#
        );
    }
}
