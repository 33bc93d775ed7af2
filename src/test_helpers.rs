//! Shared fixtures for the unit tests.
//!
//! [`fixture_store`] builds a small site:
//!
//! ```text
//! 1  post      "Summer Trip"  [gallery ids="101,102"] ... [gallery ids="103, 104"]
//! 2  page      "About"        [gallery columns="2"] ... [gallery ids="105"]
//! 3  revision  "Summer Trip"  [gallery ids="101"]            (excluded by default)
//! 4  post      "Plain"        no galleries
//! 101..105     attachments (103 has no alt text)
//! ```

use crate::config::MigrateConfig;
use crate::store::{ContentStore, MemoryStore, MetaStore};
use crate::translate::translate_ids;
use crate::types::{GalleryImage, NewPost, Post, PostId, PostStatus};
use serde_json::json;

pub const SUMMER_TRIP: &str =
    "<p>Day one</p>\n[gallery ids=\"101,102\"]\n<p>Day two</p>\n[gallery ids=\"103, 104\"]";
pub const ABOUT: &str = "<p>Me</p>[gallery columns=\"2\"]<p>Work</p>[gallery ids=\"105\"]";

pub fn post(id: PostId, post_type: &str, title: &str, content: &str) -> Post {
    Post {
        id,
        post_type: post_type.to_string(),
        status: PostStatus::Publish,
        title: title.to_string(),
        content: content.to_string(),
        excerpt: String::new(),
    }
}

fn attachment(store: &mut MemoryStore, id: PostId, title: &str, caption: &str, alt: Option<&str>) {
    let mut image = post(id, "attachment", title, "");
    image.excerpt = caption.to_string();
    store.put_post(image);
    if let Some(alt) = alt {
        store
            .set_meta(id, "_wp_attachment_image_alt", json!(alt))
            .unwrap();
    }
}

pub fn fixture_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.register_post_type("modula-gallery");
    store.put_post(post(1, "post", "Summer Trip", SUMMER_TRIP));
    store.put_post(post(2, "page", "About", ABOUT));
    store.put_post(post(3, "revision", "Summer Trip", "[gallery ids=\"101\"]"));
    store.put_post(post(4, "post", "Plain", "<p>Nothing here</p>"));
    attachment(&mut store, 101, "Dawn", "First light", Some("Sunrise over the bay"));
    attachment(&mut store, 102, "Dusk", "Last light", Some("Sunset"));
    attachment(&mut store, 103, "Harbour", "Boats", None);
    attachment(&mut store, 104, "Pier", "", Some("Wooden pier"));
    attachment(&mut store, 105, "Portrait", "Me", Some("Portrait"));
    store
}

/// Insert an empty gallery post and return its id.
pub fn add_gallery(
    store: &mut MemoryStore,
    config: &MigrateConfig,
    title: &str,
    status: PostStatus,
) -> PostId {
    store
        .insert_post(NewPost {
            post_type: config.target.post_type.clone(),
            status,
            title: title.to_string(),
            content: String::new(),
        })
        .unwrap()
}

/// Translate attachment ids, panicking on failure.
pub fn sample_images(store: &MemoryStore, config: &MigrateConfig, ids: &[&str]) -> Vec<GalleryImage> {
    let ids: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
    translate_ids(store, &ids, &config.image_defaults, &config.source).unwrap()
}

/// Image ids stored on a gallery, in order.
pub fn stored_image_ids(store: &MemoryStore, config: &MigrateConfig, gallery: PostId) -> Vec<PostId> {
    let images = store
        .get_meta(gallery, &config.target.images_key)
        .unwrap()
        .unwrap_or_else(|| panic!("gallery {gallery} has no images"));
    let images: Vec<GalleryImage> = serde_json::from_value(images).unwrap();
    images.iter().map(|i| i.id).collect()
}

/// All live galleries in the store, by id.
pub fn gallery_ids(store: &MemoryStore, config: &MigrateConfig) -> Vec<PostId> {
    store
        .to_snapshot()
        .posts
        .iter()
        .filter(|p| p.post.post_type == config.target.post_type)
        .filter(|p| PostStatus::LIVE.contains(&p.post.status))
        .map(|p| p.post.id)
        .collect()
}
