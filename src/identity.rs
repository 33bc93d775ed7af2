//! Provenance index: which Modula gallery was generated from which shortcode.
//!
//! Every generated gallery carries two meta fields recording its origin:
//!
//! | Key | Value |
//! |-----|-------|
//! | `source-post-id` | id of the post holding the WP gallery, as an integer string |
//! | `source-position` | 0-based shortcode position in that post, as an integer string |
//!
//! These key names are a stable contract; other tools read them.
//!
//! ## Uniqueness
//!
//! At most one draft or published gallery should exist per
//! `(source-post-id, source-position)`. The store does not enforce this: a bulk
//! import and a render-time conversion racing on the same shortcode can each
//! miss the other's insert and create a duplicate. [`GalleryIndex::resolve`]
//! then returns the lowest id, and [`GalleryIndex::matches`] exposes every
//! candidate so duplicates can be detected and cleaned up.
//!
//! Trashed and private galleries are invisible to the index; trashing a
//! generated gallery makes the next conversion create a fresh one.

use crate::config::MigrateConfig;
use crate::store::{MetaQuery, Store, StoreError, meta_as_text};
use crate::types::{PostId, PostStatus};

pub const SOURCE_POST_ID_KEY: &str = "source-post-id";
pub const SOURCE_POSITION_KEY: &str = "source-position";

/// A live gallery generated from some shortcode of a source post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedGallery {
    pub gallery_id: PostId,
    /// `None` when the stored position is not an integer.
    pub position: Option<usize>,
}

pub struct GalleryIndex<'a> {
    store: &'a dyn Store,
    post_type: &'a str,
}

impl<'a> GalleryIndex<'a> {
    pub fn new(store: &'a dyn Store, config: &'a MigrateConfig) -> Self {
        Self {
            store,
            post_type: &config.target.post_type,
        }
    }

    /// All live galleries generated from `source_post_id`, in id order.
    pub fn galleries_for(&self, source_post_id: PostId) -> Result<Vec<IndexedGallery>, StoreError> {
        let value = source_post_id.to_string();
        let matches = self.store.find_posts_by_meta(&MetaQuery {
            post_type: self.post_type,
            statuses: PostStatus::LIVE,
            key: SOURCE_POST_ID_KEY,
            value: &value,
            join_key: SOURCE_POSITION_KEY,
        })?;
        Ok(matches
            .into_iter()
            .map(|m| IndexedGallery {
                gallery_id: m.post_id,
                position: meta_as_text(&m.joined).and_then(|p| p.trim().parse().ok()),
            })
            .collect())
    }

    /// Every live gallery stamped with this exact origin. More than one
    /// entry means the uniqueness invariant was broken.
    pub fn matches(
        &self,
        source_post_id: PostId,
        position: usize,
    ) -> Result<Vec<PostId>, StoreError> {
        Ok(self
            .galleries_for(source_post_id)?
            .into_iter()
            .filter(|g| g.position == Some(position))
            .map(|g| g.gallery_id)
            .collect())
    }

    /// The gallery generated from this shortcode, if any.
    pub fn resolve(
        &self,
        source_post_id: PostId,
        position: usize,
    ) -> Result<Option<PostId>, StoreError> {
        Ok(self
            .galleries_for(source_post_id)?
            .into_iter()
            .find(|g| g.position == Some(position))
            .map(|g| g.gallery_id))
    }
}
