//! Shared types used across the migration.
//!
//! Posts mirror the host CMS's rows closely enough for the migration to read
//! and write them; everything else is the migration's own vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Host post identifier.
pub type PostId = u64;

/// Publication state of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Publish,
    Private,
    Trash,
}

impl PostStatus {
    /// Draft and published posts count as live galleries; everything else is
    /// ignored when resolving identity.
    pub const LIVE: &'static [PostStatus] = &[PostStatus::Draft, PostStatus::Publish];
}

/// A stored post: content page, attachment, gallery, or summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub post_type: String,
    pub status: PostStatus,
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Short caption; for attachments this is the image caption.
    #[serde(default)]
    pub excerpt: String,
}

/// Fields for inserting or replacing a post. The store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub post_type: String,
    pub status: PostStatus,
    pub title: String,
    pub content: String,
}

/// One image of a Modula gallery.
///
/// Serialized as stored under the gallery's images meta key. Rebuilt from
/// the attachment on every conversion, never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub id: PostId,
    pub title: String,
    pub description: String,
    pub alt: String,
    pub halign: String,
    pub valign: String,
    pub link: String,
    pub target: String,
}

/// A gallery shortcode occurrence found in a source post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceGalleryRef {
    pub source_post_id: PostId,
    /// 0-based index of the shortcode within the post body.
    pub position: usize,
    /// Raw `ids` attribute, whitespace preserved.
    pub ids: String,
}

/// Reference to a written Modula gallery.
///
/// Displays as the Modula shortcode for the default `modula` tag; use
/// [`crate::config::MigrateConfig::gallery_shortcode`] when the tag is
/// configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryRef {
    pub gallery_id: PostId,
}

impl fmt::Display for GalleryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[modula id=\"{}\"]", self.gallery_id)
    }
}

/// One successfully converted WP gallery, as listed in the summary post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvertedGallery {
    pub source_post_id: PostId,
    pub position: usize,
    pub gallery: GalleryRef,
    /// Number of images written.
    pub image_count: usize,
}
