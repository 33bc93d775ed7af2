//! Storage contracts the migration runs against, and an in-memory store.
//!
//! The host CMS owns persistence. The migration only needs three narrow
//! capabilities, expressed as traits so the core never touches a storage
//! engine directly:
//!
//! - [`ContentStore`]: posts (find by substring, by id, by title; insert; update)
//! - [`MetaStore`]: key-value metadata attached to posts, plus the one join
//!   query identity resolution needs
//! - [`OptionStore`]: named site options
//!
//! [`Store`] is the union, implemented automatically for anything providing all
//! three.
//!
//! ## Snapshot format
//!
//! [`MemoryStore`] backs the CLI and the tests. It round-trips through a JSON
//! snapshot where each post carries its own metadata:
//!
//! ```json
//! {
//!   "post_types": ["post", "page", "attachment"],
//!   "options": { "gallery_migrate_convert_on_render": "1" },
//!   "posts": [
//!     { "id": 10, "post_type": "attachment", "status": "publish",
//!       "title": "Dawn", "excerpt": "Caption",
//!       "meta": { "_wp_attachment_image_alt": "Sunrise" } }
//!   ]
//! }
//! ```
//!
//! Posts are visited in id order, which makes "first match" deterministic.

use crate::types::{NewPost, Post, PostId, PostStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Post {0} does not exist")]
    MissingPost(PostId),
}

pub trait ContentStore {
    /// Ids of all posts whose content contains `needle` literally, skipping
    /// the given post types. Returns ids only so callers can load posts one
    /// at a time.
    fn find_posts_containing(
        &self,
        needle: &str,
        excluded_types: &[String],
    ) -> Result<Vec<PostId>, StoreError>;

    fn get_post(&self, id: PostId) -> Result<Option<Post>, StoreError>;

    /// Status of a post, `None` if it does not exist.
    fn post_status(&self, id: PostId) -> Result<Option<PostStatus>, StoreError> {
        Ok(self.get_post(id)?.map(|post| post.status))
    }

    /// First non-trashed post of `post_type` with exactly this title.
    fn find_post_by_title(&self, title: &str, post_type: &str)
    -> Result<Option<Post>, StoreError>;

    fn insert_post(&mut self, post: NewPost) -> Result<PostId, StoreError>;

    /// Replace all fields of an existing post.
    fn update_post(&mut self, id: PostId, post: NewPost) -> Result<(), StoreError>;

    fn post_type_exists(&self, post_type: &str) -> bool;
}

/// Parameters of the provenance join: posts of `post_type` in one of
/// `statuses` whose `key` meta equals `value`, each returned with its
/// `join_key` meta.
#[derive(Debug, Clone, Copy)]
pub struct MetaQuery<'a> {
    pub post_type: &'a str,
    pub statuses: &'a [PostStatus],
    pub key: &'a str,
    pub value: &'a str,
    pub join_key: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetaMatch {
    pub post_id: PostId,
    pub joined: Value,
}

pub trait MetaStore {
    fn get_meta(&self, id: PostId, key: &str) -> Result<Option<Value>, StoreError>;

    fn set_meta(&mut self, id: PostId, key: &str, value: Value) -> Result<(), StoreError>;

    /// Posts matching the query that also carry the join key, in id order.
    fn find_posts_by_meta(&self, query: &MetaQuery<'_>) -> Result<Vec<MetaMatch>, StoreError>;
}

pub trait OptionStore {
    fn get_option(&self, name: &str) -> Result<Option<String>, StoreError>;

    fn set_option(&mut self, name: &str, value: &str) -> Result<(), StoreError>;
}

/// Everything the migration needs from the host.
pub trait Store: ContentStore + MetaStore + OptionStore {}

impl<T: ContentStore + MetaStore + OptionStore + ?Sized> Store for T {}

/// Meta values are compared as text, the way the host stores them.
pub fn meta_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "" }.to_string()),
        _ => None,
    }
}

// ============================================================================
// In-memory store
// ============================================================================

const BUILTIN_POST_TYPES: &[&str] = &["post", "page", "attachment", "revision", "nav_menu_item"];

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    post_types: BTreeSet<String>,
    posts: BTreeMap<PostId, Post>,
    meta: BTreeMap<PostId, BTreeMap<String, Value>>,
    options: BTreeMap<String, String>,
}

/// On-disk form of a [`MemoryStore`].
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub post_types: BTreeSet<String>,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    #[serde(default)]
    pub posts: Vec<SnapshotPost>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotPost {
    #[serde(flatten)]
    pub post: Post,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut store = Self {
            post_types: snapshot.post_types,
            options: snapshot.options,
            ..Self::default()
        };
        for entry in snapshot.posts {
            let id = entry.post.id;
            store.put_post(entry.post);
            if !entry.meta.is_empty() {
                store.meta.insert(id, entry.meta);
            }
        }
        store
    }

    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            post_types: self.post_types.clone(),
            options: self.options.clone(),
            posts: self
                .posts
                .values()
                .map(|post| SnapshotPost {
                    post: post.clone(),
                    meta: self.meta.get(&post.id).cloned().unwrap_or_default(),
                })
                .collect(),
        }
    }

    /// Load a JSON snapshot.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Save as a pretty-printed JSON snapshot.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.to_snapshot())?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Insert or replace a post under its own id.
    pub fn put_post(&mut self, post: Post) {
        self.posts.insert(post.id, post);
    }

    /// Register a custom post type.
    pub fn register_post_type(&mut self, post_type: &str) {
        self.post_types.insert(post_type.to_string());
    }

    /// Number of stored posts of a type, any status.
    pub fn count_posts(&self, post_type: &str) -> usize {
        self.posts
            .values()
            .filter(|p| p.post_type == post_type)
            .count()
    }

    /// Change a post's status, e.g. to simulate trashing.
    pub fn set_status(&mut self, id: PostId, status: PostStatus) -> Result<(), StoreError> {
        let post = self.posts.get_mut(&id).ok_or(StoreError::MissingPost(id))?;
        post.status = status;
        Ok(())
    }

    fn next_id(&self) -> PostId {
        self.posts.keys().next_back().map_or(1, |id| id + 1)
    }
}

impl ContentStore for MemoryStore {
    fn find_posts_containing(
        &self,
        needle: &str,
        excluded_types: &[String],
    ) -> Result<Vec<PostId>, StoreError> {
        Ok(self
            .posts
            .values()
            .filter(|p| !excluded_types.iter().any(|t| *t == p.post_type))
            .filter(|p| p.content.contains(needle))
            .map(|p| p.id)
            .collect())
    }

    fn get_post(&self, id: PostId) -> Result<Option<Post>, StoreError> {
        Ok(self.posts.get(&id).cloned())
    }

    fn find_post_by_title(
        &self,
        title: &str,
        post_type: &str,
    ) -> Result<Option<Post>, StoreError> {
        Ok(self
            .posts
            .values()
            .find(|p| p.post_type == post_type && p.title == title && p.status != PostStatus::Trash)
            .cloned())
    }

    fn insert_post(&mut self, post: NewPost) -> Result<PostId, StoreError> {
        let id = self.next_id();
        self.put_post(Post {
            id,
            post_type: post.post_type,
            status: post.status,
            title: post.title,
            content: post.content,
            excerpt: String::new(),
        });
        Ok(id)
    }

    fn update_post(&mut self, id: PostId, post: NewPost) -> Result<(), StoreError> {
        let existing = self.posts.get_mut(&id).ok_or(StoreError::MissingPost(id))?;
        existing.post_type = post.post_type;
        existing.status = post.status;
        existing.title = post.title;
        existing.content = post.content;
        Ok(())
    }

    fn post_type_exists(&self, post_type: &str) -> bool {
        BUILTIN_POST_TYPES.contains(&post_type)
            || self.post_types.contains(post_type)
            || self.posts.values().any(|p| p.post_type == post_type)
    }
}

impl MetaStore for MemoryStore {
    fn get_meta(&self, id: PostId, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.meta.get(&id).and_then(|m| m.get(key)).cloned())
    }

    fn set_meta(&mut self, id: PostId, key: &str, value: Value) -> Result<(), StoreError> {
        if !self.posts.contains_key(&id) {
            return Err(StoreError::MissingPost(id));
        }
        self.meta
            .entry(id)
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    fn find_posts_by_meta(&self, query: &MetaQuery<'_>) -> Result<Vec<MetaMatch>, StoreError> {
        Ok(self
            .posts
            .values()
            .filter(|p| p.post_type == query.post_type && query.statuses.contains(&p.status))
            .filter_map(|p| {
                let meta = self.meta.get(&p.id)?;
                let matches = meta
                    .get(query.key)
                    .and_then(meta_as_text)
                    .is_some_and(|v| v == query.value);
                if !matches {
                    return None;
                }
                let joined = meta.get(query.join_key)?.clone();
                Some(MetaMatch {
                    post_id: p.id,
                    joined,
                })
            })
            .collect())
    }
}

impl OptionStore for MemoryStore {
    fn get_option(&self, name: &str) -> Result<Option<String>, StoreError> {
        Ok(self.options.get(name).cloned())
    }

    fn set_option(&mut self, name: &str, value: &str) -> Result<(), StoreError> {
        self.options.insert(name.to_string(), value.to_string());
        Ok(())
    }
}
