//! Create-or-update of Modula gallery records.
//!
//! A gallery is written in this order:
//!
//! 1. validate the image list;
//! 2. pick the settings (template copy or built-in defaults);
//! 3. find the gallery already generated from the same shortcode, or insert
//!    a draft titled `GEN-MG-<post>-<position + 1>`;
//! 4. replace the image list;
//! 5. replace the settings;
//! 6. stamp the provenance fields.
//!
//! Settings are picked before anything is written so a missing template
//! aborts without leaving an empty gallery behind. The remaining steps are
//! separate store calls with no transaction around them; a failure between
//! them leaves a gallery whose images or settings are stale until the next
//! run rewrites it.

use crate::config::MigrateConfig;
use crate::error::MigrateError;
use crate::identity::{GalleryIndex, SOURCE_POSITION_KEY, SOURCE_POST_ID_KEY};
use crate::store::Store;
use crate::types::{GalleryImage, GalleryRef, NewPost, PostId, PostStatus};
use serde_json::Value;
use tracing::{debug, info};

/// Where a gallery's settings come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsSource {
    /// `[gallery_defaults]` from the configuration.
    Defaults,
    /// The settings of the gallery titled `target.template_title`.
    Template,
}

impl SettingsSource {
    pub fn from_flag(use_template: bool) -> Self {
        if use_template {
            SettingsSource::Template
        } else {
            SettingsSource::Defaults
        }
    }
}

/// Whether [`GalleryWriter::upsert`] inserted a new gallery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated,
}

pub struct GalleryWriter<'a> {
    store: &'a mut dyn Store,
    config: &'a MigrateConfig,
}

impl<'a> GalleryWriter<'a> {
    pub fn new(store: &'a mut dyn Store, config: &'a MigrateConfig) -> Self {
        Self { store, config }
    }

    /// Write `images` as the gallery generated from shortcode `position` of
    /// post `source_post_id`.
    pub fn upsert(
        &mut self,
        images: &[GalleryImage],
        settings: SettingsSource,
        source_post_id: PostId,
        position: usize,
    ) -> Result<GalleryRef, MigrateError> {
        self.upsert_with_outcome(images, settings, source_post_id, position)
            .map(|(gallery, _)| gallery)
    }

    /// Like [`upsert`](Self::upsert), also reporting whether the gallery is new.
    pub fn upsert_with_outcome(
        &mut self,
        images: &[GalleryImage],
        settings: SettingsSource,
        source_post_id: PostId,
        position: usize,
    ) -> Result<(GalleryRef, WriteOutcome), MigrateError> {
        if images.is_empty() || images.iter().any(|image| image.id == 0) {
            return Err(MigrateError::Validation(
                "Fatal error. Bad Modula image array.".to_string(),
            ));
        }

        let settings = self.gallery_settings(settings)?;
        let target = &self.config.target;

        let existing = GalleryIndex::new(&*self.store, self.config).resolve(source_post_id, position)?;
        let (gallery_id, outcome) = match existing {
            Some(id) => (id, WriteOutcome::Updated),
            None => {
                let id = self.store.insert_post(NewPost {
                    post_type: target.post_type.clone(),
                    status: PostStatus::Draft,
                    title: self.config.gallery_title(source_post_id, position),
                    content: String::new(),
                })?;
                (id, WriteOutcome::Created)
            }
        };

        let images_value = serde_json::to_value(images)
            .map_err(|e| MigrateError::Validation(format!("Fatal error. Bad Modula image array: {e}")))?;
        self.store
            .set_meta(gallery_id, &target.images_key, images_value)?;
        self.store
            .set_meta(gallery_id, &target.settings_key, settings)?;
        self.store.set_meta(
            gallery_id,
            SOURCE_POST_ID_KEY,
            Value::String(source_post_id.to_string()),
        )?;
        self.store.set_meta(
            gallery_id,
            SOURCE_POSITION_KEY,
            Value::String(position.to_string()),
        )?;

        info!(
            gallery_id,
            source_post_id,
            position,
            images = images.len(),
            created = outcome == WriteOutcome::Created,
            "wrote Modula gallery"
        );
        Ok((GalleryRef { gallery_id }, outcome))
    }

    /// Resolve the settings blob to write.
    ///
    /// With a template configured, a missing template gallery is fatal. A
    /// template that exists but has no settings yet falls back to defaults.
    fn gallery_settings(&self, source: SettingsSource) -> Result<Value, MigrateError> {
        let defaults = || {
            Value::Object(
                self.config
                    .gallery_defaults
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            )
        };
        if source == SettingsSource::Defaults {
            return Ok(defaults());
        }

        let target = &self.config.target;
        let template = self
            .store
            .find_post_by_title(&target.template_title, &target.post_type)?
            .ok_or_else(|| MigrateError::Configuration {
                template: target.template_title.clone(),
            })?;
        match self.store.get_meta(template.id, &target.settings_key)? {
            Some(value) if !is_empty_value(&value) => Ok(value),
            _ => {
                debug!(template_id = template.id, "template gallery has no settings, using defaults");
                Ok(defaults())
            }
        }
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}
