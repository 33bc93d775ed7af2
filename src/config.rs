//! Migration configuration module.
//!
//! Holds the fixed schema knowledge the migration needs: which token opens a
//! WP Gallery shortcode, which post type and meta keys make up a Modula
//! gallery, the title scheme for generated galleries, and the default image
//! attributes and gallery settings written when no template is used.
//!
//! These values rarely change, but sites that renamed the Modula post type or
//! ship a patched Modula can override them. Runtime switches that an admin
//! flips (excluded post types, template use, on-the-fly conversion) live in
//! the option store instead; see [`crate::settings`].
//!
//! ## Config File Location
//!
//! `config.toml` is looked up next to the store snapshot, or passed with
//! `--config`. A missing file means stock defaults.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [source]
//! token = "[gallery"                  # Literal opening of a WP Gallery shortcode
//! tag = "gallery"                     # Shortcode tag intercepted at render time
//! attachment_type = "attachment"      # Post type of gallery images
//! alt_key = "_wp_attachment_image_alt"
//!
//! [target]
//! post_type = "modula-gallery"
//! images_key = "modula-images"
//! settings_key = "modula-settings"
//! title_prefix = "GEN-MG-"            # GEN-MG-<post>-<position + 1>
//! template_title = "setting-template"
//! shortcode_tag = "modula"
//!
//! [summary]
//! title = "Migration Support Post"
//! edit_link = "/wp-admin/post.php?post={id}&action=edit"
//!
//! [render]
//! wrapper_class = "gallery-migrate-wrap"
//!
//! [image_defaults]
//! halign = "center"
//! valign = "middle"
//! link = ""
//! target = "_blank"
//!
//! [gallery_defaults]
//! type = "creative-gallery"
//! columns = 6
//! # ... see `gen-config` for the full table
//! ```
//!
//! ## Merging
//!
//! User values are merged key-by-key on top of the stock defaults, so a file
//! containing only `[gallery_defaults] columns = 4` keeps every other default
//! gallery setting. Unknown keys are rejected everywhere except inside
//! `[gallery_defaults]`, which is an open table mirroring Modula's settings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Migration configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigrateConfig {
    /// Where WP galleries come from.
    pub source: SourceConfig,
    /// Modula gallery schema.
    pub target: TargetConfig,
    /// Migration summary post.
    pub summary: SummaryConfig,
    /// Render-time conversion markup.
    pub render: RenderConfig,
    /// Per-image attributes every generated image starts from.
    pub image_defaults: ImageDefaults,
    /// Modula gallery settings used when no template is configured.
    pub gallery_defaults: BTreeMap<String, serde_json::Value>,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            target: TargetConfig::default(),
            summary: SummaryConfig::default(),
            render: RenderConfig::default(),
            image_defaults: ImageDefaults::default(),
            gallery_defaults: default_gallery_settings(),
        }
    }
}

impl MigrateConfig {
    /// Validate that every schema name is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.source.token.starts_with('[') || self.source.token.len() < 2 {
            return Err(ConfigError::Validation(
                "source.token must start with '[' followed by a tag name".into(),
            ));
        }
        let required = [
            ("source.tag", &self.source.tag),
            ("source.attachment_type", &self.source.attachment_type),
            ("target.post_type", &self.target.post_type),
            ("target.images_key", &self.target.images_key),
            ("target.settings_key", &self.target.settings_key),
            ("target.title_prefix", &self.target.title_prefix),
            ("target.template_title", &self.target.template_title),
            ("target.shortcode_tag", &self.target.shortcode_tag),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{name} must not be empty")));
            }
        }
        if !self.summary.edit_link.contains("{id}") {
            return Err(ConfigError::Validation(
                "summary.edit_link must contain an {id} placeholder".into(),
            ));
        }
        Ok(())
    }

    /// Modula shortcode for a gallery id, e.g. `[modula id="12"]`.
    pub fn gallery_shortcode(&self, gallery_id: u64) -> String {
        format!("[{} id=\"{}\"]", self.target.shortcode_tag, gallery_id)
    }

    /// Title of a generated gallery. Positions are shown 1-based.
    pub fn gallery_title(&self, source_post_id: u64, position: usize) -> String {
        format!(
            "{}{}-{}",
            self.target.title_prefix,
            source_post_id,
            position + 1
        )
    }

    /// Admin edit link of a post.
    pub fn edit_link(&self, post_id: u64) -> String {
        self.summary.edit_link.replace("{id}", &post_id.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// Literal text that opens a gallery shortcode. Never interpreted as a pattern.
    pub token: String,
    /// Tag name the render-time filter acts on.
    pub tag: String,
    /// Post type an image id must resolve to.
    pub attachment_type: String,
    /// Meta key holding an attachment's alt text.
    pub alt_key: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            token: "[gallery".to_string(),
            tag: "gallery".to_string(),
            attachment_type: "attachment".to_string(),
            alt_key: "_wp_attachment_image_alt".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetConfig {
    pub post_type: String,
    pub images_key: String,
    pub settings_key: String,
    pub title_prefix: String,
    /// Title of the gallery whose settings are copied when templates are on.
    pub template_title: String,
    pub shortcode_tag: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            post_type: "modula-gallery".to_string(),
            images_key: "modula-images".to_string(),
            settings_key: "modula-settings".to_string(),
            title_prefix: "GEN-MG-".to_string(),
            template_title: "setting-template".to_string(),
            shortcode_tag: "modula".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SummaryConfig {
    pub title: String,
    /// Edit link template; `{id}` is replaced by the source post id.
    pub edit_link: String,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            title: "Migration Support Post".to_string(),
            edit_link: "/wp-admin/post.php?post={id}&action=edit".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// CSS class of the `<div>` wrapping a converted gallery.
    pub wrapper_class: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            wrapper_class: "gallery-migrate-wrap".to_string(),
        }
    }
}

/// Display attributes of a Modula 2.x image that do not come from the
/// attachment itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageDefaults {
    pub title: String,
    pub description: String,
    pub alt: String,
    pub halign: String,
    pub valign: String,
    pub link: String,
    /// HTML link target.
    pub target: String,
}

impl Default for ImageDefaults {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            alt: String::new(),
            halign: "center".to_string(),
            valign: "middle".to_string(),
            link: String::new(),
            target: "_blank".to_string(),
        }
    }
}

/// Modula 2.x gallery settings compatible with Modula Lite.
fn default_gallery_settings() -> BTreeMap<String, serde_json::Value> {
    use serde_json::json;
    [
        ("type", json!("creative-gallery")),
        ("gutter", json!("10")),
        ("columns", json!(6)),
        ("width", json!("100%")),
        ("height", json!("800")),
        ("img_size", json!("300")),
        ("margin", json!("10")),
        ("randomFactor", json!("50")),
        ("lightbox", json!("lightbox2")),
        ("shuffle", json!("0")),
        ("captionColor", json!("#ffffff")),
        ("wp_field_title", json!("title")),
        ("wp_field_caption", json!("caption")),
        ("hide_title", json!("1")),
        ("hide_description", json!("1")),
        ("captionFontSize", json!("14")),
        ("titleFontSize", json!("16")),
        ("enableTwitter", json!("0")),
        ("enableFacebook", json!("0")),
        ("enableGplus", json!("0")),
        ("enablePinterest", json!("0")),
        ("socialIconColor", json!("#ffffff")),
        ("loadedScale", json!("100")),
        ("effect", json!("pufrobo")),
        ("borderSize", json!("1")),
        ("borderRadius", json!("4")),
        ("borderColor", json!("#ffffff")),
        ("shadowSize", json!("0")),
        ("shadowColor", json!("#ffffff")),
        ("style", json!("")),
        ("helpergrid", json!("0")),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(MigrateConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<MigrateConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: MigrateConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a `config.toml` path, falling back to stock defaults
/// when the file is absent.
pub fn load_config(path: &Path) -> Result<MigrateConfig, ConfigError> {
    resolve_config(load_raw_config(path)?)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Gallery Migrate Configuration
# =============================
# All settings are optional. Values shown below are the defaults.
# Each section only needs the keys it wants to override.
# Unknown keys cause an error, except inside [gallery_defaults].

# ---------------------------------------------------------------------------
# WP Gallery source
# ---------------------------------------------------------------------------
[source]
# Literal text opening a gallery shortcode. Matched as-is, case-sensitive.
token = "[gallery"
# Shortcode tag intercepted when posts are rendered.
tag = "gallery"
# Post type every gallery image id must resolve to.
attachment_type = "attachment"
# Attachment meta key holding the alt text.
alt_key = "_wp_attachment_image_alt"

# ---------------------------------------------------------------------------
# Modula gallery target
# ---------------------------------------------------------------------------
[target]
post_type = "modula-gallery"
images_key = "modula-images"
settings_key = "modula-settings"
# Generated galleries are titled <prefix><source post id>-<position, 1-based>.
title_prefix = "GEN-MG-"
# Gallery whose settings are copied when the use-template option is on.
template_title = "setting-template"
shortcode_tag = "modula"

# ---------------------------------------------------------------------------
# Migration summary post
# ---------------------------------------------------------------------------
[summary]
title = "Migration Support Post"
edit_link = "/wp-admin/post.php?post={id}&action=edit"

# ---------------------------------------------------------------------------
# Render-time conversion
# ---------------------------------------------------------------------------
[render]
wrapper_class = "gallery-migrate-wrap"

# ---------------------------------------------------------------------------
# Image attributes not taken from the attachment
# ---------------------------------------------------------------------------
[image_defaults]
# Used when the attachment's title, caption or alt text is empty.
title = ""
description = ""
alt = ""
halign = "center"
valign = "middle"
link = ""
target = "_blank"

# ---------------------------------------------------------------------------
# Modula 2.x gallery settings (used unless a template gallery is configured)
# ---------------------------------------------------------------------------
[gallery_defaults]
type = "creative-gallery"
gutter = "10"
columns = 6
width = "100%"
height = "800"
img_size = "300"
margin = "10"
randomFactor = "50"
lightbox = "lightbox2"
shuffle = "0"
captionColor = "#ffffff"
wp_field_title = "title"
wp_field_caption = "caption"
hide_title = "1"
hide_description = "1"
captionFontSize = "14"
titleFontSize = "16"
enableTwitter = "0"
enableFacebook = "0"
enableGplus = "0"
enablePinterest = "0"
socialIconColor = "#ffffff"
loadedScale = "100"
effect = "pufrobo"
borderSize = "1"
borderRadius = "4"
borderColor = "#ffffff"
shadowSize = "0"
shadowColor = "#ffffff"
style = ""
helpergrid = "0"
"##
}
