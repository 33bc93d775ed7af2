//! # Gallery Migrate
//!
//! Moves a WordPress site from core `[gallery ids="…"]` shortcodes to Modula
//! galleries. Every gallery shortcode in every post becomes a Modula gallery
//! record holding the same images, in the same order, with the attachment's
//! title, caption and alt text carried over.
//!
//! # Architecture: Two Entry Points, One Writer
//!
//! ```text
//! bulk     run_bulk_import ─┐
//!                           ├→ scan → ids → translate → GalleryWriter::upsert → [modula id="N"]
//! render   GalleryConverter ┘                       ↑
//!                                          GalleryIndex (source post, position)
//! ```
//!
//! - **Bulk import** walks every post containing the gallery token (minus the
//!   excluded post types), converts each shortcode and writes a summary post
//!   listing the results. It is what the admin "import" button runs.
//! - **Render-time conversion** is a [`render::ShortcodeFilter`]. When a page
//!   renders a `[gallery]`, the filter swaps the output for the Modula
//!   gallery, creating it on first view.
//!
//! Both paths key a gallery on its origin: the source post id and the 0-based
//! position of the shortcode in that post. Running either path any number of
//! times leaves one gallery per shortcode.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`shortcode`] | Token scanner, `ids` extraction, override flag, generic shortcode tokenizer |
//! | [`translate`] | Attachment → Modula image record |
//! | [`identity`] | Finds the gallery generated from a given shortcode |
//! | [`writer`] | Create-or-update of a gallery record |
//! | [`import`] | Bulk import over the whole site |
//! | [`convert`] | Render-time conversion filter |
//! | [`render`] | Shortcode render pipeline the filter plugs into |
//! | [`summary`] | The migration summary post |
//! | [`settings`] | Admin-managed options, re-read on every operation |
//! | [`admin`] | Import / save / restore entry points returning `{code, message, payload}` |
//! | [`store`] | Host persistence traits and the JSON-snapshot `MemoryStore` |
//! | [`config`] | `config.toml` loading, merging and validation of schema names |
//! | [`types`] | Posts, images and gallery references shared by all stages |
//! | [`error`] | Migration error taxonomy |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Literal Scanning Instead of Regexes
//!
//! A gallery is the text from the token `[gallery` to the next `]`. The token
//! is matched literally, so `[gallery-foo` counts and `[Gallery` does not. The
//! position of a shortcode is its index among *all* such spans in the post,
//! including spans without ids, so both entry points count the same way.
//!
//! ## Provenance on the Gallery
//!
//! A generated gallery stores `source-post-id` and `source-position` as meta
//! fields. Looking a gallery up is a meta query, not a title match, so editors
//! may rename galleries freely.
//!
//! ## Settings Read Fresh
//!
//! The three admin options are read through the [`store::OptionStore`] at the
//! start of every operation. Nothing is cached in the process.
//!
//! ## Store Behind Traits
//!
//! All persistence goes through [`store::ContentStore`], [`store::MetaStore`]
//! and [`store::OptionStore`]. The CLI uses [`store::MemoryStore`], which
//! loads from and saves to a JSON snapshot of the site.

pub mod admin;
pub mod config;
pub mod convert;
pub mod error;
pub mod identity;
pub mod import;
pub mod output;
pub mod render;
pub mod settings;
pub mod shortcode;
pub mod store;
pub mod summary;
pub mod translate;
pub mod types;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_helpers;
