//! CLI output formatting.
//!
//! Output leads with what an editor recognises: the post and the 1-based
//! position of each gallery in it, the same numbering used in generated
//! gallery titles and the summary post. Ids and shortcodes follow as
//! indented context lines.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Summer Trip (post 1, 2 galleries)
//! 001 ids: 101,102
//!     Gallery: [modula id="106"]
//! 002 ids: 103, 104
//!     Gallery: not converted
//!     Override: keep
//! ```
//!
//! When more than one live gallery carries the same origin, the one in use
//! (lowest id) is listed as `Gallery` and the others as `Duplicates`.
//!
//! ## Import
//!
//! ```text
//! Galleries
//! 001 post 1 / 1 → [modula id="106"] (2 images)
//! 002 post 1 / 2 → [modula id="107"] (2 images)
//!
//! 2 WP Galleries found. 2 Modula Galleries created / updated.
//!     Created: 2, updated: 0, skipped without ids: 1
//!     Summary post: 108
//! ```
//!
//! ## Settings
//!
//! ```text
//! Settings
//!     gallery_migrate_excluded_types = attachment, nav_menu_item, revision
//!     gallery_migrate_use_template = 0
//!     gallery_migrate_convert_on_render = 1
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure.

use crate::admin::AdminResponse;
use crate::config::MigrateConfig;
use crate::import::ImportSummary;
use crate::shortcode::{Override, ShortcodeSpan, extract_override};
use crate::types::{Post, PostId};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

// ============================================================================
// Scan
// ============================================================================

/// Format the gallery shortcodes of one post.
///
/// `galleries[i]` lists the Modula galleries generated from `spans[i]`, in
/// id order. Usually zero or one.
pub fn format_scan_output(
    config: &MigrateConfig,
    post: &Post,
    spans: &[ShortcodeSpan<'_>],
    galleries: &[Vec<PostId>],
) -> Vec<String> {
    let mut lines = vec![format!(
        "{} (post {}, {})",
        post.title,
        post.id,
        plural(spans.len(), "gallery", "galleries")
    )];

    for (span, gallery) in spans.iter().zip(galleries) {
        let header = match span.ids() {
            Some(ids) => format!("{} ids: {}", format_index(span.position + 1), ids),
            None => format!("{} (no ids)", format_index(span.position + 1)),
        };
        lines.push(header);
        match gallery.split_first() {
            Some((id, duplicates)) => {
                lines.push(format!(
                    "{}Gallery: {}",
                    indent(1),
                    config.gallery_shortcode(*id)
                ));
                if !duplicates.is_empty() {
                    let duplicates: Vec<String> = duplicates
                        .iter()
                        .map(|id| config.gallery_shortcode(*id))
                        .collect();
                    lines.push(format!("{}Duplicates: {}", indent(1), duplicates.join(", ")));
                }
            }
            None => lines.push(format!("{}Gallery: not converted", indent(1))),
        }
        match extract_override(span.text) {
            Override::Convert => lines.push(format!("{}Override: convert", indent(1))),
            Override::Keep => lines.push(format!("{}Override: keep", indent(1))),
            Override::Unset => {}
        }
    }
    lines
}

pub fn print_scan_output(
    config: &MigrateConfig,
    post: &Post,
    spans: &[ShortcodeSpan<'_>],
    galleries: &[Vec<PostId>],
) {
    for line in format_scan_output(config, post, spans, galleries) {
        println!("{}", line);
    }
}

// ============================================================================
// Import
// ============================================================================

/// Format a bulk import result.
pub fn format_import_output(config: &MigrateConfig, summary: &ImportSummary) -> Vec<String> {
    let mut lines = Vec::new();
    if !summary.galleries.is_empty() {
        lines.push("Galleries".to_string());
        for (i, gallery) in summary.galleries.iter().enumerate() {
            lines.push(format!(
                "{} post {} / {} → {} ({})",
                format_index(i + 1),
                gallery.source_post_id,
                gallery.position + 1,
                config.gallery_shortcode(gallery.gallery.gallery_id),
                plural(gallery.image_count, "image", "images")
            ));
        }
        lines.push(String::new());
    }
    lines.push(summary.message());
    lines.push(format!(
        "{}Created: {}, updated: {}, skipped without ids: {}",
        indent(1),
        summary.created,
        summary.updated,
        summary.skipped
    ));
    match summary.summary_post_id {
        Some(id) => lines.push(format!("{}Summary post: {}", indent(1), id)),
        None => lines.push(format!("{}Summary post: unchanged", indent(1))),
    }
    lines
}

pub fn print_import_output(config: &MigrateConfig, summary: &ImportSummary) {
    for line in format_import_output(config, summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Settings and admin responses
// ============================================================================

pub fn format_settings(values: &[(String, String)]) -> Vec<String> {
    let mut lines = vec!["Settings".to_string()];
    for (name, value) in values {
        lines.push(format!("{}{} = {}", indent(1), name, value));
    }
    lines
}

pub fn print_settings(values: &[(String, String)]) {
    for line in format_settings(values) {
        println!("{}", line);
    }
}

/// Human-readable admin response: the message, then the payload fields.
pub fn format_admin_response(response: &AdminResponse) -> Vec<String> {
    let mut lines = vec![if response.is_ok() {
        response.message.clone()
    } else {
        format!("Error: {}", response.message)
    }];
    if let Some(serde_json::Value::Object(fields)) = &response.payload {
        for (key, value) in fields {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            lines.push(format!("{}{}: {}", indent(1), key, value));
        }
    }
    lines
}

/// Print an admin response, as JSON when `json` is set.
pub fn print_admin_response(response: &AdminResponse, json: bool) {
    if json {
        match serde_json::to_string(response) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("Error: {}", e),
        }
    } else {
        for line in format_admin_response(response) {
            println!("{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shortcode::scan_shortcodes;
    use crate::test_helpers::*;
    use crate::types::{ConvertedGallery, GalleryRef};
    use serde_json::json;

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn format_index_pads_to_three_digits() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "image", "images"), "1 image");
        assert_eq!(plural(0, "image", "images"), "0 images");
    }

    // =========================================================================
    // Scan
    // =========================================================================

    #[test]
    fn scan_lists_positions_and_galleries() {
        let config = MigrateConfig::default();
        let summer = post(1, "post", "Summer Trip", SUMMER_TRIP);
        let spans = scan_shortcodes(&summer.content, "[gallery");
        let lines = format_scan_output(&config, &summer, &spans, &[vec![106], vec![]]);
        assert_eq!(
            lines,
            vec![
                "Summer Trip (post 1, 2 galleries)",
                "001 ids: 101,102",
                "    Gallery: [modula id=\"106\"]",
                "002 ids: 103, 104",
                "    Gallery: not converted",
            ]
        );
    }

    #[test]
    fn scan_shows_missing_ids_and_override() {
        let config = MigrateConfig::default();
        let page = post(9, "page", "P", r#"[gallery columns="2"][gallery ids="1" mod="no"]"#);
        let spans = scan_shortcodes(&page.content, "[gallery");
        let lines = format_scan_output(&config, &page, &spans, &[vec![], vec![]]);
        assert_eq!(lines[1], "001 (no ids)");
        assert_eq!(lines[3], "002 ids: 1");
        assert_eq!(lines[5], "    Override: keep");
    }

    #[test]
    fn scan_flags_duplicate_galleries() {
        let config = MigrateConfig::default();
        let single = post(9, "post", "P", r#"[gallery ids="1"]"#);
        let spans = scan_shortcodes(&single.content, "[gallery");
        let lines = format_scan_output(&config, &single, &spans, &[vec![106, 108, 111]]);
        assert_eq!(
            lines[2..],
            [
                "    Gallery: [modula id=\"106\"]",
                "    Duplicates: [modula id=\"108\"], [modula id=\"111\"]",
            ]
        );
    }

    // =========================================================================
    // Import
    // =========================================================================

    #[test]
    fn import_output_lists_galleries_then_totals() {
        let config = MigrateConfig::default();
        let summary = ImportSummary {
            posts_scanned: 1,
            galleries_found: 1,
            skipped: 1,
            created: 1,
            updated: 0,
            galleries: vec![ConvertedGallery {
                source_post_id: 1,
                position: 1,
                gallery: GalleryRef { gallery_id: 106 },
                image_count: 1,
            }],
            summary_post_id: Some(107),
        };
        let lines = format_import_output(&config, &summary);
        assert_eq!(lines[0], "Galleries");
        assert_eq!(lines[1], "001 post 1 / 2 → [modula id=\"106\"] (1 image)");
        assert_eq!(lines[2], "");
        assert_eq!(
            lines[3],
            "1 WP Galleries found. 1 Modula Galleries created / updated."
        );
        assert_eq!(lines[4], "    Created: 1, updated: 0, skipped without ids: 1");
        assert_eq!(lines[5], "    Summary post: 107");
    }

    #[test]
    fn import_without_conversions_keeps_summary() {
        let config = MigrateConfig::default();
        let summary = ImportSummary {
            posts_scanned: 1,
            galleries_found: 0,
            skipped: 1,
            created: 0,
            updated: 0,
            galleries: Vec::new(),
            summary_post_id: None,
        };
        let lines = format_import_output(&config, &summary);
        assert_eq!(lines.last().unwrap(), "    Summary post: unchanged");
    }

    // =========================================================================
    // Settings and admin responses
    // =========================================================================

    #[test]
    fn settings_one_line_each() {
        let lines = format_settings(&[("a".to_string(), "1".to_string())]);
        assert_eq!(lines, vec!["Settings", "    a = 1"]);
    }

    #[test]
    fn admin_error_is_prefixed() {
        let lines = format_admin_response(&AdminResponse::err("No WP Galleries found."));
        assert_eq!(lines, vec!["Error: No WP Galleries found."]);
    }

    #[test]
    fn admin_payload_fields_are_listed() {
        let response = AdminResponse::ok("done", Some(json!({"count": 3, "name": "x"})));
        let lines = format_admin_response(&response);
        assert_eq!(lines, vec!["done", "    count: 3", "    name: x"]);
    }
}
