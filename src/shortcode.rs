//! Shortcode scanning and attribute extraction.
//!
//! Gallery shortcodes are found by a literal token (`[gallery` by default),
//! not by a grammar. That keeps the matching identical to what the host's
//! content query does (`LIKE '%[gallery%'`), so every post the query returns
//! yields at least one span.
//!
//! ## Span boundaries
//!
//! A span runs from the token to the **first** `]` after it:
//!
//! ```text
//! [gallery ids="1,2,3"] text [gallery ids="4,5"]
//! ^-------------------^      ^-----------------^
//!      position 0                position 1
//! ```
//!
//! Known limitations, kept on purpose so positions stay stable across runs:
//!
//! - a `]` inside an attribute value ends the span early
//!   (`[gallery title="a]b" ids="1"]` loses its `ids`);
//! - the token is a prefix, so `[gallery-pro ...]` also matches;
//! - a token with no `]` anywhere after it ends the scan.
//!
//! ## Positions
//!
//! Every span gets a position, including spans without an `ids` attribute.
//! Bulk import and render-time conversion both count this way, so a
//! gallery created by one is found again by the other.
//!
//! ## Override attribute
//!
//! `mod="…"` forces or suppresses render-time conversion of one shortcode.
//! See [`Override`].

use std::collections::BTreeMap;

/// One token-to-bracket span found in a content body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcodeSpan<'a> {
    /// 0-based index in document order.
    pub position: usize,
    /// Byte offset of the token in the body.
    pub start: usize,
    /// The span itself, token and closing bracket included.
    pub text: &'a str,
}

impl ShortcodeSpan<'_> {
    /// Raw `ids` attribute of this span.
    pub fn ids(&self) -> Option<&str> {
        extract_ids(self.text)
    }
}

/// Find every occurrence of `token` and the span it opens.
///
/// The token is matched literally and case-sensitively.
pub fn scan_shortcodes<'a>(body: &'a str, token: &str) -> Vec<ShortcodeSpan<'a>> {
    let mut spans = Vec::new();
    if token.is_empty() {
        return spans;
    }
    let mut cursor = 0;
    while let Some(found) = body[cursor..].find(token) {
        let start = cursor + found;
        let after_token = start + token.len();
        let Some(close) = body[after_token..].find(']') else {
            break;
        };
        let end = after_token + close + 1;
        spans.push(ShortcodeSpan {
            position: spans.len(),
            start,
            text: &body[start..end],
        });
        cursor = end;
    }
    spans
}

/// Extract the raw value of the `ids="…"` attribute.
///
/// Accepts whitespace around `=`, requires double quotes, and stops at the
/// first closing quote. The value is returned untouched; use
/// [`normalize_ids`] before comparing or splitting. Any text ending in `ids`
/// qualifies as the attribute name, so `xids="…"` matches too.
pub fn extract_ids(span: &str) -> Option<&str> {
    let mut from = 0;
    while let Some(found) = span[from..].find("ids") {
        let name_end = from + found + "ids".len();
        if let Some(value) = quoted_value_after(&span[name_end..]) {
            return Some(value);
        }
        from += found + 1;
    }
    None
}

fn quoted_value_after(rest: &str) -> Option<&str> {
    let rest = rest.trim_start_matches(char::is_whitespace);
    let rest = rest.strip_prefix('=')?;
    let rest = rest.trim_start_matches(char::is_whitespace);
    let rest = rest.strip_prefix('"')?;
    let close = rest.find('"')?;
    Some(&rest[..close])
}

/// Remove all whitespace from an id list: `" 1, 2,3 "` → `"1,2,3"`.
pub fn normalize_ids(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Split an id list into its non-empty entries, whitespace removed.
pub fn split_ids(raw: &str) -> Vec<String> {
    normalize_ids(raw)
        .split(',')
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect()
}

/// Per-shortcode override of the global conversion switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Override {
    /// Convert regardless of the global switch.
    Convert,
    /// Never convert this shortcode.
    Keep,
    /// Follow the global switch.
    Unset,
}

const AFFIRMATIVE: &[&str] = &["yes", "ja", "1", "true", "y", "j"];
const NEGATIVE: &[&str] = &["no", "nein", "0", "false", "n"];

impl Override {
    /// Interpret an attribute value, ignoring case and surrounding whitespace.
    pub fn parse(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return Override::Unset;
        };
        let value = value.trim().to_lowercase();
        if AFFIRMATIVE.contains(&value.as_str()) {
            Override::Convert
        } else if NEGATIVE.contains(&value.as_str()) {
            Override::Keep
        } else {
            Override::Unset
        }
    }

    /// Conversion decision given the global auto-convert switch.
    pub fn should_convert(self, auto_convert: bool) -> bool {
        match self {
            Override::Convert => true,
            Override::Keep => false,
            Override::Unset => auto_convert,
        }
    }
}

/// Name of the override attribute.
pub const OVERRIDE_ATTRIBUTE: &str = "mod";

/// Read the override attribute straight from a raw span.
pub fn extract_override(span: &str) -> Override {
    let attrs = parse_shortcode(span).map(|s| s.attrs).unwrap_or_default();
    Override::parse(attrs.get(OVERRIDE_ATTRIBUTE).map(String::as_str))
}

// ============================================================================
// Generic shortcode grammar (host dispatcher side)
// ============================================================================

/// Shortcode attributes. Named attributes are keyed by lower-cased name;
/// bare values are keyed by their index among bare values (`"0"`, `"1"`, ...).
pub type Attributes = BTreeMap<String, String>;

/// A parsed self-closing shortcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcode {
    pub tag: String,
    pub attrs: Attributes,
}

/// Parse `[tag attr="v" ...]`. Returns `None` if the text is not a shortcode.
pub fn parse_shortcode(span: &str) -> Option<Shortcode> {
    let inner = span.strip_prefix('[')?.strip_suffix(']')?;
    let inner = inner.strip_suffix('/').unwrap_or(inner);
    let tag_end = inner.find(char::is_whitespace).unwrap_or(inner.len());
    let tag = &inner[..tag_end];
    let valid_tag = !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid_tag {
        return None;
    }
    Some(Shortcode {
        tag: tag.to_string(),
        attrs: parse_attributes(&inner[tag_end..]),
    })
}

/// Parse an attribute list: `name="v"`, `name='v'`, `name=v`, or bare values.
pub fn parse_attributes(text: &str) -> Attributes {
    let mut attrs = Attributes::new();
    let mut positional = 0usize;
    let mut rest = text.trim_start();

    while let Some(first) = rest.chars().next() {
        if first == '"' || first == '\'' {
            let (value, tail) = take_quoted(&rest[1..], first);
            attrs.insert(positional.to_string(), value.to_string());
            positional += 1;
            rest = tail;
        } else {
            let word_end = rest
                .find(|c: char| c.is_whitespace() || c == '=')
                .unwrap_or(rest.len());
            let word = &rest[..word_end];
            let after = rest[word_end..].trim_start();
            if let Some(after_eq) = after.strip_prefix('=') {
                let after_eq = after_eq.trim_start();
                let (value, tail) = match after_eq.chars().next() {
                    Some(q @ ('"' | '\'')) => take_quoted(&after_eq[1..], q),
                    _ => {
                        let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
                        (&after_eq[..end], &after_eq[end..])
                    }
                };
                if !word.is_empty() {
                    attrs.insert(word.to_lowercase(), value.to_string());
                }
                rest = tail;
            } else {
                attrs.insert(positional.to_string(), word.to_string());
                positional += 1;
                rest = &rest[word_end..];
            }
        }
        rest = rest.trim_start();
    }
    attrs
}

/// Split at the closing quote; an unterminated quote runs to the end.
fn take_quoted(text: &str, quote: char) -> (&str, &str) {
    match text.find(quote) {
        Some(end) => (&text[..end], &text[end + quote.len_utf8()..]),
        None => (text, ""),
    }
}

/// A piece of content as seen by the render pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Shortcode { raw: &'a str, shortcode: Shortcode },
    /// `[[tag ...]]`: printed as `[tag ...]`, never expanded.
    Escaped(&'a str),
}

/// Split content into text and shortcodes of any tag.
pub fn tokenize(body: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut cursor = 0;

    while let Some(found) = body[cursor..].find('[') {
        let open = cursor + found;

        if body[open + 1..].starts_with('[')
            && let Some(close) = body[open..].find("]]")
        {
            let close = open + close;
            if open > text_start {
                segments.push(Segment::Text(&body[text_start..open]));
            }
            segments.push(Segment::Escaped(&body[open + 1..close + 1]));
            cursor = close + 2;
            text_start = cursor;
            continue;
        }

        let Some(close) = body[open..].find(']') else {
            break;
        };
        let end = open + close + 1;
        match parse_shortcode(&body[open..end]) {
            Some(shortcode) => {
                if open > text_start {
                    segments.push(Segment::Text(&body[text_start..open]));
                }
                segments.push(Segment::Shortcode {
                    raw: &body[open..end],
                    shortcode,
                });
                cursor = end;
                text_start = end;
            }
            None => cursor = open + 1,
        }
    }

    if text_start < body.len() {
        segments.push(Segment::Text(&body[text_start..]));
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // scan_shortcodes
    // =========================================================================

    #[test]
    fn scan_two_galleries_in_order() {
        let body = r#"[gallery ids="1,2,3"] text [gallery ids="4,5"]"#;
        let spans = scan_shortcodes(body, "[gallery");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].position, 0);
        assert_eq!(spans[1].position, 1);
        assert_eq!(spans[0].ids(), Some("1,2,3"));
        assert_eq!(spans[1].ids(), Some("4,5"));
    }

    #[test]
    fn scan_returns_one_span_per_token() {
        for n in 0..6 {
            let body: String = (0..n)
                .map(|i| format!("<p>para {i}</p>[gallery ids=\"{i}\"]\n"))
                .collect();
            let spans = scan_shortcodes(&body, "[gallery");
            assert_eq!(spans.len(), n);
            let positions: Vec<usize> = spans.iter().map(|s| s.position).collect();
            assert_eq!(positions, (0..n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn scan_without_token_is_empty() {
        assert!(scan_shortcodes("just text [caption]", "[gallery").is_empty());
        assert!(scan_shortcodes("", "[gallery").is_empty());
    }

    #[test]
    fn scan_stops_at_first_close_bracket() {
        let body = r#"[gallery title="a]b" ids="1"]"#;
        let spans = scan_shortcodes(body, "[gallery");
        assert_eq!(spans[0].text, r#"[gallery title="a]"#);
        assert_eq!(spans[0].ids(), None);
    }

    #[test]
    fn scan_is_case_sensitive() {
        assert!(scan_shortcodes(r#"[Gallery ids="1"]"#, "[gallery").is_empty());
    }

    #[test]
    fn scan_treats_token_literally() {
        let body = r#"[g.llery ids="1"] [gallery ids="2"]"#;
        let spans = scan_shortcodes(body, "[g.llery");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].ids(), Some("1"));
    }

    #[test]
    fn scan_unterminated_token_ends_scan() {
        let body = r#"[gallery ids="1"] and [gallery ids="2""#;
        let spans = scan_shortcodes(body, "[gallery");
        assert_eq!(spans.len(), 1);
    }

    #[test]
    fn scan_span_can_cross_lines() {
        let body = "[gallery\n  ids=\"7,8\"\n]";
        let spans = scan_shortcodes(body, "[gallery");
        assert_eq!(spans[0].ids(), Some("7,8"));
        assert_eq!(spans[0].start, 0);
    }

    // =========================================================================
    // extract_ids
    // =========================================================================

    #[test]
    fn extract_ids_keeps_whitespace() {
        assert_eq!(
            extract_ids(r#"[gallery ids = " 1, 2 ,3"]"#),
            Some(" 1, 2 ,3")
        );
    }

    #[test]
    fn extract_ids_absent() {
        assert_eq!(extract_ids(r#"[gallery columns="3"]"#), None);
        assert_eq!(extract_ids(r#"[gallery ids=1,2]"#), None);
    }

    #[test]
    fn extract_ids_skips_non_attribute_occurrences() {
        assert_eq!(
            extract_ids(r#"[gallery link="ids" ids="5"]"#),
            Some("5")
        );
    }

    #[test]
    fn extract_ids_empty_value() {
        assert_eq!(extract_ids(r#"[gallery ids=""]"#), Some(""));
    }

    #[test]
    fn split_ids_drops_empty_entries() {
        assert_eq!(split_ids(" 1, 2,,3 ,"), vec!["1", "2", "3"]);
        assert!(split_ids("  ").is_empty());
    }

    // =========================================================================
    // Override
    // =========================================================================

    #[test]
    fn override_vocabulary() {
        for yes in ["yes", "ja", "1", "true", "y", "j"] {
            assert_eq!(Override::parse(Some(yes)), Override::Convert, "{yes}");
        }
        for no in ["no", "nein", "0", "false", "n"] {
            assert_eq!(Override::parse(Some(no)), Override::Keep, "{no}");
        }
        assert_eq!(Override::parse(Some("maybe")), Override::Unset);
        assert_eq!(Override::parse(Some("")), Override::Unset);
        assert_eq!(Override::parse(None), Override::Unset);
    }

    #[test]
    fn override_ignores_case_and_whitespace() {
        assert_eq!(Override::parse(Some("YES")), Override::Convert);
        assert_eq!(Override::parse(Some(" yes ")), Override::Convert);
        assert_eq!(Override::parse(Some(" Nein\t")), Override::Keep);
    }

    #[test]
    fn override_decision_table() {
        assert!(Override::Convert.should_convert(false));
        assert!(!Override::Keep.should_convert(true));
        assert!(Override::Unset.should_convert(true));
        assert!(!Override::Unset.should_convert(false));
    }

    #[test]
    fn extract_override_from_span() {
        assert_eq!(
            extract_override(r#"[gallery ids="1" mod="YES"]"#),
            Override::Convert
        );
        assert_eq!(extract_override(r#"[gallery ids="1"]"#), Override::Unset);
    }

    // =========================================================================
    // Generic grammar
    // =========================================================================

    #[test]
    fn parse_attributes_all_forms() {
        let attrs = parse_attributes(r#" IDS="1,2" link='file' columns=3 bare "quoted""#);
        assert_eq!(attrs["ids"], "1,2");
        assert_eq!(attrs["link"], "file");
        assert_eq!(attrs["columns"], "3");
        assert_eq!(attrs["0"], "bare");
        assert_eq!(attrs["1"], "quoted");
    }

    #[test]
    fn parse_attributes_unterminated_quote() {
        let attrs = parse_attributes(r#"ids="1,2"#);
        assert_eq!(attrs["ids"], "1,2");
    }

    #[test]
    fn parse_shortcode_self_closing() {
        let sc = parse_shortcode(r#"[modula id="4" /]"#).unwrap();
        assert_eq!(sc.tag, "modula");
        assert_eq!(sc.attrs["id"], "4");
    }

    #[test]
    fn parse_shortcode_rejects_non_tags() {
        assert!(parse_shortcode("[ ]").is_none());
        assert!(parse_shortcode("[a+b]").is_none());
        assert!(parse_shortcode("gallery]").is_none());
    }

    #[test]
    fn tokenize_mixed_content() {
        let body = r#"<p>Hi</p>[gallery ids="1"] [1+1] [[modula id="2"]] end"#;
        let segments = tokenize(body);
        assert_eq!(segments[0], Segment::Text("<p>Hi</p>"));
        assert!(matches!(
            &segments[1],
            Segment::Shortcode { shortcode, .. } if shortcode.tag == "gallery"
        ));
        assert_eq!(segments[2], Segment::Text(" [1+1] "));
        assert_eq!(segments[3], Segment::Escaped(r#"[modula id="2"]"#));
        assert_eq!(segments[4], Segment::Text(" end"));
    }

    #[test]
    fn tokenize_plain_text() {
        assert_eq!(tokenize("no codes"), vec![Segment::Text("no codes")]);
        assert!(tokenize("").is_empty());
    }
}
