//! Source markup → comparable text.

use htmd::Element;
use htmd::options::{
    BrStyle,
    BulletListMarker,
    Options,
};

/// Converts a key's raw source markup into the text form the visual editor
/// stores in a leaf block's source field.
pub trait MarkupConverter {
    /// Must be deterministic: the same input always yields the same output.
    fn convert(&self, raw: &str) -> String;
}

/// Marker around `<em>` and `<i>` content.
const EMPHASIS_DELIMITER: &str = "*";

/// Indentation htmd gives to the continuation lines of a list item.
const ITEM_INDENT: &str = "    ";

/// HTML → Markdown, the form the visual editor writes into content blocks.
///
/// Emphasis is written `*x*` and list markers are followed by one space
/// (`* item`, `1. item`), matching the editor's Markdown.
pub struct HtmlToMarkdown {
    converter: htmd::HtmlToMarkdown,
}

impl HtmlToMarkdown {
    #[must_use]
    pub fn new() -> Self {
        let converter = htmd::HtmlToMarkdown::builder()
            .options(Options {
                br_style: BrStyle::TwoSpaces,
                bullet_list_marker: BulletListMarker::Asterisk,
                ..Options::default()
            })
            .add_handler(vec!["em", "i"], emphasis_handler)
            .add_handler(vec!["ul", "ol"], list_handler)
            .build();
        Self { converter }
    }
}

impl Default for HtmlToMarkdown {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HtmlToMarkdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlToMarkdown").finish_non_exhaustive()
    }
}

impl MarkupConverter for HtmlToMarkdown {
    fn convert(&self, raw: &str) -> String {
        match self.converter.convert(raw.trim()) {
            Ok(markdown) => markdown,
            Err(e) => {
                tracing::warn!("Failed to convert markup to markdown, using raw text: {e}");
                raw.to_string()
            }
        }
    }
}

/// `*content*`, whitespace kept outside the markers. Empty emphasis is dropped.
fn emphasis_handler(element: Element<'_>) -> Option<String> {
    let content = element.content;
    let inner = content.trim();
    if inner.is_empty() {
        return None;
    }
    let leading = content.strip_suffix(content.trim_start()).unwrap_or_default();
    let trailing = content.strip_prefix(content.trim_end()).unwrap_or_default();
    Some(format!("{leading}{EMPHASIS_DELIMITER}{inner}{EMPHASIS_DELIMITER}{trailing}"))
}

/// Rewrites the items htmd rendered (`*   item`, `1.  item`) with a single
/// space after the marker and continuation lines indented to match.
fn list_handler(element: Element<'_>) -> Option<String> {
    let ordered = element.tag == "ol";
    let body = element.content.trim_matches('\n');
    if body.is_empty() {
        return None;
    }
    let lines: Vec<String> = body.lines().map(|line| tighten_list_line(line, ordered)).collect();
    Some(format!("\n{}\n", lines.join("\n")))
}

fn tighten_list_line(line: &str, ordered: bool) -> String {
    if let Some(rest) = line.strip_prefix(ITEM_INDENT) {
        let indent = if ordered { "   " } else { "  " };
        return format!("{indent}{rest}");
    }
    if ordered {
        let rest = line.trim_start_matches(|ch: char| ch.is_ascii_digit());
        if let Some(number) = line.strip_suffix(rest)
            && !number.is_empty()
            && let Some(item) = rest.strip_prefix(".  ")
        {
            return format!("{number}. {item}");
        }
    } else if let Some(item) = line.strip_prefix("*   ") {
        return format!("* {item}");
    }
    line.to_string()
}

/// Leaves text untouched. Useful when the registry already stores plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainText;

impl MarkupConverter for PlainText {
    fn convert(&self, raw: &str) -> String {
        raw.to_string()
    }
}

/// Normalization applied to both sides of a source comparison:
/// CRLF/CR become LF and surrounding whitespace is trimmed.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}
