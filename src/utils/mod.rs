//! Utility functions and helpers.

pub mod fs;
pub mod interrupt;
pub mod url;

pub use self::interrupt::{Interrupt, InterruptTrigger};
pub use self::url::{resolve_url, with_params};

use unicode_segmentation::UnicodeSegmentation;

/// Cut `text` to at most `max` user-perceived characters.
pub fn truncate_graphemes(text: &str, max: usize) -> &str {
    match text.grapheme_indices(true).nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Keywords from a comma-delimited list, trimmed, empties dropped.
pub fn parse_keyword_list(list: &str) -> Vec<String> {
    collect_keywords(list.split(','))
}

/// Keywords from a file body, one per line.
pub fn parse_keyword_lines(text: &str) -> Vec<String> {
    collect_keywords(text.lines())
}

fn collect_keywords<'a>(parts: impl Iterator<Item = &'a str>) -> Vec<String> {
    parts
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}
