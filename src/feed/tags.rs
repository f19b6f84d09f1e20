//! Hashtag extraction

use lazy_static::lazy_static;
use regex::Regex;

/// Leading marker of every tag
pub const TAG_MARKER: char = '#';

/// Longest tag kept, marker included
pub const MAX_TAG_CHARS: usize = 26;

lazy_static! {
    // Marker, a letter, word characters, and an alphanumeric final run. The
    // leading whitespace anchors a tag to the start of a token. Every class
    // is Unicode-aware, including the final run.
    static ref TAG_PATTERN: Regex =
        Regex::new(r"\s(#\p{L}\w+[\p{Alphabetic}\p{N}]+)\b").expect("tag pattern compiles");
}

/// Extract the tags embedded in a post body, in order of appearance.
///
/// Repeated tags are returned once per occurrence.
pub fn extract(body: &str) -> Vec<String> {
    let padded;
    let haystack = if body.starts_with(TAG_MARKER) {
        padded = format!(" {body}");
        padded.as_str()
    } else {
        body
    };

    TAG_PATTERN
        .captures_iter(haystack)
        .filter_map(|captures| captures.get(1))
        .map(|tag| tag.as_str())
        .filter(|tag| is_valid(tag))
        .map(str::to_string)
        .collect()
}

/// Whether an already-matched tag may be stored.
fn is_valid(tag: &str) -> bool {
    tag.chars().count() <= MAX_TAG_CHARS && !tag.contains("__")
}
