//! Shared utility functions for markdown rendering.

use std::ops::Range;

/// Escape sequence rendered as a non-breaking space.
pub(crate) const NBSP_ESCAPE: &str = "\\ ";

/// Convert a heading text into an anchor slug.
///
/// Alphanumeric characters are lowercased and kept; every run of other
/// characters becomes a single `-`. Leading and trailing separators are dropped.
///
/// # Examples
///
/// ```
/// use mdserve_renderer::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("  What's new in v2.0?  "), "what-s-new-in-v2-0");
/// assert_eq!(slugify("???"), "");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;

    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// Byte offsets in `text` where an unescaped `\ ` begins.
///
/// `range` is the span of `source` the text event was parsed from. Text that
/// no longer matches its source (escapes, entities) yields no offsets.
pub(crate) fn non_breaking_offsets(source: &str, range: Range<usize>, text: &str) -> Vec<usize> {
    let start = range.start;
    if source.get(range) != Some(text) {
        return Vec::new();
    }

    text.match_indices(NBSP_ESCAPE)
        .map(|(offset, _)| offset)
        .filter(|&offset| !is_escaped(source, start + offset))
        .collect()
}

/// Whether the byte at `pos` follows an odd run of backslashes.
fn is_escaped(source: &str, pos: usize) -> bool {
    let run = source.as_bytes()[..pos]
        .iter()
        .rev()
        .take_while(|&&byte| byte == b'\\')
        .count();
    run % 2 == 1
}
