//! Markdown citation marker scanner.
//!
//! Recognizes bracketed markers such as `[@Smith2020]` and
//! `[@Jones19; @Lee21]` and extracts the citation keys inside them.
//!
//! Matching is line-local: a marker never spans two lines.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::cites::CitationKey;

/// A bracketed span of `@key` groups.
///
/// The grammar is deliberately lax: groups do not need a separator between
/// them, so `[@a@b]` is one marker holding `a` and `b`.
static MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(@([[:alnum:]]+-?)+(;[[:blank:]]+)?)+\]").expect("marker regex is valid")
});

/// A citation marker found in a single line.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Keys inside the marker, in order of appearance (duplicates kept)
    pub keys: Vec<CitationKey>,
    /// Start and end byte positions of the marker within the line
    pub span: (usize, usize),
}

/// Finds every citation marker in `line`.
///
/// # Examples
///
/// ```
/// use bibtrim::scan_markers;
///
/// let markers = scan_markers("See [@a] and [@b; @c].");
/// assert_eq!(markers.len(), 2);
/// assert_eq!(markers[1].keys.len(), 2);
/// ```
pub fn scan_markers(line: &str) -> Vec<Marker> {
    MARKER_RE
        .find_iter(line)
        .filter_map(|m| {
            let keys = marker_keys(m.as_str());
            if keys.is_empty() {
                None
            } else {
                Some(Marker {
                    keys,
                    span: (m.start(), m.end()),
                })
            }
        })
        .collect()
}

/// Extracts the citation keys of every marker in `line`, left to right.
///
/// # Examples
///
/// ```
/// use bibtrim::scan_line;
///
/// let keys = scan_line("See [@Smith2020] and [@Jones19; @Lee21]");
/// let keys: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
/// assert_eq!(keys, ["Smith2020", "Jones19", "Lee21"]);
/// ```
pub fn scan_line(line: &str) -> Vec<CitationKey> {
    scan_markers(line)
        .into_iter()
        .flat_map(|marker| marker.keys)
        .collect()
}

/// Extracts the citation keys of a whole document, line by line.
pub fn scan_text(text: &str) -> Vec<CitationKey> {
    text.lines().flat_map(scan_line).collect()
}

/// Splits the text of a matched marker into normalized keys.
fn marker_keys(marker: &str) -> Vec<CitationKey> {
    // The regex guarantees the surrounding brackets.
    let inner = &marker[1..marker.len() - 1];
    inner.split('@').filter_map(CitationKey::normalize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(line: &str) -> Vec<String> {
        scan_line(line).into_iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_empty_line() {
        assert!(scan_line("").is_empty());
    }

    #[test]
    fn test_no_markers() {
        assert!(scan_line("This is plain text without citations.").is_empty());
        assert!(scan_line("An email: someone@example.com [not a cite]").is_empty());
        assert!(scan_line("A link [text](http://example.com)").is_empty());
    }

    #[test]
    fn test_single_marker() {
        // Given: a line with one citation
        let line = "Results [@Smith2020] show the method works.";

        // When: we scan it
        let markers = scan_markers(line);

        // Then: one marker with the key and its span
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].keys[0].as_str(), "Smith2020");
        let (start, end) = markers[0].span;
        assert_eq!(&line[start..end], "[@Smith2020]");
    }

    #[test]
    fn test_grouped_marker_keeps_order() {
        assert_eq!(
            keys("See [@Smith2020] and [@Jones19; @Lee21]"),
            vec!["Smith2020", "Jones19", "Lee21"]
        );
    }

    #[test]
    fn test_hyphenated_keys() {
        assert_eq!(keys("[@foo-bar-12]"), vec!["foo-bar-12"]);
    }

    #[test]
    fn test_trailing_hyphen_is_accepted() {
        assert_eq!(keys("[@foo-]"), vec!["foo-"]);
    }

    #[test]
    fn test_adjacent_markers_without_separator() {
        assert_eq!(keys("[@A][@B]"), vec!["A", "B"]);
    }

    #[test]
    fn test_concatenated_groups_in_one_marker() {
        // Given: groups with no separator at all
        let markers = scan_markers("[@a@b]");

        // Then: the lax grammar still matches, as a single marker
        assert_eq!(markers.len(), 1);
        let ids: Vec<&str> = markers[0].keys.iter().map(|k| k.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_separator_requires_blank() {
        assert!(keys("[@a;@b]").is_empty());
    }

    #[test]
    fn test_multiple_blanks_after_separator() {
        assert_eq!(keys("[@a;  \t@b]"), vec!["a", "b"]);
    }

    #[test]
    fn test_duplicates_are_preserved() {
        assert_eq!(keys("[@a] then [@a; @a]"), vec!["a", "a", "a"]);
    }

    #[test]
    fn test_keys_with_punctuation_do_not_match() {
        // Colons, slashes and underscores are outside the key alphabet
        assert!(keys("[@doi:10.1234/x]").is_empty());
        assert!(keys("[@snake_case]").is_empty());
    }

    #[test]
    fn test_locators_do_not_match() {
        assert!(keys("[@book-1, p. 42]").is_empty());
    }

    #[test]
    fn test_non_ascii_letters_do_not_match() {
        assert!(keys("[@Müller2020]").is_empty());
        assert_eq!(keys("Les résultats [@item-1] montrent"), vec!["item-1"]);
    }

    #[test]
    fn test_scan_text_is_line_local() {
        // Given: a marker broken across two lines, plus a complete one
        let text = "Start [@a;\n @b] end\nAnd [@c] here.";

        // When: we scan the whole text
        let found: Vec<String> = scan_text(text).into_iter().map(|k| k.to_string()).collect();

        // Then: only the marker contained in one line is found
        assert_eq!(found, vec!["c"]);
    }

    #[test]
    fn test_scan_text_top_to_bottom() {
        let text = "[@b]\n[@a]\n\n[@c; @b]";
        let found: Vec<String> = scan_text(text).into_iter().map(|k| k.to_string()).collect();
        assert_eq!(found, vec!["b", "a", "c", "b"]);
    }
}
