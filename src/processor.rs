//! Reducing a bibliography to the cited entries.
//!
//! The source database is only read; the result is a fresh database that
//! carries the source's preambles and string variables plus the entries of
//! the keys that resolved.

use tracing::debug;

use crate::bib::Database;
use crate::cites::CitationKey;

/// Result of filtering a database by a sequence of citation keys.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    /// The reduced database, entries in citation order
    pub database: Database,
    /// Keys with no entry in the source database, in citation order
    pub missing: Vec<CitationKey>,
}

/// Builds a database holding exactly the entries cited by `keys`.
///
/// Entries appear in the order of `keys`, not in source order. Keys are
/// expected to be distinct; an entry is appended once per occurrence.
///
/// # Examples
///
/// ```
/// use bibtrim::{filter_database, parse_bib, CitationKey};
///
/// let source = parse_bib("@misc{X, note = {x}} @misc{Y, note = {y}}").unwrap();
/// let keys: Vec<CitationKey> = ["Y", "Z", "X"]
///     .iter()
///     .filter_map(|k| CitationKey::normalize(k))
///     .collect();
///
/// let outcome = filter_database(&source, &keys);
/// let cited: Vec<&str> = outcome.database.entries().iter().map(|e| e.key.as_str()).collect();
/// assert_eq!(cited, ["Y", "X"]);
/// assert_eq!(outcome.missing[0].as_str(), "Z");
/// ```
pub fn filter_database<'k, I>(source: &Database, keys: I) -> FilterOutcome
where
    I: IntoIterator<Item = &'k CitationKey>,
{
    let mut database = Database::with_metadata_of(source);
    let mut missing = Vec::new();

    for key in keys {
        match source.lookup(key.as_str()) {
            Some(entry) => {
                debug!(key = %key, kind = %entry.kind, "resolved citation");
                database.push_entry(entry.clone());
            }
            None => {
                debug!(key = %key, "citation not in bibliography");
                missing.push(key.clone());
            }
        }
    }

    FilterOutcome { database, missing }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bib::{Entry, Value};
    use std::collections::HashSet;

    fn key(raw: &str) -> CitationKey {
        CitationKey::normalize(raw).unwrap()
    }

    fn keys(raw: &[&str]) -> Vec<CitationKey> {
        raw.iter().map(|k| key(k)).collect()
    }

    fn entry_keys(db: &Database) -> Vec<&str> {
        db.entries().iter().map(|e| e.key.as_str()).collect()
    }

    /// Database with entries X and Y plus metadata.
    fn source_db() -> Database {
        let mut db = Database::new();
        db.push_preamble(Value::braced("\\def\\x{}"));
        db.define_string("acm", Value::braced("ACM"));
        db.push_entry(Entry::new("article", "X").with_field("title", Value::braced("Ex")));
        db.push_entry(Entry::new("book", "Y").with_field("title", Value::braced("Why")));
        db
    }

    #[test]
    fn test_filter_follows_citation_order() {
        // Given: a source with X and Y, and the aggregated keys [Y, Z, X]
        let source = source_db();
        let cited = keys(&["Y", "Z", "X"]);

        // When: we filter
        let outcome = filter_database(&source, &cited);

        // Then: entries follow citation order and Z is reported missing
        assert_eq!(entry_keys(&outcome.database), vec!["Y", "X"]);
        assert_eq!(outcome.missing, keys(&["Z"]));
    }

    #[test]
    fn test_filter_copies_metadata_verbatim() {
        let source = source_db();
        let outcome = filter_database(&source, &keys(&["Z"]));

        // Metadata is kept even when no entry survives
        assert!(outcome.database.is_empty());
        assert_eq!(outcome.database.preambles(), source.preambles());
        assert_eq!(
            outcome.database.string_variables(),
            source.string_variables()
        );
    }

    #[test]
    fn test_filter_with_every_source_key_reproduces_entry_set() {
        // Given: every key of the source, in reverse order
        let source = source_db();
        let all = keys(&["Y", "X"]);

        // When: we filter
        let outcome = filter_database(&source, &all);

        // Then: same entry set, nothing missing
        assert!(outcome.missing.is_empty());
        let expected: HashSet<&Entry> = source.entries().iter().collect();
        let actual: HashSet<&Entry> = outcome.database.entries().iter().collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_filter_does_not_touch_source() {
        let source = source_db();
        let before = source.render();

        let outcome = filter_database(&source, &keys(&["X"]));

        assert_eq!(source.render(), before);
        assert_eq!(outcome.missing.len(), 1);
    }

    #[test]
    fn test_filter_no_keys() {
        let outcome = filter_database(&source_db(), &Vec::<CitationKey>::new());
        assert!(outcome.database.is_empty());
        assert!(outcome.missing.is_empty());
    }

    #[test]
    fn test_filter_is_case_sensitive() {
        let outcome = filter_database(&source_db(), &keys(&["x"]));
        assert!(outcome.database.is_empty());
        assert_eq!(outcome.missing, keys(&["x"]));
    }
}
