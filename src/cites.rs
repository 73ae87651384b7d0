//! Citation keys and their occurrence counts.
//!
//! Keys are accumulated across every scanned document. The first time a key
//! is seen fixes its position; later occurrences only bump its count.

use std::borrow::Borrow;
use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

/// A normalized citation key such as `Smith2020` or `foo-bar-12`.
///
/// Never empty, never surrounded by whitespace and never ends with the `;`
/// group separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CitationKey(String);

impl CitationKey {
    /// Normalizes a raw token taken from inside a citation marker.
    ///
    /// Surrounding whitespace and a single trailing `;` are removed.
    /// Returns `None` when nothing is left.
    pub fn normalize(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let key = trimmed.strip_suffix(';').unwrap_or(trimmed).trim();
        if key.is_empty() {
            None
        } else {
            Some(CitationKey(key.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CitationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CitationKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CitationKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Insertion-ordered frequency mapping of citation keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CitationCounts {
    counts: IndexMap<CitationKey, usize>,
}

impl CitationCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one occurrence of every key, in order.
    pub fn record<I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = CitationKey>,
    {
        for key in keys {
            self.record_key(key);
        }
    }

    /// Records a single occurrence of `key`.
    pub fn record_key(&mut self, key: CitationKey) {
        *self.counts.entry(key).or_insert(0) += 1;
    }

    /// Distinct keys in first-seen order.
    pub fn all_keys(&self) -> Vec<&CitationKey> {
        self.counts.keys().collect()
    }

    /// Number of recorded occurrences of `key`, zero when never seen.
    pub fn count(&self, key: &str) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Keys with their counts, in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&CitationKey, usize)> {
        self.counts.iter().map(|(key, count)| (key, *count))
    }
}
