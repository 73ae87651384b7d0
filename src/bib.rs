//! In-memory BibTeX database.
//!
//! Values are stored unexpanded: a string-variable reference stays a
//! reference and `#` concatenations keep their pieces, so rendering writes
//! back what the source meant without resolving `@string` macros.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;

/// How a literal piece of a value was delimited in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    /// `{...}`
    Braces,
    /// `"..."`
    Quotes,
    /// Undelimited number, e.g. `year = 2020`
    Bare,
}

/// One operand of a `#` concatenation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Piece {
    Literal { text: String, delimiter: Delimiter },
    Variable { name: String },
}

/// A field, preamble or string-variable value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Value {
    pieces: Vec<Piece>,
}

impl Value {
    pub fn new(pieces: Vec<Piece>) -> Self {
        Value { pieces }
    }

    /// A single braced literal.
    pub fn braced(text: impl Into<String>) -> Self {
        Value::new(vec![Piece::Literal {
            text: text.into(),
            delimiter: Delimiter::Braces,
        }])
    }

    /// Literal text of a value made of literals only.
    ///
    /// Returns `None` when the value references a string variable.
    pub fn as_literal(&self) -> Option<String> {
        self.pieces
            .iter()
            .map(|piece| match piece {
                Piece::Literal { text, .. } => Some(text.as_str()),
                Piece::Variable { .. } => None,
            })
            .collect()
    }

    /// Renders the value in BibTeX syntax.
    pub fn render(&self) -> String {
        let parts: Vec<String> = self
            .pieces
            .iter()
            .map(|piece| match piece {
                Piece::Literal {
                    text,
                    delimiter: Delimiter::Braces,
                } => format!("{{{}}}", text),
                Piece::Literal {
                    text,
                    delimiter: Delimiter::Quotes,
                } => format!("\"{}\"", text),
                Piece::Literal {
                    text,
                    delimiter: Delimiter::Bare,
                } => text.clone(),
                Piece::Variable { name } => name.clone(),
            })
            .collect();
        parts.join(" # ")
    }
}

/// A `name = value` pair of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Field {
    pub name: String,
    pub value: Value,
}

/// A bibliographic entry such as `@article{key, ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Entry {
    /// Entry type, lowercased (e.g. "article")
    pub kind: String,
    /// Citation key as written in the source
    pub key: String,
    /// Fields in source order, names lowercased
    pub fields: Vec<Field>,
}

impl Entry {
    pub fn new(kind: impl Into<String>, key: impl Into<String>) -> Self {
        Entry {
            kind: kind.into(),
            key: key.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field (builder style).
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.push(Field {
            name: name.into(),
            value,
        });
        self
    }

    /// Value of the first field called `name` (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| &f.value)
    }

    /// Renders the entry with field names aligned.
    pub fn render(&self) -> String {
        let mut out = format!("@{}{{{}", self.kind, self.key);
        let width = self.fields.iter().map(|f| f.name.len()).max().unwrap_or(0);

        for field in &self.fields {
            out.push_str(",\n");
            out.push_str(&format!(
                "  {:<width$} = {}",
                field.name,
                field.value.render(),
                width = width
            ));
        }

        if self.fields.is_empty() {
            out.push(',');
        }
        out.push_str("\n}");
        out
    }
}

/// A parsed BibTeX database.
#[derive(Debug, Clone, Default)]
pub struct Database {
    preambles: Vec<Value>,
    strings: IndexMap<String, Value>,
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty database carrying the preambles and string variables of
    /// `source`, copied verbatim.
    pub fn with_metadata_of(source: &Database) -> Self {
        Database {
            preambles: source.preambles.clone(),
            strings: source.strings.clone(),
            ..Database::default()
        }
    }

    pub fn preambles(&self) -> &[Value] {
        &self.preambles
    }

    /// `@string` variables in definition order.
    pub fn string_variables(&self) -> &IndexMap<String, Value> {
        &self.strings
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push_preamble(&mut self, value: Value) {
        self.preambles.push(value);
    }

    /// Defines a string variable. A later definition replaces the value but
    /// keeps the original position.
    pub fn define_string(&mut self, name: impl Into<String>, value: Value) {
        self.strings.insert(name.into(), value);
    }

    /// Appends an entry. Entries sharing a key are all kept; lookups resolve
    /// to the first one.
    pub fn push_entry(&mut self, entry: Entry) {
        self.index
            .entry(entry.key.clone())
            .or_insert(self.entries.len());
        self.entries.push(entry);
    }

    /// Exact, case-sensitive lookup by citation key.
    pub fn lookup(&self, key: &str) -> Option<&Entry> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    /// Renders the whole database in canonical BibTeX form.
    pub fn render(&self) -> String {
        let mut out = String::new();

        for preamble in &self.preambles {
            out.push_str(&format!("@preamble{{{}}}\n", preamble.render()));
        }
        for (name, value) in &self.strings {
            out.push_str(&format!("@string{{{} = {}}}\n", name, value.render()));
        }

        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 || !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&entry.render());
            out.push('\n');
        }

        out
    }
}
