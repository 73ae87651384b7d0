//! BibTeX bibliography loading.
//!
//! Parses `.bib` sources into a [`Database`]. Text outside of `@` records
//! is ignored, `@comment` records are skipped, `@preamble` and `@string`
//! records are kept as database metadata.

use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::bib::{Database, Delimiter, Entry, Field, Piece, Value};

/// Errors that can occur when loading a bibliography.
#[derive(Error, Debug)]
pub enum RefsError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid BibTeX at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },
}

/// Loads and parses a BibTeX file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid BibTeX.
pub fn load_bib(path: &Path) -> Result<Database, RefsError> {
    let content = fs::read_to_string(path)?;
    let database = parse_bib(&content)?;
    debug!(
        path = %path.display(),
        entries = database.len(),
        strings = database.string_variables().len(),
        preambles = database.preambles().len(),
        "loaded bibliography"
    );
    Ok(database)
}

/// Parses BibTeX source text.
///
/// # Examples
///
/// ```
/// use bibtrim::parse_bib;
///
/// let db = parse_bib("@book{knuth84, title = {The TeXbook}, year = 1984}").unwrap();
/// assert_eq!(db.len(), 1);
/// assert!(db.lookup("knuth84").is_some());
/// ```
pub fn parse_bib(source: &str) -> Result<Database, RefsError> {
    Parser::new(source).parse()
}

/// Bytes that end an identifier (record type, field or variable name).
fn is_ident_byte(b: u8) -> bool {
    !b.is_ascii_whitespace()
        && !matches!(
            b,
            b'{' | b'}' | b'(' | b')' | b',' | b'=' | b'"' | b'#' | b'@' | b'%' | b'\''
        )
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Parser {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    fn parse(mut self) -> Result<Database, RefsError> {
        let mut db = Database::new();

        while let Some(offset) = self.src[self.pos..].find('@') {
            self.pos += offset + 1;
            self.skip_ws();
            let kind = self.identifier().to_ascii_lowercase();
            self.skip_ws();

            let (open, close) = match self.peek() {
                Some(b'{') => (b'{', b'}'),
                Some(b'(') => (b'(', b')'),
                // A stray `@` in free text, e.g. an e-mail address.
                _ => continue,
            };
            if kind.is_empty() {
                continue;
            }
            self.pos += 1;

            match kind.as_str() {
                "comment" => self.skip_balanced(open, close)?,
                "preamble" => {
                    self.skip_ws();
                    let value = self.value()?;
                    self.skip_ws();
                    self.expect(close)?;
                    db.push_preamble(value);
                }
                "string" => {
                    self.skip_ws();
                    let name = self.identifier();
                    if name.is_empty() {
                        return Err(self.error("expected a string variable name"));
                    }
                    self.skip_ws();
                    self.expect(b'=')?;
                    self.skip_ws();
                    let value = self.value()?;
                    self.skip_ws();
                    self.expect(close)?;
                    db.define_string(name, value);
                }
                _ => {
                    let entry = self.entry(&kind, close)?;
                    db.push_entry(entry);
                }
            }
        }

        Ok(db)
    }

    fn entry(&mut self, kind: &str, close: u8) -> Result<Entry, RefsError> {
        self.skip_ws();
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b',' || b == close || b == b'{' || b == b'}' || b.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
        let key = &self.src[start..self.pos];
        if key.is_empty() {
            return Err(self.error("missing citation key"));
        }
        let mut entry = Entry::new(kind, key);

        loop {
            self.skip_ws();
            match self.peek() {
                Some(b) if b == close => {
                    self.pos += 1;
                    return Ok(entry);
                }
                Some(b',') => {
                    self.pos += 1;
                    self.skip_ws();
                    if self.peek() == Some(close) {
                        continue;
                    }
                    let name = self.identifier().to_ascii_lowercase();
                    if name.is_empty() {
                        return Err(self.error("expected a field name"));
                    }
                    self.skip_ws();
                    self.expect(b'=')?;
                    self.skip_ws();
                    let value = self.value()?;
                    entry.fields.push(Field { name, value });
                }
                Some(_) => {
                    return Err(self.error(&format!(
                        "expected ',' or '{}' in entry '{}'",
                        close as char, entry.key
                    )))
                }
                None => {
                    return Err(self.error(&format!("unterminated entry '{}'", entry.key)));
                }
            }
        }
    }

    /// Parses `piece (# piece)*`.
    fn value(&mut self) -> Result<Value, RefsError> {
        let mut pieces = vec![self.piece()?];
        loop {
            self.skip_ws();
            if self.peek() != Some(b'#') {
                break;
            }
            self.pos += 1;
            self.skip_ws();
            pieces.push(self.piece()?);
        }
        Ok(Value::new(pieces))
    }

    fn piece(&mut self) -> Result<Piece, RefsError> {
        match self.peek() {
            Some(b'{') => {
                let open_at = self.pos;
                self.pos += 1;
                let start = self.pos;
                let mut depth = 1usize;
                while let Some(b) = self.peek() {
                    match b {
                        b'{' => depth += 1,
                        b'}' => {
                            depth -= 1;
                            if depth == 0 {
                                let text = self.src[start..self.pos].to_string();
                                self.pos += 1;
                                return Ok(Piece::Literal {
                                    text,
                                    delimiter: Delimiter::Braces,
                                });
                            }
                        }
                        _ => {}
                    }
                    self.pos += 1;
                }
                Err(self.error_at(open_at, "unbalanced braces in value"))
            }
            Some(b'"') => {
                let open_at = self.pos;
                self.pos += 1;
                let start = self.pos;
                let mut depth = 0usize;
                while let Some(b) = self.peek() {
                    match b {
                        b'{' => depth += 1,
                        b'}' => depth = depth.saturating_sub(1),
                        b'"' if depth == 0 => {
                            let text = self.src[start..self.pos].to_string();
                            self.pos += 1;
                            return Ok(Piece::Literal {
                                text,
                                delimiter: Delimiter::Quotes,
                            });
                        }
                        _ => {}
                    }
                    self.pos += 1;
                }
                Err(self.error_at(open_at, "unterminated quoted value"))
            }
            Some(b) if b.is_ascii_digit() => {
                let start = self.pos;
                while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                    self.pos += 1;
                }
                Ok(Piece::Literal {
                    text: self.src[start..self.pos].to_string(),
                    delimiter: Delimiter::Bare,
                })
            }
            _ => {
                let name = self.identifier();
                if name.is_empty() {
                    Err(self.error("expected a value"))
                } else {
                    Ok(Piece::Variable { name })
                }
            }
        }
    }

    /// Skips the body of a record up to its matching closing delimiter.
    fn skip_balanced(&mut self, open: u8, close: u8) -> Result<(), RefsError> {
        let open_at = self.pos - 1;
        let mut depth = 1usize;
        while let Some(b) = self.peek() {
            self.pos += 1;
            if b == open {
                depth += 1;
            } else if b == close {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
        }
        Err(self.error_at(open_at, "unterminated comment"))
    }

    fn identifier(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_byte) {
            self.pos += 1;
        }
        self.src[start..self.pos].to_string()
    }

    fn expect(&mut self, byte: u8) -> Result<(), RefsError> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", byte as char)))
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn error(&self, message: &str) -> RefsError {
        self.error_at(self.pos, message)
    }

    fn error_at(&self, pos: usize, message: &str) -> RefsError {
        let before = &self.src[..pos.min(self.src.len())];
        let line = before.matches('\n').count() + 1;
        let column = before
            .rsplit('\n')
            .next()
            .map_or(0, |last| last.chars().count())
            + 1;
        RefsError::Syntax {
            line,
            column,
            message: message.to_string(),
        }
    }
}
