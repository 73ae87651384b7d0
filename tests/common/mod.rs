//! Shared test constants and helpers for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Source bibliography used across integration tests.
///
/// Holds entries `Smith2020`, `Jones19`, `Lee21` and `unused-1`, plus one
/// preamble and two string variables.
pub const LIBRARY_BIB: &str = r#"% Library of every reference that could be cited.

@preamble{ "\newcommand{\noopsort}[1]{}" }
@string{ jan = "January" }
@string{ acm = {ACM Press} }

@article{Smith2020,
  author  = {John Smith},
  title   = {On {BibTeX} Filtering},
  journal = acm,
  month   = jan,
  year    = 2020
}

@book{Jones19,
  author    = "Ann Jones",
  title     = "Citations at Scale",
  publisher = acm # " Books",
  year      = 2019
}

@inproceedings{Lee21,
  author    = {Kim Lee},
  title     = {Lax Grammars},
  booktitle = {Proceedings},
  year      = 2021
}

@misc{unused-1,
  note = {Never cited}
}
"#;

/// Writes `content` to `dir/name` and returns the full path.
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Keys of the entries of a rendered or parsed database, in order.
pub fn entry_keys(db: &bibtrim::Database) -> Vec<String> {
    db.entries().iter().map(|e| e.key.clone()).collect()
}
