//! bibtrim: extract the BibTeX entries cited by a set of Markdown documents.
//!
//! This library provides functionality to:
//! - Scan Markdown lines for citation markers like `[@key]` or `[@a; @b]`
//! - Count the distinct citation keys across documents
//! - Load a BibTeX database and reduce it to the cited entries
//! - Report unresolved keys through a structured diagnostics channel

pub mod bib;
pub mod cites;
pub mod markdown;
pub mod output;
pub mod pipeline;
pub mod processor;
pub mod refs;

pub use bib::{Database, Delimiter, Entry, Field, Piece, Value};
pub use cites::{CitationCounts, CitationKey};
pub use markdown::{scan_line, scan_markers, scan_text, Marker};
pub use output::{render_diagnostics, write_database, write_report, OutputError};
pub use pipeline::{
    find_documents, run, run_dir, scan_document, scan_reader, Diagnostic, PipelineError,
    RunReport, DEFAULT_EXTENSION,
};
pub use processor::{filter_database, FilterOutcome};
pub use refs::{load_bib, parse_bib, RefsError};
