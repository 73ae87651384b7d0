//! Document discovery and the scan → aggregate → filter run.
//!
//! Everything a run produces is returned in a [`RunReport`]: the reduced
//! database, the citation counts, the unresolved keys and an ordered list of
//! [`Diagnostic`] records describing what happened along the way.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::bib::Database;
use crate::cites::{CitationCounts, CitationKey};
use crate::markdown::scan_line;
use crate::processor::filter_database;
use crate::refs::{load_bib, RefsError};

/// Extension scanned when none is configured.
pub const DEFAULT_EXTENSION: &str = "md";

/// Errors that stop a run before any output is produced.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("no input documents found in '{}'", .dir.display())]
    NoDocuments { dir: PathBuf },

    #[error("cannot list directory '{}': {source}", .dir.display())]
    DirectoryUnreadable {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("bibliography '{}' not loaded: {source}", .path.display())]
    Bibliography {
        path: PathBuf,
        #[source]
        source: RefsError,
    },
}

/// One record of the diagnostics channel.
///
/// `Display` renders the line(s) printed for the record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A document is about to be scanned.
    Processing { path: PathBuf },
    /// A document could not be opened or read; it was skipped.
    DocumentUnreadable { path: PathBuf, message: String },
    /// Summary of every key found, in first-seen order.
    Cites { counts: CitationCounts },
    /// A cited key has no entry in the bibliography.
    UnresolvedKey {
        key: CitationKey,
        bibliography: PathBuf,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Processing { path } => write!(f, "processing: {}", path.display()),
            Diagnostic::DocumentUnreadable { path, message } => {
                write!(f, "cannot read {}: {}", path.display(), message)
            }
            Diagnostic::Cites { counts } => {
                write!(f, "cites:")?;
                for (key, count) in counts.iter() {
                    write!(f, "\n  {}: {}", key, count)?;
                }
                Ok(())
            }
            Diagnostic::UnresolvedKey { key, bibliography } => write!(
                f,
                "Error: Reference key: {} not found in {}",
                key,
                bibliography.display()
            ),
        }
    }
}

/// Everything produced by a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// The reduced database, ready to render
    #[serde(skip)]
    pub database: Database,
    /// Number of documents scanned without error
    pub documents_scanned: usize,
    /// Every key found, with its number of occurrences
    pub counts: CitationCounts,
    /// Cited keys with no entry in the bibliography
    pub missing: Vec<CitationKey>,
    /// Ordered diagnostics channel
    pub diagnostics: Vec<Diagnostic>,
}

impl RunReport {
    /// Number of cited keys that resolved to an entry.
    pub fn resolved(&self) -> usize {
        self.database.len()
    }
}

/// Lists the documents of `dir` whose extension is one of `extensions`.
///
/// The listing is not recursive. Directories are skipped; other entries
/// (including dangling links) are kept so that unreadable documents are
/// reported instead of silently ignored. The result is sorted by path.
///
/// # Errors
///
/// Returns [`PipelineError::NoDocuments`] when nothing matches.
pub fn find_documents<S: AsRef<str>>(
    dir: &Path,
    extensions: &[S],
) -> Result<Vec<PathBuf>, PipelineError> {
    let unreadable = |source| PipelineError::DirectoryUnreadable {
        dir: dir.to_path_buf(),
        source,
    };

    let mut documents = Vec::new();
    for entry in fs::read_dir(dir).map_err(unreadable)? {
        let path = entry.map_err(unreadable)?.path();
        if path.is_dir() || !has_extension(&path, extensions) {
            continue;
        }
        documents.push(without_current_dir(path));
    }

    if documents.is_empty() {
        return Err(PipelineError::NoDocuments {
            dir: dir.to_path_buf(),
        });
    }

    documents.sort();
    debug!(dir = %dir.display(), count = documents.len(), "found documents");
    Ok(documents)
}

/// Drops a leading `.` component so `./paper.md` is reported as `paper.md`.
fn without_current_dir(path: PathBuf) -> PathBuf {
    match path.strip_prefix(".") {
        Ok(rest) => rest.to_path_buf(),
        Err(_) => path,
    }
}

fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|wanted| wanted.as_ref().trim_start_matches('.').eq_ignore_ascii_case(ext))
}

/// Scans every line of `reader`, recording the keys found into `counts`.
///
/// Invalid UTF-8 is replaced rather than rejected. Returns the number of
/// key occurrences seen.
pub fn scan_reader<R: BufRead>(mut reader: R, counts: &mut CitationCounts) -> io::Result<usize> {
    let mut buf = Vec::new();
    let mut seen = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let keys = scan_line(&line);
        seen += keys.len();
        counts.record(keys);
    }

    Ok(seen)
}

/// Opens and scans one document. The file is closed before returning.
pub fn scan_document(path: &Path, counts: &mut CitationCounts) -> io::Result<usize> {
    let file = File::open(path)?;
    scan_reader(BufReader::new(file), counts)
}

/// Runs the whole pipeline over `documents`, in the given order.
///
/// The bibliography is loaded first; a bibliography that cannot be read or
/// parsed aborts the run before any document is scanned. A document that
/// cannot be read is reported and skipped.
pub fn run<P: AsRef<Path>>(documents: &[P], bib_path: &Path) -> Result<RunReport, PipelineError> {
    let source = load_bib(bib_path).map_err(|source| PipelineError::Bibliography {
        path: bib_path.to_path_buf(),
        source,
    })?;

    let mut counts = CitationCounts::new();
    let mut diagnostics = Vec::new();
    let mut documents_scanned = 0;

    for document in documents {
        let path = document.as_ref();
        diagnostics.push(Diagnostic::Processing {
            path: path.to_path_buf(),
        });

        match scan_document(path, &mut counts) {
            Ok(seen) => {
                debug!(path = %path.display(), citations = seen, "scanned document");
                documents_scanned += 1;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping document");
                diagnostics.push(Diagnostic::DocumentUnreadable {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
            }
        }
    }

    diagnostics.push(Diagnostic::Cites {
        counts: counts.clone(),
    });

    let outcome = filter_database(&source, counts.all_keys());
    for key in &outcome.missing {
        diagnostics.push(Diagnostic::UnresolvedKey {
            key: key.clone(),
            bibliography: bib_path.to_path_buf(),
        });
    }

    Ok(RunReport {
        database: outcome.database,
        documents_scanned,
        counts,
        missing: outcome.missing,
        diagnostics,
    })
}

/// Discovers the documents of `dir` and runs the pipeline over them.
///
/// Finding no document is fatal and happens before the bibliography is
/// loaded.
pub fn run_dir<S: AsRef<str>>(
    dir: &Path,
    extensions: &[S],
    bib_path: &Path,
) -> Result<RunReport, PipelineError> {
    let documents = find_documents(dir, extensions)?;
    run(&documents, bib_path)
}
