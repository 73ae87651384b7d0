//! Output generation for a finished run.
//!
//! Renders the diagnostics channel as text, writes the reduced database and
//! optionally a JSON report of the run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::bib::Database;
use crate::pipeline::{Diagnostic, RunReport};

/// Errors that can occur when writing run output.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("cannot write '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot serialize report: {0}")]
    Report(#[from] serde_json::Error),
}

/// Renders diagnostics one per line, in order.
///
/// Returns an empty string when there is nothing to report.
pub fn render_diagnostics(diagnostics: &[Diagnostic]) -> String {
    let mut out = String::new();
    for diagnostic in diagnostics {
        out.push_str(&diagnostic.to_string());
        out.push('\n');
    }
    out
}

/// Writes the rendered database to `path`, replacing any existing file.
pub fn write_database(path: &Path, database: &Database) -> Result<(), OutputError> {
    fs::write(path, database.render()).map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), entries = database.len(), "wrote bibliography");
    Ok(())
}

/// Writes `report` to `path` as pretty-printed JSON.
pub fn write_report(path: &Path, report: &RunReport) -> Result<(), OutputError> {
    let mut json = serde_json::to_string_pretty(report)?;
    json.push('\n');
    fs::write(path, json).map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bib::{Entry, Value};
    use crate::cites::{CitationCounts, CitationKey};
    use tempfile::tempdir;

    fn key(raw: &str) -> CitationKey {
        CitationKey::normalize(raw).unwrap()
    }

    fn sample_report() -> RunReport {
        let mut counts = CitationCounts::new();
        counts.record(vec![key("a"), key("gone")]);

        let mut database = Database::new();
        database.push_entry(Entry::new("misc", "a").with_field("note", Value::braced("x")));

        RunReport {
            database,
            documents_scanned: 1,
            counts: counts.clone(),
            missing: vec![key("gone")],
            diagnostics: vec![
                Diagnostic::Processing {
                    path: PathBuf::from("doc.md"),
                },
                Diagnostic::Cites { counts },
                Diagnostic::UnresolvedKey {
                    key: key("gone"),
                    bibliography: PathBuf::from("all.bib"),
                },
            ],
        }
    }

    // ===========================================
    // Tests for render_diagnostics
    // ===========================================

    #[test]
    fn test_render_diagnostics_in_order() {
        let report = sample_report();

        let text = render_diagnostics(&report.diagnostics);

        assert_eq!(
            text,
            "processing: doc.md\ncites:\n  a: 1\n  gone: 1\nError: Reference key: gone not found in all.bib\n"
        );
    }

    #[test]
    fn test_render_diagnostics_empty() {
        assert_eq!(render_diagnostics(&[]), "");
    }

    // ===========================================
    // Tests for write_database
    // ===========================================

    #[test]
    fn test_write_database() {
        // Given: a reduced database and a scratch directory
        let dir = tempdir().unwrap();
        let path = dir.path().join("references.bib");
        let report = sample_report();

        // When: we write it
        write_database(&path, &report.database).unwrap();

        // Then: the file holds the canonical rendering
        assert_eq!(report.resolved(), 1);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "@misc{a,\n  note = {x}\n}\n"
        );
    }

    #[test]
    fn test_write_database_missing_directory() {
        let path = Path::new("/nonexistent/dir/references.bib");

        let err = write_database(path, &Database::new()).unwrap_err();

        assert!(matches!(err, OutputError::Write { .. }));
        assert!(err.to_string().contains("/nonexistent/dir/references.bib"));
    }

    // ===========================================
    // Tests for write_report
    // ===========================================

    #[test]
    fn test_write_report_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");

        write_report(&path, &sample_report()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["documents_scanned"], 1);
        assert_eq!(json["counts"]["gone"], 1);
        assert_eq!(json["missing"][0], "gone");
        assert_eq!(json["diagnostics"][0]["kind"], "processing");
        assert_eq!(json["diagnostics"].as_array().unwrap().len(), 3);
    }
}
