//! CLI for bibtrim - Extract the BibTeX entries cited by Markdown documents.

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bibtrim::{
    render_diagnostics, run_dir, write_database, write_report, OutputError, PipelineError, RunReport,
};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Extract the BibTeX entries cited by Markdown documents
#[derive(Parser)]
#[command(name = "bibtrim")]
#[command(version)]
#[command(after_help = "\
Examples:
  bibtrim -bib ~/library.bib
  bibtrim -dir chapters -bib ~/library.bib -out chapters/references.bib
  bibtrim --bib library.bib --ext md --ext qmd --report cites.json

Citation syntax: [@key], [@a; @b; @c]")]
struct Cli {
    /// Directory containing the documents to scan
    #[arg(long, default_value = "./")]
    dir: PathBuf,

    /// BibTeX file holding every reference that could be cited
    #[arg(long)]
    bib: PathBuf,

    /// Output BibTeX file holding only the cited references
    #[arg(long, default_value = "references.bib")]
    out: PathBuf,

    /// Extension of the documents to scan (repeatable)
    #[arg(long, default_value = bibtrim::DEFAULT_EXTENSION)]
    ext: Vec<String>,

    /// Also write a JSON report of the run to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

/// Long flags that may also be spelled with a single dash (`-bib refs.bib`).
const SINGLE_DASH_FLAGS: &[&str] = &["dir", "bib", "out", "ext", "report", "help", "version"];

/// Rewrites `-bib x` / `-bib=x` into `--bib x` / `--bib=x` for known flags.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .enumerate()
        .map(|(i, arg)| {
            let rewritten = arg
                .to_str()
                .filter(|s| i > 0 && is_single_dash_flag(s))
                .map(|s| OsString::from(format!("-{}", s)));
            rewritten.unwrap_or(arg)
        })
        .collect()
}

fn is_single_dash_flag(arg: &str) -> bool {
    match arg.strip_prefix('-') {
        Some(rest) if !rest.starts_with('-') => {
            let name = rest.split('=').next().unwrap_or(rest);
            SINGLE_DASH_FLAGS.contains(&name)
        }
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// AppError — semantic exit codes
// ---------------------------------------------------------------------------

enum AppError {
    /// Exit 10 — no documents to scan / directory unreadable
    InputFile(String),
    /// Exit 11 — bibliography file not found / invalid
    BibFile(String),
}

impl AppError {
    fn exit_code(&self) -> i32 {
        match self {
            AppError::InputFile(_) => 10,
            AppError::BibFile(_) => 11,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InputFile(msg) => {
                write!(
                    f,
                    "{}\n  hint: documents are matched by extension (see --ext) in the --dir directory",
                    msg
                )
            }
            AppError::BibFile(msg) => {
                write!(
                    f,
                    "{}\n  hint: the file must be a BibTeX database (@article{{key, ...}} records)",
                    msg
                )
            }
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::NoDocuments { .. } | PipelineError::DirectoryUnreadable { .. } => {
                AppError::InputFile(e.to_string())
            }
            PipelineError::Bibliography { .. } => AppError::BibFile(e.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bibtrim=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn run() -> Result<(), AppError> {
    let cli = Cli::parse_from(normalize_args(env::args_os()));

    // 1. Find the documents, load the bibliography, scan and filter
    let report = run_dir(&cli.dir, cli.ext.as_slice(), &cli.bib)?;

    // 2. Print the diagnostics channel
    print!("{}", render_diagnostics(&report.diagnostics));

    // 3. Write the reduced bibliography and the optional JSON report.
    // A failed write is reported and ends the run without confirmation.
    if let Err(e) = write_outputs(&cli, &report) {
        eprintln!("Error: {}", e);
        return Ok(());
    }

    eprintln!(
        "wrote {} reference(s) to {}",
        report.resolved(),
        cli.out.display()
    );

    Ok(())
}

fn write_outputs(cli: &Cli, report: &RunReport) -> Result<(), OutputError> {
    write_database(&cli.out, &report.database)?;
    if let Some(report_path) = &cli.report {
        write_report(report_path, report)?;
    }
    Ok(())
}
