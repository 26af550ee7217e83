use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};
use thiserror::Error;
use tracing::debug;

use crate::cursor::{CursorError, SqliteCursor};
use crate::error::ExportError;
use crate::export::{ExportConfig, ExportSession, ExportSummary, Progress};

/// Where the CSV output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// A file, created or truncated before the export starts.
    File(PathBuf),
    /// Standard output.
    Stdout,
}

impl OutputTarget {
    /// Parses a command-line value; `-` selects standard output.
    pub fn from_arg(value: &str) -> Self {
        if value == "-" {
            OutputTarget::Stdout
        } else {
            OutputTarget::File(PathBuf::from(value))
        }
    }

    /// Whether the output is standard output.
    pub fn is_stdout(&self) -> bool {
        matches!(self, OutputTarget::Stdout)
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputTarget::File(path) => write!(f, "{}", path.display()),
            OutputTarget::Stdout => f.write_str("<stdout>"),
        }
    }
}

/// Everything needed for one query export.
#[derive(Debug, Clone)]
pub struct QueryExportConfig {
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
    /// SQL text of the single query to run.
    pub query: String,
    /// Destination of the CSV output.
    pub output: OutputTarget,
    /// Encoding and buffering settings.
    pub export: ExportConfig,
}

/// Error type for CLI export operations.
#[derive(Error, Debug)]
pub enum CliError {
    /// Generic error message.
    #[error("{0}")]
    Message(String),
    /// The database file does not exist.
    #[error("database {} does not exist", .0.display())]
    MissingDatabase(PathBuf),
    /// SQLite failed to open the database or to prepare the query.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    /// IO error from file operations.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The export itself failed.
    #[error(transparent)]
    Export(#[from] ExportError),
    /// The result cursor could not be created.
    #[error(transparent)]
    Cursor(#[from] CursorError),
}

impl From<&str> for CliError {
    fn from(value: &str) -> Self {
        CliError::Message(value.to_string())
    }
}

impl From<String> for CliError {
    fn from(value: String) -> Self {
        CliError::Message(value)
    }
}

/// Runs `cfg.query` against the database and streams its result as CSV.
///
/// The database is opened read-only and the query is prepared, and rejected
/// unless it is read-only, before the output is created or truncated.
pub fn run_query_export(
    cfg: &QueryExportConfig,
    progress: &mut dyn Progress,
) -> Result<ExportSummary, CliError> {
    if cfg.query.trim().is_empty() {
        return Err("query is empty".into());
    }
    cfg.export.validate()?;
    if !cfg.db_path.exists() {
        return Err(CliError::MissingDatabase(cfg.db_path.clone()));
    }

    let conn = Connection::open_with_flags(
        &cfg.db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_NO_MUTEX
            | OpenFlags::SQLITE_OPEN_URI,
    )?;
    let mut statement = conn.prepare(&cfg.query)?;
    if !statement.readonly() {
        return Err("query must be a read-only statement".into());
    }
    debug!(
        db = %cfg.db_path.display(),
        columns = statement.column_count(),
        "export.query.prepared"
    );

    let summary = match &cfg.output {
        OutputTarget::Stdout => {
            let cursor = SqliteCursor::open(&mut statement)?;
            ExportSession::new(cursor, io::stdout().lock(), cfg.export.clone()).run(progress)?
        }
        OutputTarget::File(path) => {
            let file = create_output(path).map_err(|err| {
                CliError::Message(format!("cannot open output {}: {err}", path.display()))
            })?;
            let cursor = SqliteCursor::open(&mut statement)?;
            ExportSession::new(cursor, file, cfg.export.clone()).run(progress)?
        }
    };
    Ok(summary)
}

fn create_output(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

/// Resolves the query text from exactly one of an inline query or a file.
pub fn load_query(query: Option<&str>, input: Option<&Path>) -> Result<String, CliError> {
    let text = match (query, input) {
        (Some(_), Some(_)) => {
            return Err("use either --query or --input, not both".into());
        }
        (None, None) => return Err("a query is required (use --query or --input)".into()),
        (Some(query), None) => query.to_string(),
        (None, Some(path)) => fs::read_to_string(path).map_err(|err| {
            CliError::Message(format!("cannot read query file {}: {err}", path.display()))
        })?,
    };
    if text.trim().is_empty() {
        return Err("query is empty".into());
    }
    Ok(text)
}

/// Parses a delimiter argument into a single byte.
///
/// Accepts one ASCII character, or the escape `\t` for a tab. Quotes and line
/// breaks are rejected since they would make records ambiguous.
pub fn parse_delimiter(value: &str) -> Result<u8, CliError> {
    let byte = match value {
        "\\t" => b'\t',
        _ => match value.as_bytes() {
            [byte] if byte.is_ascii() => *byte,
            _ => {
                return Err(CliError::Message(format!(
                    "delimiter must be a single ASCII character, got '{value}'"
                )))
            }
        },
    };
    if matches!(byte, b'"' | b'\r' | b'\n') {
        return Err(CliError::Message(format!(
            "delimiter {:?} is not allowed",
            char::from(byte)
        )));
    }
    Ok(byte)
}
