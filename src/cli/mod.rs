#![forbid(unsafe_code)]

//! Library side of the `sqlcsv` command-line tool.
//!
//! Opens the database, validates the query and the output, and hands both to
//! an [`ExportSession`](crate::export::ExportSession).

/// Query-to-CSV export against a SQLite database file.
pub mod query_export;

pub use query_export::{
    load_query, parse_delimiter, run_query_export, CliError, OutputTarget, QueryExportConfig,
};
