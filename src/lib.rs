//! Streaming export of SQL query results to CSV.
//!
//! The [`export`] pipeline pulls rows one at a time from a
//! [`QueryCursor`](cursor::QueryCursor), sanitizes every cell and writes
//! RFC 4180 style records through a large output buffer. Memory use is bounded
//! by the number of columns, not by the size of the result. The [`cli`] module
//! wires the pipeline to SQLite database files for the `sqlcsv` binary.

#![warn(missing_docs)]

pub mod cli;
pub mod cursor;
/// Errors raised by the export pipeline.
pub mod error;
pub mod export;

pub use cursor::{ColumnMeta, CursorError, QueryCursor, ScanRow};
pub use error::{ExportError, Result, WriteStage};
pub use export::{ExportConfig, ExportSession, ExportSummary, LineEnding, QuoteMode};
