use std::fmt;

use thiserror::Error;

use crate::cursor::CursorError;

/// Result alias used by the export pipeline.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Fatal conditions that abort an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Column metadata could not be read from the cursor.
    #[error("cannot introspect result schema: {0}")]
    Introspect(#[source] CursorError),
    /// The query produced a result without any column.
    #[error("cannot introspect result schema: query returned no columns")]
    NoColumns,
    /// A column reported a type that cannot be exported as text.
    #[error("column \"{name}\" (#{}) has type {type_name} which is not supported", .ordinal + 1)]
    UnsupportedColumn {
        /// Zero-based column position.
        ordinal: usize,
        /// Resolved column name.
        name: String,
        /// Database-reported type name.
        type_name: String,
    },
    /// The cursor failed to advance to, or to populate, a row.
    #[error("failed to read row {row}: {source}")]
    RowFetch {
        /// One-based number of the row being fetched.
        row: u64,
        /// Underlying cursor failure.
        #[source]
        source: CursorError,
    },
    /// Output bytes could not be written.
    #[error("failed to write {stage}: {source}")]
    Write {
        /// Part of the output being written when the failure happened.
        stage: WriteStage,
        /// Underlying writer failure.
        #[source]
        source: csv::Error,
    },
    /// The configured delimiter could appear unquoted inside a field.
    #[error("delimiter {delimiter:?} cannot be used {reason}")]
    InvalidDelimiter {
        /// Offending delimiter.
        delimiter: char,
        /// Context in which it is rejected.
        reason: &'static str,
    },
}

/// Location in the output at which a write failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    /// The header record.
    Header,
    /// A data field; both numbers are one-based.
    Field {
        /// Row number.
        row: u64,
        /// Field number within the row.
        field: usize,
    },
    /// The line ending that closes a data record.
    EndOfRecord {
        /// Row number.
        row: u64,
    },
}

impl fmt::Display for WriteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteStage::Header => f.write_str("header"),
            WriteStage::Field { row, field } => write!(f, "field {field} of row {row}"),
            WriteStage::EndOfRecord { row } => write!(f, "end of row {row}"),
        }
    }
}

impl ExportError {
    /// Returns true when the failure happened before any row was read.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            ExportError::Introspect(_) | ExportError::NoColumns | ExportError::UnsupportedColumn { .. }
        )
    }
}
