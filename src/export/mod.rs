//! Streaming CSV export pipeline.
//!
//! An [`ExportSession`] owns a [`QueryCursor`](crate::cursor::QueryCursor), a
//! buffered output and an [`ExportConfig`]. Running it resolves the column
//! descriptors once, optionally writes a header, then pumps rows one at a time
//! through a fixed [`CellArena`] into the CSV encoder. Memory use depends on
//! the number of columns, never on the number of rows.
//!
//! # Example
//!
//! ```
//! use sqlcsv::cursor::MemoryCursor;
//! use sqlcsv::export::{ExportConfig, ExportSession, LineEnding, NoProgress};
//!
//! let cursor = MemoryCursor::new([("id", "INT"), ("name", "TEXT")])
//!     .text_row(&[Some("1"), Some("Ann")]);
//! let config = ExportConfig::default()
//!     .headers(true)
//!     .line_ending(LineEnding::Lf);
//!
//! let mut out = Vec::new();
//! let summary = ExportSession::new(cursor, &mut out, config)
//!     .run(&mut NoProgress)
//!     .unwrap();
//! assert_eq!(summary.rows, 1);
//! assert_eq!(out, b"\"id\",\"name\"\n\"1\",\"Ann\"\n");
//! ```

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::{ExportError, Result};

/// Per-column reusable cell buffers.
pub mod arena;
pub mod columns;
pub mod encoder;
pub mod pump;
pub mod sanitize;
pub mod session;
pub mod sink;

pub use arena::{CellArena, RawCell};
pub use columns::{describe_columns, ColumnDescriptor, ColumnKind};
pub use encoder::CsvEncoder;
pub use pump::RowPump;
pub use sanitize::{normalize, normalize_into, sanitize, sanitize_into};
pub use session::ExportSession;
pub use sink::{BufferedSink, DEFAULT_BUFFER_CAPACITY};

/// Default number of rows between progress notifications.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 50;

/// Record terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// `\r\n`, as RFC 4180 expects.
    #[default]
    Crlf,
    /// `\n`.
    Lf,
}

impl LineEnding {
    /// The terminator bytes.
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Crlf => "\r\n",
            LineEnding::Lf => "\n",
        }
    }

    pub(crate) fn terminator(&self) -> csv::Terminator {
        match self {
            LineEnding::Crlf => csv::Terminator::CRLF,
            LineEnding::Lf => csv::Terminator::Any(b'\n'),
        }
    }
}

/// Field quoting policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteMode {
    /// Quote every field, including numbers and empty values.
    #[default]
    Always,
    /// Leave fields that parse as numbers bare and quote everything else.
    NonNumeric,
}

impl QuoteMode {
    pub(crate) fn style(&self) -> csv::QuoteStyle {
        match self {
            QuoteMode::Always => csv::QuoteStyle::Always,
            QuoteMode::NonNumeric => csv::QuoteStyle::NonNumeric,
        }
    }
}

/// Settings for one export run.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Field delimiter byte (default: `,`).
    pub delimiter: u8,
    /// Record terminator (default: CRLF).
    pub line_ending: LineEnding,
    /// Whether the first record holds the column names (default: false).
    pub headers: bool,
    /// Field quoting policy (default: always).
    pub quote_mode: QuoteMode,
    /// Output buffer size in bytes (default: 10 MiB).
    pub buffer_capacity: usize,
    /// Rows between progress notifications; 0 disables them (default: 50).
    pub progress_interval: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            line_ending: LineEnding::Crlf,
            headers: false,
            quote_mode: QuoteMode::Always,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl ExportConfig {
    /// Creates a config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the field delimiter.
    #[must_use]
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets the record terminator.
    #[must_use]
    pub fn line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Sets whether to write a header record.
    #[must_use]
    pub fn headers(mut self, headers: bool) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the quoting policy.
    #[must_use]
    pub fn quote_mode(mut self, quote_mode: QuoteMode) -> Self {
        self.quote_mode = quote_mode;
        self
    }

    /// Sets the output buffer size.
    #[must_use]
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Sets the progress notification interval.
    #[must_use]
    pub fn progress_interval(mut self, rows: u64) -> Self {
        self.progress_interval = rows;
        self
    }

    /// Checks that every record will hold exactly one unquoted delimiter
    /// between consecutive fields.
    ///
    /// Quotes, CR, LF and non-ASCII bytes are never valid delimiters. With
    /// [`QuoteMode::NonNumeric`], numbers are written bare, so no byte that
    /// can be part of a number (digits, sign, point, exponent, `inf`, `nan`)
    /// may be used either.
    pub fn validate(&self) -> Result<()> {
        let delimiter = self.delimiter;
        if !delimiter.is_ascii() || matches!(delimiter, b'"' | b'\r' | b'\n') {
            return Err(ExportError::InvalidDelimiter {
                delimiter: char::from(delimiter),
                reason: "in a CSV record",
            });
        }
        if self.quote_mode == QuoteMode::NonNumeric && occurs_in_numbers(delimiter) {
            return Err(ExportError::InvalidDelimiter {
                delimiter: char::from(delimiter),
                reason: "with non-numeric quoting",
            });
        }
        Ok(())
    }
}

fn occurs_in_numbers(byte: u8) -> bool {
    byte.is_ascii_digit()
        || matches!(
            byte.to_ascii_lowercase(),
            b'+' | b'-' | b'.' | b'e' | b'i' | b'n' | b'f' | b't' | b'y' | b'a'
        )
}

/// Counters maintained by the row pump.
#[derive(Debug, Clone, Copy)]
pub struct RunStats {
    /// Data rows written so far.
    pub rows: u64,
    /// When pumping started.
    pub started: Instant,
}

impl RunStats {
    /// Starts counting from now.
    pub fn start() -> Self {
        Self {
            rows: 0,
            started: Instant::now(),
        }
    }

    /// Time since pumping started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Receives progress notifications from the row pump.
pub trait Progress {
    /// Called every `progress_interval` rows.
    fn rows_written(&mut self, stats: &RunStats);

    /// Called once after the last row was written.
    fn finished(&mut self, _stats: &RunStats) {}
}

/// Progress sink that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn rows_written(&mut self, _stats: &RunStats) {}
}

/// Outcome of a successful export.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportSummary {
    /// Resolved output columns.
    pub columns: Vec<ColumnDescriptor>,
    /// Data rows written, excluding the header.
    pub rows: u64,
    /// Bytes handed to the output, header included.
    pub bytes_written: u64,
    /// Wall time of the whole run in milliseconds.
    pub duration_ms: f64,
    /// Set when the final flush failed after every row had been written.
    pub flush_error: Option<String>,
}

impl ExportSummary {
    /// Wall time of the whole run.
    pub fn elapsed(&self) -> Duration {
        Duration::from_secs_f64(self.duration_ms / 1_000.0)
    }
}
