//! One export run from cursor to output.

use std::io::Write;
use std::time::Instant;

use tracing::{info, warn};

use super::columns::{describe_columns, ColumnDescriptor};
use super::encoder::CsvEncoder;
use super::pump::RowPump;
use super::sink::BufferedSink;
use super::{ExportConfig, ExportSummary, Progress, RunStats};
use crate::cursor::QueryCursor;
use crate::error::{ExportError, Result, WriteStage};

/// Owns the cursor, the buffered output and the settings of one export.
pub struct ExportSession<C: QueryCursor, W: Write> {
    cursor: C,
    encoder: CsvEncoder<BufferedSink<W>>,
    config: ExportConfig,
}

impl<C: QueryCursor, W: Write> ExportSession<C, W> {
    /// Prepares an export of `cursor` into `output`.
    ///
    /// `output` must already be open and truncated; it is wrapped in a
    /// [`BufferedSink`] of `config.buffer_capacity` bytes.
    pub fn new(cursor: C, output: W, config: ExportConfig) -> Self {
        let sink = BufferedSink::with_capacity(config.buffer_capacity, output);
        let encoder = CsvEncoder::new(sink, &config);
        Self {
            cursor,
            encoder,
            config,
        }
    }

    /// Runs the export to completion.
    ///
    /// The config is validated first. The output is flushed and the cursor
    /// closed whether or not the run succeeds. A flush failure never replaces the error that stopped the
    /// run; after a successful run it is logged and reported in
    /// [`ExportSummary::flush_error`].
    pub fn run(self, progress: &mut dyn Progress) -> Result<ExportSummary> {
        let started = Instant::now();
        let Self {
            mut cursor,
            mut encoder,
            config,
        } = self;

        let outcome = transfer(&mut cursor, &mut encoder, &config, progress);
        let flushed = encoder.flush();
        if let Err(err) = cursor.close() {
            warn!(error = %err, "export.cursor.close_failed");
        }

        let (columns, stats) = match outcome {
            Ok(done) => done,
            Err(err) => {
                if let Err(flush_err) = flushed {
                    warn!(error = %flush_err, "export.flush.failed");
                }
                return Err(err);
            }
        };
        let flush_error = match flushed {
            Ok(()) => None,
            Err(err) => {
                warn!(error = %err, "export.flush.failed");
                Some(format!("failed to flush output: {err}"))
            }
        };

        let summary = ExportSummary {
            columns,
            rows: stats.rows,
            bytes_written: encoder.get_ref().bytes_written(),
            duration_ms: started.elapsed().as_secs_f64() * 1_000.0,
            flush_error,
        };
        info!(
            rows = summary.rows,
            bytes = summary.bytes_written,
            duration_ms = summary.duration_ms,
            "export.completed"
        );
        Ok(summary)
    }
}

fn transfer<C, W>(
    cursor: &mut C,
    encoder: &mut CsvEncoder<W>,
    config: &ExportConfig,
    progress: &mut dyn Progress,
) -> Result<(Vec<ColumnDescriptor>, RunStats)>
where
    C: QueryCursor,
    W: Write,
{
    config.validate()?;
    let metas = cursor.columns().map_err(ExportError::Introspect)?;
    let columns = describe_columns(&metas)?;
    info!(
        columns = columns.len(),
        headers = config.headers,
        "export.schema.resolved"
    );

    if config.headers {
        encoder
            .write_header(&columns)
            .map_err(|source| ExportError::Write {
                stage: WriteStage::Header,
                source,
            })?;
    }

    let mut pump = RowPump::new(columns.len()).progress_interval(config.progress_interval);
    let stats = pump.run(cursor, encoder, progress)?;
    Ok((columns, stats))
}
