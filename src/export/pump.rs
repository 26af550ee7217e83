//! Row-at-a-time transfer from a cursor to the encoder.

use std::io::Write;

use tracing::trace;

use super::arena::CellArena;
use super::encoder::CsvEncoder;
use super::{Progress, RunStats, DEFAULT_PROGRESS_INTERVAL};
use crate::cursor::{QueryCursor, ScanRow};
use crate::error::{ExportError, Result, WriteStage};

/// Pulls rows from a cursor into a fixed arena and encodes them.
///
/// The pump owns exactly one [`CellArena`] for its lifetime; every row is
/// scanned into the same buffers.
#[derive(Debug)]
pub struct RowPump {
    arena: CellArena,
    stats: RunStats,
    progress_interval: u64,
}

impl RowPump {
    /// Creates a pump for a result of `columns` columns.
    pub fn new(columns: usize) -> Self {
        Self {
            arena: CellArena::new(columns),
            stats: RunStats::start(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Sets the rows between progress notifications; 0 disables them.
    #[must_use]
    pub fn progress_interval(mut self, rows: u64) -> Self {
        self.progress_interval = rows;
        self
    }

    /// The cell buffers.
    pub fn arena(&self) -> &CellArena {
        &self.arena
    }

    /// Counters so far.
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Drains `cursor`, writing one record per row.
    ///
    /// Stops at the first fetch, scan or write failure; rows written before
    /// the failure stay in the encoder.
    pub fn run<C, W>(
        &mut self,
        cursor: &mut C,
        encoder: &mut CsvEncoder<W>,
        progress: &mut dyn Progress,
    ) -> Result<RunStats>
    where
        C: QueryCursor + ?Sized,
        W: Write,
    {
        loop {
            let row = self.stats.rows + 1;
            let fetched = cursor
                .next_row()
                .map_err(|source| ExportError::RowFetch { row, source })?;
            let Some(values) = fetched else {
                break;
            };
            values
                .scan(&mut self.arena)
                .map_err(|source| ExportError::RowFetch { row, source })?;

            for (ordinal, cell) in self.arena.iter().enumerate() {
                encoder
                    .write_field(cell.as_bytes())
                    .map_err(|source| ExportError::Write {
                        stage: WriteStage::Field {
                            row,
                            field: ordinal + 1,
                        },
                        source,
                    })?;
            }
            encoder.end_record().map_err(|source| ExportError::Write {
                stage: WriteStage::EndOfRecord { row },
                source,
            })?;

            self.stats.rows = row;
            if self.progress_interval > 0 && row % self.progress_interval == 0 {
                trace!(rows = row, "export.rows.progress");
                progress.rows_written(&self.stats);
            }
        }
        progress.finished(&self.stats);
        Ok(self.stats)
    }
}
