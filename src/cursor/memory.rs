use super::{ColumnMeta, CursorError, QueryCursor, ScanRow};
use crate::export::arena::CellArena;

/// A row value; `None` stands for SQL `NULL`.
pub type MemoryValue = Option<Vec<u8>>;

/// Cursor over rows held in memory.
///
/// Records how often it was advanced and whether it was closed so callers can
/// assert on the pipeline's use of the cursor.
#[derive(Debug, Default)]
pub struct MemoryCursor {
    columns: Vec<ColumnMeta>,
    rows: Vec<Vec<MemoryValue>>,
    position: usize,
    fetches: usize,
    closed: bool,
    fail_columns: bool,
    fail_at: Option<usize>,
}

impl MemoryCursor {
    /// Creates an empty cursor with the given `(name, type)` columns.
    pub fn new<I, N, T>(columns: I) -> Self
    where
        I: IntoIterator<Item = (N, T)>,
        N: Into<String>,
        T: Into<String>,
    {
        Self {
            columns: columns
                .into_iter()
                .map(|(name, ty)| ColumnMeta::new(name, ty))
                .collect(),
            ..Self::default()
        }
    }

    /// Appends a row of raw values.
    #[must_use]
    pub fn row(mut self, values: Vec<MemoryValue>) -> Self {
        self.rows.push(values);
        self
    }

    /// Appends a row of text values.
    #[must_use]
    pub fn text_row(self, values: &[Option<&str>]) -> Self {
        self.row(
            values
                .iter()
                .map(|value| value.map(|text| text.as_bytes().to_vec()))
                .collect(),
        )
    }

    /// Makes `columns()` fail.
    #[must_use]
    pub fn fail_columns(mut self) -> Self {
        self.fail_columns = true;
        self
    }

    /// Makes the fetch of the one-based row `row` fail.
    #[must_use]
    pub fn fail_at(mut self, row: usize) -> Self {
        self.fail_at = Some(row);
        self
    }

    /// Number of `next_row` calls made so far.
    pub fn fetches(&self) -> usize {
        self.fetches
    }

    /// Whether `close` was called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl QueryCursor for MemoryCursor {
    type Row<'a> = MemoryRow<'a>;

    fn columns(&self) -> Result<Vec<ColumnMeta>, CursorError> {
        if self.fail_columns {
            return Err(CursorError::Message("column metadata unavailable".into()));
        }
        Ok(self.columns.clone())
    }

    fn next_row(&mut self) -> Result<Option<Self::Row<'_>>, CursorError> {
        self.fetches += 1;
        if self.fail_at == Some(self.position + 1) {
            return Err(CursorError::Message("connection reset".into()));
        }
        let Some(values) = self.rows.get(self.position) else {
            return Ok(None);
        };
        self.position += 1;
        Ok(Some(MemoryRow(values)))
    }

    fn close(&mut self) -> Result<(), CursorError> {
        self.closed = true;
        Ok(())
    }
}

/// The row a [`MemoryCursor`] is positioned on.
pub struct MemoryRow<'a>(&'a [MemoryValue]);

impl ScanRow for MemoryRow<'_> {
    fn scan(&self, cells: &mut CellArena) -> Result<(), CursorError> {
        if self.0.len() != cells.len() {
            return Err(CursorError::RowWidth {
                expected: cells.len(),
                actual: self.0.len(),
            });
        }
        for (cell, value) in cells.iter_mut().zip(self.0) {
            match value {
                Some(bytes) => cell.set_bytes(bytes),
                None => cell.set_null(),
            }
        }
        Ok(())
    }
}
