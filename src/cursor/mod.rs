//! Forward-only result cursors feeding the export pipeline.
//!
//! A cursor exposes the column metadata of one executed query and then hands
//! out rows one at a time. A row is only valid until the next call to
//! [`QueryCursor::next_row`]; its values are copied into the caller's
//! [`CellArena`] through [`ScanRow::scan`].

use thiserror::Error;

use crate::export::arena::CellArena;

/// In-memory cursor used by tests and embedders.
pub mod memory;
/// Cursor over a prepared SQLite statement.
pub mod sqlite;

pub use memory::MemoryCursor;
pub use sqlite::SqliteCursor;

/// Column metadata as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnMeta {
    /// Column name; may be empty for unnamed expressions.
    pub name: String,
    /// Database type name; empty when the driver reports none.
    pub type_name: String,
}

impl ColumnMeta {
    /// Creates metadata for one column.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Errors raised by cursor implementations.
#[derive(Debug, Error)]
pub enum CursorError {
    /// SQLite driver failure.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    /// A row carried a different number of values than the result schema.
    #[error("row has {actual} values but the result has {expected} columns")]
    RowWidth {
        /// Column count of the result.
        expected: usize,
        /// Values present in the row.
        actual: usize,
    },
    /// Generic cursor failure.
    #[error("{0}")]
    Message(String),
}

/// A forward-only iterator over the rows of one query.
pub trait QueryCursor {
    /// Borrowed view of the current row.
    type Row<'a>: ScanRow
    where
        Self: 'a;

    /// Returns the ordered column metadata. Called once, before iteration.
    fn columns(&self) -> Result<Vec<ColumnMeta>, CursorError>;

    /// Advances to the next row, returning `None` once the result is exhausted.
    fn next_row(&mut self) -> Result<Option<Self::Row<'_>>, CursorError>;

    /// Releases the cursor. Dropping it releases driver resources as well.
    fn close(&mut self) -> Result<(), CursorError> {
        Ok(())
    }
}

/// A row that can copy its values into reusable cell buffers.
pub trait ScanRow {
    /// Overwrites every cell of `cells`, in ordinal order, with this row's values.
    fn scan(&self, cells: &mut CellArena) -> Result<(), CursorError>;
}

impl<C: QueryCursor + ?Sized> QueryCursor for &mut C {
    type Row<'a> = C::Row<'a>
    where
        Self: 'a;

    fn columns(&self) -> Result<Vec<ColumnMeta>, CursorError> {
        (**self).columns()
    }

    fn next_row(&mut self) -> Result<Option<Self::Row<'_>>, CursorError> {
        (**self).next_row()
    }

    fn close(&mut self) -> Result<(), CursorError> {
        (**self).close()
    }
}
