use rusqlite::types::ValueRef;
use rusqlite::{Row, Rows, Statement};

use super::{ColumnMeta, CursorError, QueryCursor, ScanRow};
use crate::export::arena::CellArena;

/// Cursor over the rows of an executing SQLite statement.
///
/// Column metadata is captured from the statement's declared types before the
/// statement is stepped. Columns computed from expressions have no declared
/// type and report an empty type name.
pub struct SqliteCursor<'stmt> {
    rows: Rows<'stmt>,
    columns: Vec<ColumnMeta>,
}

impl<'stmt> SqliteCursor<'stmt> {
    /// Executes `statement` without parameters and wraps its rows.
    pub fn open(statement: &'stmt mut Statement<'_>) -> Result<Self, CursorError> {
        let columns = statement
            .columns()
            .iter()
            .map(|column| ColumnMeta::new(column.name(), column.decl_type().unwrap_or_default()))
            .collect();
        let rows = statement.query([])?;
        Ok(Self { rows, columns })
    }
}

impl<'stmt> QueryCursor for SqliteCursor<'stmt> {
    type Row<'a> = SqliteRow<'a, 'stmt>
    where
        Self: 'a;

    fn columns(&self) -> Result<Vec<ColumnMeta>, CursorError> {
        Ok(self.columns.clone())
    }

    fn next_row(&mut self) -> Result<Option<Self::Row<'_>>, CursorError> {
        Ok(self.rows.next()?.map(SqliteRow))
    }
}

/// The row a [`SqliteCursor`] is positioned on.
pub struct SqliteRow<'a, 'stmt>(&'a Row<'stmt>);

impl ScanRow for SqliteRow<'_, '_> {
    fn scan(&self, cells: &mut CellArena) -> Result<(), CursorError> {
        let width = AsRef::<Statement<'_>>::as_ref(self.0).column_count();
        if width != cells.len() {
            return Err(CursorError::RowWidth {
                expected: cells.len(),
                actual: width,
            });
        }
        for (ordinal, cell) in cells.iter_mut().enumerate() {
            match self.0.get_ref(ordinal)? {
                ValueRef::Null => cell.set_null(),
                ValueRef::Integer(value) => cell.set_display(value),
                ValueRef::Real(value) => cell.set_display(value),
                ValueRef::Text(bytes) | ValueRef::Blob(bytes) => cell.set_bytes(bytes),
            }
        }
        Ok(())
    }
}
