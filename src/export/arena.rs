//! Fixed set of per-column byte buffers reused for every row.

use std::fmt::Display;
use std::io::Write;

/// Initial capacity of each cell buffer.
const CELL_CAPACITY: usize = 64;

/// One column's raw value for the current row.
///
/// The buffer is overwritten in place on every fetch, so its contents are only
/// meaningful until the next row is scanned.
#[derive(Debug, Default)]
pub struct RawCell {
    buf: Vec<u8>,
}

impl RawCell {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Replaces the contents with `bytes`.
    pub fn set_bytes(&mut self, bytes: &[u8]) {
        self.buf.clear();
        self.buf.extend_from_slice(bytes);
    }

    /// Replaces the contents with the `Display` rendering of `value`.
    pub fn set_display(&mut self, value: impl Display) {
        self.buf.clear();
        // Writing into a Vec cannot fail.
        let _ = write!(self.buf, "{value}");
    }

    /// Marks the cell as SQL `NULL`, which exports as an empty field.
    pub fn set_null(&mut self) {
        self.buf.clear();
    }

    /// Current contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Allocated capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }
}

/// Buffers for every column of a result, indexed by ordinal.
///
/// The arena is sized once from the result schema and never grows or shrinks,
/// which keeps memory proportional to the column count rather than the row
/// count. Borrowed cells cannot outlive the next scan.
#[derive(Debug)]
pub struct CellArena {
    cells: Vec<RawCell>,
}

impl CellArena {
    /// Allocates one buffer per column.
    pub fn new(columns: usize) -> Self {
        Self {
            cells: (0..columns)
                .map(|_| RawCell::with_capacity(CELL_CAPACITY))
                .collect(),
        }
    }

    /// Number of buffers, equal to the column count.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true for a zero-column arena.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell at `ordinal`.
    pub fn get(&self, ordinal: usize) -> Option<&RawCell> {
        self.cells.get(ordinal)
    }

    /// Cells in ordinal order.
    pub fn iter(&self) -> std::slice::Iter<'_, RawCell> {
        self.cells.iter()
    }

    /// Mutable cells in ordinal order, for cursor implementations to fill.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, RawCell> {
        self.cells.iter_mut()
    }
}
