//! Row-oriented result sets returned by a broker query.
//!
//! A cursor starts positioned before the first row. Values are read from the
//! current row by column index, and indices are looked up by column name:
//! a broker may return columns in any order.
//!
//! Cursors hold transport resources and must be released. [`ScopedCursor`]
//! guarantees the release on every exit path.

mod matrix;

use std::ops::{Deref, DerefMut};

use crate::resolver::{QueryError, QueryResult};

pub use matrix::{CellValue, CloseCounter, MatrixCursor};

/// A forward-only view over the rows of a query result.
pub trait Cursor {
    /// Number of rows in the result set.
    fn count(&self) -> usize;

    /// Move to the first row. Returns `false` if the result set is empty.
    fn move_to_first(&mut self) -> bool;

    /// Move to the next row. Returns `false` once past the last row.
    fn move_to_next(&mut self) -> bool;

    /// Index of a column by name.
    fn column_index(&self, name: &str) -> Option<usize>;

    /// Text value of a column in the current row; `None` for SQL NULL.
    fn get_string(&self, column: usize) -> QueryResult<Option<String>>;

    /// Integer value of a column in the current row; NULL reads as `0`.
    fn get_int(&self, column: usize) -> QueryResult<i64>;

    /// Release the cursor.
    fn close(&mut self);

    fn is_closed(&self) -> bool;

    /// Index of a column that must be present.
    fn required_column(&self, name: &str) -> QueryResult<usize> {
        self.column_index(name)
            .ok_or_else(|| QueryError::MissingColumn(name.to_string()))
    }
}

/// Owns a cursor and closes it when dropped.
pub struct ScopedCursor {
    inner: Box<dyn Cursor>,
}

impl ScopedCursor {
    pub fn new(inner: Box<dyn Cursor>) -> Self {
        Self { inner }
    }
}

impl Deref for ScopedCursor {
    type Target = dyn Cursor;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl DerefMut for ScopedCursor {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.as_mut()
    }
}

impl Drop for ScopedCursor {
    fn drop(&mut self) {
        if !self.inner.is_closed() {
            self.inner.close();
        }
    }
}

impl std::fmt::Debug for dyn Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("count", &self.count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl std::fmt::Debug for ScopedCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedCursor")
            .field("count", &self.inner.count())
            .field("closed", &self.inner.is_closed())
            .finish()
    }
}
