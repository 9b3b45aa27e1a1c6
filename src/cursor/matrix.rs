//! In-memory cursor backed by a table of values.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Cursor;
use crate::resolver::{QueryError, QueryResult};

/// A single cell of a [`MatrixCursor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Integer(i64),
    Text(String),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => f.write_str("NULL"),
            CellValue::Integer(value) => write!(f, "{value}"),
            CellValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Integer(value.into())
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Integer(i64::from(value))
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Null, Into::into)
    }
}

/// Counts how many times a cursor was closed.
///
/// Shared with the cursor, so it can be inspected after the cursor is gone.
#[derive(Debug, Clone, Default)]
pub struct CloseCounter(Arc<AtomicUsize>);

impl CloseCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn increment(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// A cursor over rows held in memory.
///
/// Strings read as integers are parsed, and integers read as strings are
/// formatted, matching what Android's `MatrixCursor` does.
#[derive(Debug, Clone)]
pub struct MatrixCursor {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
    /// `-1` is before the first row; `rows.len()` is after the last.
    position: isize,
    closed: bool,
    closes: CloseCounter,
}

impl MatrixCursor {
    /// An empty cursor with the given column names.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            position: -1,
            closed: false,
            closes: CloseCounter::default(),
        }
    }

    /// Append a row. It must have one value per column.
    pub fn add_row<I, V>(&mut self, values: I) -> QueryResult<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        let row: Vec<CellValue> = values.into_iter().map(Into::into).collect();
        if row.len() != self.columns.len() {
            return Err(QueryError::Malformed(format!(
                "row has {} values for {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Builder form of [`add_row`](Self::add_row).
    pub fn with_row<I, V>(mut self, values: I) -> QueryResult<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        self.add_row(values)?;
        Ok(self)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Handle for observing [`Cursor::close`] calls on this cursor.
    pub fn close_counter(&self) -> CloseCounter {
        self.closes.clone()
    }

    pub fn into_boxed(self) -> Box<dyn Cursor> {
        Box::new(self)
    }

    fn cell(&self, column: usize) -> QueryResult<&CellValue> {
        if self.closed {
            return Err(QueryError::Closed);
        }
        if column >= self.columns.len() {
            return Err(QueryError::ColumnOutOfRange {
                index: column,
                count: self.columns.len(),
            });
        }
        let row = usize::try_from(self.position)
            .ok()
            .and_then(|position| self.rows.get(position))
            .ok_or(QueryError::NoCurrentRow)?;
        Ok(&row[column])
    }
}

impl Cursor for MatrixCursor {
    fn count(&self) -> usize {
        self.rows.len()
    }

    fn move_to_first(&mut self) -> bool {
        self.position = 0;
        !self.rows.is_empty()
    }

    fn move_to_next(&mut self) -> bool {
        let end = self.rows.len() as isize;
        if self.position < end {
            self.position += 1;
        }
        self.position < end
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    fn get_string(&self, column: usize) -> QueryResult<Option<String>> {
        Ok(match self.cell(column)? {
            CellValue::Null => None,
            CellValue::Integer(value) => Some(value.to_string()),
            CellValue::Text(value) => Some(value.clone()),
        })
    }

    fn get_int(&self, column: usize) -> QueryResult<i64> {
        match self.cell(column)? {
            CellValue::Null => Ok(0),
            CellValue::Integer(value) => Ok(*value),
            CellValue::Text(value) => {
                value
                    .trim()
                    .parse()
                    .map_err(|_| QueryError::TypeMismatch {
                        column,
                        expected: "integer",
                        found: value.clone(),
                    })
            }
        }
    }

    fn close(&mut self) {
        self.closed = true;
        self.closes.increment();
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
