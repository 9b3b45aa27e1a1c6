//! Lazy iteration over a runtime's functions table.

use std::iter::FusedIterator;

use tracing::error;

use super::types::FunctionMapping;
use super::LOG_TAG;
use crate::contract::functions::columns::{FUNCTION_NAME, SYMBOL_NAME};
use crate::cursor::ScopedCursor;
use crate::resolver::QueryResult;

/// Function mappings read one row at a time from an open cursor.
///
/// Single pass: the cursor is released as soon as the last row has been
/// read, a row fails to decode, or the iterator is dropped.
#[derive(Debug, Default)]
pub struct FunctionMappings {
    rows: Option<FunctionRows>,
}

#[derive(Debug)]
struct FunctionRows {
    cursor: ScopedCursor,
    function_column: usize,
    symbol_column: usize,
}

impl FunctionMappings {
    /// An iterator that yields nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolve the column indices and take ownership of the cursor.
    pub(crate) fn open(cursor: ScopedCursor) -> QueryResult<Self> {
        let function_column = cursor.required_column(FUNCTION_NAME)?;
        let symbol_column = cursor.required_column(SYMBOL_NAME)?;
        Ok(Self {
            rows: Some(FunctionRows {
                cursor,
                function_column,
                symbol_column,
            }),
        })
    }

    /// Whether a cursor is still held.
    pub fn is_open(&self) -> bool {
        self.rows.is_some()
    }
}

impl Iterator for FunctionMappings {
    type Item = FunctionMapping;

    fn next(&mut self) -> Option<Self::Item> {
        let rows = self.rows.as_mut()?;
        if !rows.cursor.move_to_next() {
            self.rows = None;
            return None;
        }

        match FunctionMapping::from_row(&*rows.cursor, rows.function_column, rows.symbol_column) {
            Ok(mapping) => Some(mapping),
            Err(err) => {
                error!(tag = LOG_TAG, "failed to read function mapping row: {err}");
                self.rows = None;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.rows {
            Some(rows) => (0, Some(rows.cursor.count())),
            None => (0, Some(0)),
        }
    }
}

impl FusedIterator for FunctionMappings {}
