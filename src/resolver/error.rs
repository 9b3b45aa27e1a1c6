//! Query error types.

use std::io;
use thiserror::Error;

/// Result type for query and cursor operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors raised while querying a broker or reading its cursor.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The transport to the broker could not be started.
    #[error("failed to start broker transport: {0}")]
    SpawnFailed(#[source] io::Error),

    /// Reading the broker's response failed.
    #[error("broker transport failed: {0}")]
    Transport(#[source] io::Error),

    /// No content provider is registered for the authority.
    #[error("no content provider for {0}")]
    ProviderUnavailable(String),

    /// The caller is not allowed to read from the provider.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The broker rejected or failed the query.
    #[error("broker error: {message} ({kind})")]
    Remote {
        /// Exception or error class reported by the broker.
        kind: String,
        /// Message reported by the broker.
        message: String,
    },

    /// A projected column name is not part of the table.
    #[error("invalid column name: {0}")]
    InvalidColumn(String),

    /// A required column is missing from the result set.
    #[error("column not found in result set: {0}")]
    MissingColumn(String),

    /// A column index outside the result set.
    #[error("column index {index} out of range for {count} columns")]
    ColumnOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of columns in the result set.
        count: usize,
    },

    /// The cursor is not positioned on a row.
    #[error("cursor is not positioned on a row")]
    NoCurrentRow,

    /// The cursor was already released.
    #[error("cursor is closed")]
    Closed,

    /// A value could not be read as the requested type.
    #[error("column {column}: expected {expected}, found {found:?}")]
    TypeMismatch {
        /// Column index.
        column: usize,
        /// Requested type.
        expected: &'static str,
        /// Value that was found.
        found: String,
    },

    /// The broker's response could not be understood.
    #[error("malformed broker response: {0}")]
    Malformed(String),
}

impl QueryError {
    /// Create a remote error from a broker-reported failure.
    pub fn remote(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Check if this error came from the transport rather than the broker.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::SpawnFailed(_) | Self::Transport(_))
    }

    /// Check if this error was raised while decoding a result set.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Self::MissingColumn(_)
                | Self::ColumnOutOfRange { .. }
                | Self::NoCurrentRow
                | Self::Closed
                | Self::TypeMismatch { .. }
        )
    }
}

impl From<io::Error> for QueryError {
    fn from(err: io::Error) -> Self {
        Self::Transport(err)
    }
}
