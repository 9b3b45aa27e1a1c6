//! The query executor boundary.
//!
//! A [`ContentResolver`] runs a read query against a broker table and hands
//! back a cursor. It is the only way this crate talks to a broker:
//!
//! ```text
//! ┌──────────────────────┐   query(uri, projection)   ┌───────────────────┐
//! │     BrokerClient     │ ─────────────────────────▶ │  ContentResolver  │
//! │  (decode, summarise) │ ◀───────────────────────── │ adb / in-memory / │
//! └──────────────────────┘    Option<Box<dyn Cursor>> │   test double     │
//!                                                     └───────────────────┘
//! ```
//!
//! `Ok(None)` means the broker answered without a result set, which is how
//! an absent or uninstalled broker shows up. Resolvers block for the whole
//! round trip.

pub mod adb;
mod error;

use crate::cursor::Cursor;
use crate::uri::ContentUri;

pub use adb::AdbResolver;
pub use error::{QueryError, QueryResult};

/// Executes read queries against broker tables.
pub trait ContentResolver {
    /// Query `uri` for the named columns.
    fn query(&self, uri: &ContentUri, projection: &[&str])
        -> QueryResult<Option<Box<dyn Cursor>>>;
}

impl<R: ContentResolver + ?Sized> ContentResolver for &R {
    fn query(
        &self,
        uri: &ContentUri,
        projection: &[&str],
    ) -> QueryResult<Option<Box<dyn Cursor>>> {
        (**self).query(uri, projection)
    }
}

impl<R: ContentResolver + ?Sized> ContentResolver for Box<R> {
    fn query(
        &self,
        uri: &ContentUri,
        projection: &[&str],
    ) -> QueryResult<Option<Box<dyn Cursor>>> {
        (**self).query(uri, projection)
    }
}

/// A resolver backed by a closure.
pub struct FnResolver<F> {
    query: F,
}

impl<F> ContentResolver for FnResolver<F>
where
    F: Fn(&ContentUri, &[&str]) -> QueryResult<Option<Box<dyn Cursor>>>,
{
    fn query(
        &self,
        uri: &ContentUri,
        projection: &[&str],
    ) -> QueryResult<Option<Box<dyn Cursor>>> {
        (self.query)(uri, projection)
    }
}

/// Wrap a closure as a [`ContentResolver`].
///
/// ```
/// use xrbroker::resolver::{from_fn, ContentResolver};
/// use xrbroker::uri::active_runtime_uri;
/// use xrbroker::contract::BrokerType;
///
/// let resolver = from_fn(|_uri, _projection| Ok(None));
/// let uri = active_runtime_uri(BrokerType::System, 1, "x86_64");
/// assert!(resolver.query(&uri, &["_id"]).unwrap().is_none());
/// ```
pub fn from_fn<F>(query: F) -> FnResolver<F>
where
    F: Fn(&ContentUri, &[&str]) -> QueryResult<Option<Box<dyn Cursor>>>,
{
    FnResolver { query }
}
