//! Broker query client.
//!
//! [`BrokerClient`] builds the table URI, runs the query through its
//! [`ContentResolver`], and decodes the result. It never returns an error:
//! a missing broker, an empty table and a failed query all come back as
//! "no runtime", with one log line saying which it was.
//!
//! ```text
//! build URI ──▶ query ──▶ decode ──▶ Found(runtime)
//!                 │          │
//!                 └──────────┴──▶ Absent (+ INFO or ERROR log)
//! ```
//!
//! Every call blocks for the broker round trip; call it off any thread that
//! must stay responsive.
//!
//! # Example
//!
//! ```
//! use xrbroker::client::BrokerClient;
//! use xrbroker::contract::BrokerType;
//! use xrbroker::cursor::MatrixCursor;
//! use xrbroker::resolver::from_fn;
//!
//! let client = BrokerClient::new(from_fn(|_uri, projection| {
//!     let cursor = MatrixCursor::new(projection.iter().copied())
//!         .with_row([
//!             "0",
//!             "com.example.runtime",
//!             "/data/app/lib",
//!             "libexample.so",
//!             "0",
//!         ])?;
//!     Ok(Some(cursor.into_boxed()))
//! }));
//!
//! let summary = client.describe_active_runtime(BrokerType::Installable, 1, "arm64-v8a");
//! assert_eq!(
//!     summary.as_deref(),
//!     Some("Found runtime so libexample.so in package com.example.runtime with no function/symbol mapping changes")
//! );
//! ```

mod functions;
mod types;

use std::collections::BTreeMap;

use tracing::{debug, error, info};

use crate::contract::{self, BrokerType};
use crate::cursor::ScopedCursor;
use crate::resolver::{ContentResolver, QueryResult};
use crate::uri::{active_runtime_uri, functions_uri, ContentUri};

pub use functions::FunctionMappings;
pub use types::{is_function_name, ActiveRuntime, FunctionMapping, RuntimeData, RuntimeLookup};

/// Tag attached to every diagnostic this client logs.
pub const LOG_TAG: &str = "OpenXR-Loader";

/// Reads the active runtime and function tables from a broker.
///
/// Holds no state besides the resolver; every call is an independent
/// request.
#[derive(Debug, Clone)]
pub struct BrokerClient<R> {
    resolver: R,
}

impl<R: ContentResolver> BrokerClient<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn into_resolver(self) -> R {
        self.resolver
    }

    /// Query the active runtime of one broker.
    pub fn query_active_runtime(
        &self,
        broker: BrokerType,
        major_version: u32,
        abi: &str,
    ) -> RuntimeLookup {
        let uri = active_runtime_uri(broker, major_version, abi);
        debug!(tag = LOG_TAG, %uri, "querying active runtime");

        match self.read_active_runtime(&uri) {
            Ok(runtime) => runtime.into(),
            Err(err) => {
                error!(
                    tag = LOG_TAG,
                    %uri,
                    transport = err.is_transport(),
                    decode = err.is_decode(),
                    "exception when searching for runtime: {err}"
                );
                RuntimeLookup::Absent
            }
        }
    }

    /// The one-line summary of the active runtime, or `None`.
    pub fn describe_active_runtime(
        &self,
        broker: BrokerType,
        major_version: u32,
        abi: &str,
    ) -> Option<String> {
        self.query_active_runtime(broker, major_version, abi)
            .summary()
    }

    /// Iterate the function remapping table of a runtime package.
    ///
    /// Only meaningful when that package's active runtime row reported
    /// `has_functions`. Failures yield an empty iterator.
    pub fn query_functions(
        &self,
        broker: BrokerType,
        major_version: u32,
        package_name: &str,
        abi: &str,
    ) -> FunctionMappings {
        let uri = functions_uri(broker, major_version, package_name, abi);
        debug!(tag = LOG_TAG, %uri, "querying runtime functions");

        let opened = self
            .open(&uri, &contract::functions::PROJECTION)
            .and_then(|cursor| cursor.map(FunctionMappings::open).transpose());

        match opened {
            Ok(Some(mappings)) => mappings,
            Ok(None) => FunctionMappings::empty(),
            Err(err) => {
                error!(
                    tag = LOG_TAG,
                    %uri,
                    transport = err.is_transport(),
                    decode = err.is_decode(),
                    "exception when reading runtime functions: {err}"
                );
                FunctionMappings::empty()
            }
        }
    }

    /// The active runtime together with its function remapping, if any.
    pub fn resolve_runtime(
        &self,
        broker: BrokerType,
        major_version: u32,
        abi: &str,
    ) -> Option<RuntimeData> {
        let runtime = self
            .query_active_runtime(broker, major_version, abi)
            .into_runtime()?;

        let functions: BTreeMap<String, String> = if runtime.has_functions {
            self.query_functions(broker, major_version, &runtime.package_name, abi)
                .map(|mapping| (mapping.function_name, mapping.symbol_name))
                .collect()
        } else {
            BTreeMap::new()
        };

        Some(RuntimeData::from_active(
            runtime,
            major_version,
            functions,
            broker,
        ))
    }

    /// Ask the installable broker, then the system broker.
    ///
    /// Each broker is asked once; the first runtime found wins.
    pub fn discover(&self, major_version: u32, abi: &str) -> Option<RuntimeData> {
        BrokerType::ALL
            .into_iter()
            .find_map(|broker| self.resolve_runtime(broker, major_version, abi))
    }

    fn read_active_runtime(&self, uri: &ContentUri) -> QueryResult<Option<ActiveRuntime>> {
        let Some(mut cursor) = self.open(uri, &contract::active_runtime::PROJECTION)? else {
            return Ok(None);
        };
        if cursor.count() < 1 || !cursor.move_to_first() {
            info!(tag = LOG_TAG, %uri, "non-null but empty cursor when querying broker");
            return Ok(None);
        }
        ActiveRuntime::from_cursor(&*cursor).map(Some)
    }

    /// Run the query, wrapping the cursor so it is released on every path.
    fn open(&self, uri: &ContentUri, projection: &[&str]) -> QueryResult<Option<ScopedCursor>> {
        match self.resolver.query(uri, projection)? {
            Some(cursor) => Ok(Some(ScopedCursor::new(cursor))),
            None => {
                info!(tag = LOG_TAG, %uri, "null cursor when querying broker");
                Ok(None)
            }
        }
    }
}
