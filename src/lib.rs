//! # xrbroker
//!
//! Discover the active OpenXR runtime on an Android device by querying the
//! runtime broker content providers.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Query parameters (broker, major version, ABI)     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [uri]
//! ┌─────────────────────────────────────────────────────────┐
//! │   content://<authority>/openxr/<major>/abi/<abi>/...     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [resolver]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Cursor (adb device, in-memory broker, double)     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [client]
//! ┌─────────────────────────────────────────────────────────┐
//! │      ActiveRuntime / function mappings / RuntimeData     │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod broker;
pub mod client;
pub mod config;
pub mod contract;
pub mod cursor;
pub mod logging;
pub mod resolver;
pub mod uri;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::broker::StaticBroker;
    pub use crate::client::{
        ActiveRuntime, BrokerClient, FunctionMapping, FunctionMappings, RuntimeData,
        RuntimeLookup,
    };
    pub use crate::contract::BrokerType;
    pub use crate::cursor::{CellValue, Cursor, MatrixCursor, ScopedCursor};
    pub use crate::resolver::{AdbResolver, ContentResolver, QueryError, QueryResult};
    pub use crate::uri::{active_runtime_uri, functions_uri, ContentUri};
}

// Also export at crate root for convenience
pub use client::{BrokerClient, RuntimeLookup};
pub use contract::BrokerType;
pub use uri::{active_runtime_uri, functions_uri, ContentUri};
