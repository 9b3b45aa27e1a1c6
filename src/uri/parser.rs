//! Recognises the broker table URIs.
//!
//! Four shapes are accepted under a broker authority:
//!
//! ```text
//! /openxr/#/abi/*/runtimes/active            active runtime, whole table
//! /openxr/#/abi/*/runtimes/active/#          active runtime, one row
//! /openxr/#/abi/*/runtimes/*/functions       functions, whole table
//! /openxr/#/abi/*/runtimes/*/functions/#     functions, one row
//! ```

use tracing::warn;

use super::ContentUri;
use crate::contract::{
    active_runtime, functions, BrokerType, ABI_PATH, BASE_PATH, CONTENT_SCHEME, RUNTIMES_PATH,
};

/// Which broker table a URI addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableType {
    ActiveRuntime,
    Functions,
}

/// The parameters carried by a broker table URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBrokerUri {
    /// Broker whose authority the URI used.
    pub broker: BrokerType,
    pub table: TableType,
    /// OpenXR major version.
    pub major_version: u32,
    pub abi: String,
    /// Runtime package, only set for [`TableType::Functions`].
    pub package_name: Option<String>,
    /// Row selector; `None` addresses the whole table.
    pub row: Option<i64>,
}

impl ParsedBrokerUri {
    /// True if the URI addresses the whole table rather than one row.
    pub fn is_dir(&self) -> bool {
        self.row.is_none()
    }
}

/// Parses URIs addressed to one broker's authority.
#[derive(Debug, Clone, Copy)]
pub struct BrokerUriParser {
    broker: BrokerType,
}

impl BrokerUriParser {
    pub fn new(broker: BrokerType) -> Self {
        Self { broker }
    }

    pub fn broker(&self) -> BrokerType {
        self.broker
    }

    /// Parse a URI, returning `None` if it is not one of this broker's tables.
    pub fn parse(&self, uri: &ContentUri) -> Option<ParsedBrokerUri> {
        if uri.scheme() != CONTENT_SCHEME {
            warn!(scheme = uri.scheme(), "URI scheme was not '{CONTENT_SCHEME}'");
            return None;
        }
        if uri.authority() != self.broker.authority() {
            warn!(
                expected = self.broker.authority(),
                found = uri.authority(),
                "URI authority does not belong to this broker"
            );
            return None;
        }

        let decoded = uri.decoded_segments();
        let segments: Vec<&str> = decoded.iter().map(|segment| &**segment).collect();
        let (table, package_name, row) = match segments.as_slice() {
            [base, _, abi_path, _, runtimes, rest @ ..]
                if *base == BASE_PATH && *abi_path == ABI_PATH && *runtimes == RUNTIMES_PATH =>
            {
                match_table(rest)?
            }
            _ => {
                warn!(uri = %uri, "URI does not match any broker table");
                return None;
            }
        };

        let major_version = match segments[1].parse::<u32>() {
            Ok(version) => version,
            Err(_) => {
                warn!(
                    segment = segments[1],
                    "could not parse segment as a major version number"
                );
                return None;
            }
        };

        Some(ParsedBrokerUri {
            broker: self.broker,
            table,
            major_version,
            abi: segments[3].to_string(),
            package_name,
            row,
        })
    }
}

/// Match the path after `/runtimes`.
fn match_table(rest: &[&str]) -> Option<(TableType, Option<String>, Option<i64>)> {
    match rest {
        [table] if *table == active_runtime::TABLE_PATH => {
            Some((TableType::ActiveRuntime, None, None))
        }
        [table, row] if *table == active_runtime::TABLE_PATH => {
            Some((TableType::ActiveRuntime, None, Some(parse_row(row)?)))
        }
        [package, table] if *table == functions::TABLE_PATH => {
            Some((TableType::Functions, Some(package.to_string()), None))
        }
        [package, table, row] if *table == functions::TABLE_PATH => Some((
            TableType::Functions,
            Some(package.to_string()),
            Some(parse_row(row)?),
        )),
        _ => {
            warn!(path = ?rest, "unrecognised runtimes table path");
            None
        }
    }
}

fn parse_row(segment: &str) -> Option<i64> {
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        warn!(segment, "row selector is not numeric");
        return None;
    }
    segment.parse().ok()
}
