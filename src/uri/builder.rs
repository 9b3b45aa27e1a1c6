//! URI builders for the active runtime and functions tables.

use super::{check_authority, encode_segment, ContentUri, UriError};
use crate::contract::{active_runtime, functions, BrokerType, ABI_PATH, BASE_PATH, RUNTIMES_PATH};

/// Incremental builder for a [`ContentUri`].
#[derive(Debug, Clone)]
pub struct ContentUriBuilder {
    authority: String,
    segments: Vec<String>,
}

impl ContentUriBuilder {
    /// A builder for `content://<authority>`.
    pub fn new(authority: &str) -> Result<Self, UriError> {
        Ok(Self {
            authority: check_authority(authority)?.to_string(),
            segments: Vec::new(),
        })
    }

    /// A builder rooted at a broker's authority.
    pub fn for_broker(broker: BrokerType) -> Self {
        Self {
            authority: broker.authority().to_string(),
            segments: Vec::new(),
        }
    }

    /// Append one path segment, percent-encoding it like `Uri.Builder.appendPath`.
    pub fn append_path(mut self, segment: impl AsRef<str>) -> Self {
        self.segments.push(encode_segment(segment.as_ref()).into_owned());
        self
    }

    /// Append a numeric row selector.
    pub fn append_id(self, id: i64) -> Self {
        self.append_path(id.to_string())
    }

    pub fn build(self) -> ContentUri {
        ContentUri::from_parts(self.authority, self.segments)
    }
}

/// `content://<authority>/openxr/<major>/abi/<abi>/runtimes`, shared by both tables.
fn runtimes_base(broker: BrokerType, major_version: u32, abi: &str) -> ContentUriBuilder {
    ContentUriBuilder::for_broker(broker)
        .append_path(BASE_PATH)
        .append_path(major_version.to_string())
        .append_path(ABI_PATH)
        .append_path(abi)
        .append_path(RUNTIMES_PATH)
}

/// URI of the single active runtime row for a major version and ABI.
///
/// Inputs are not validated: a bogus ABI gives a well-formed URI that the
/// broker simply has no row for.
pub fn active_runtime_uri(broker: BrokerType, major_version: u32, abi: &str) -> ContentUri {
    runtimes_base(broker, major_version, abi)
        .append_path(active_runtime::TABLE_PATH)
        .append_id(active_runtime::ROW_ID)
        .build()
}

/// URI of the whole function remapping table of one runtime package.
pub fn functions_uri(
    broker: BrokerType,
    major_version: u32,
    package_name: &str,
    abi: &str,
) -> ContentUri {
    runtimes_base(broker, major_version, abi)
        .append_path(package_name)
        .append_path(functions::TABLE_PATH)
        .build()
}
