//! Content URIs for the runtime broker tables.
//!
//! The builders are pure: identical inputs always produce an identical URI,
//! and the broker type only changes the authority.
//!
//! Path segments are encoded the way Android's `Uri.encode` does it. Only
//! ASCII letters, digits and `_-!.~'()*` are left as they are; every other
//! byte is percent-escaped. Dot segments are kept, since content URIs are
//! never resolved against a base.
//!
//! # Example
//!
//! ```
//! use xrbroker::contract::BrokerType;
//! use xrbroker::uri::active_runtime_uri;
//!
//! let uri = active_runtime_uri(BrokerType::Installable, 1, "arm64-v8a");
//! assert_eq!(
//!     uri.to_string(),
//!     "content://org.khronos.openxr.runtime_broker/openxr/1/abi/arm64-v8a/runtimes/active/0"
//! );
//! ```

mod builder;
mod parser;

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use thiserror::Error;
use url::{Host, Url};

use crate::contract::CONTENT_SCHEME;

pub use builder::{active_runtime_uri, functions_uri, ContentUriBuilder};
pub use parser::{BrokerUriParser, ParsedBrokerUri, TableType};

/// Bytes `Uri.encode` escapes: everything except alphanumerics and `_-!.~'()*`.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'-')
    .remove(b'!')
    .remove(b'.')
    .remove(b'~')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*');

/// Errors produced when parsing a content URI from text.
#[derive(Debug, Error)]
pub enum UriError {
    #[error("invalid URI: {0}")]
    Invalid(#[from] url::ParseError),

    #[error("expected scheme 'content', found '{0}'")]
    UnexpectedScheme(String),

    #[error("content URI has no authority")]
    MissingAuthority,
}

/// Percent-encode one path segment.
pub fn encode_segment(segment: &str) -> Cow<'_, str> {
    utf8_percent_encode(segment, SEGMENT).into()
}

/// An addressable broker resource: `content://<authority>/<segment>/...`.
///
/// Segments are stored encoded, so a segment can never spill into its
/// neighbours and the rendered form is safe to hand to a shell once quoted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentUri {
    rendered: String,
    authority: String,
    segments: Vec<String>,
}

impl ContentUri {
    /// Start building a URI under a broker authority.
    pub fn builder(authority: &str) -> Result<ContentUriBuilder, UriError> {
        ContentUriBuilder::new(authority)
    }

    /// Parse a rendered `content://` URI.
    ///
    /// Segments are re-encoded, so `parse(uri.as_str())` gives back `uri`.
    /// Empty segments are dropped. Query and fragment are ignored.
    pub fn parse(input: &str) -> Result<Self, UriError> {
        let url = Url::parse(input)?;
        if url.scheme() != CONTENT_SCHEME {
            return Err(UriError::UnexpectedScheme(url.scheme().to_string()));
        }

        // Take the path from the input itself; `Url` would fold dot segments.
        let rest = input
            .trim()
            .split_once("://")
            .map_or("", |(_, rest)| rest);
        let rest = rest.split(['?', '#']).next().unwrap_or_default();
        let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
        let authority = check_authority(authority)?;

        let segments = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                let decoded = percent_decode_str(segment).decode_utf8_lossy();
                encode_segment(&decoded).into_owned()
            })
            .collect();
        Ok(Self::from_parts(authority.to_string(), segments))
    }

    pub(crate) fn from_parts(authority: String, segments: Vec<String>) -> Self {
        let mut rendered = format!("{CONTENT_SCHEME}://{authority}");
        for segment in &segments {
            rendered.push('/');
            rendered.push_str(segment);
        }
        Self {
            rendered,
            authority,
            segments,
        }
    }

    pub fn scheme(&self) -> &str {
        CONTENT_SCHEME
    }

    /// The content provider authority.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Path segments as they appear in the rendered URI.
    pub fn path_segments(&self) -> Vec<&str> {
        self.segments.iter().map(String::as_str).collect()
    }

    /// Path segments with percent-escapes decoded.
    pub fn decoded_segments(&self) -> Vec<Cow<'_, str>> {
        self.segments
            .iter()
            .map(|segment| percent_decode_str(segment).decode_utf8_lossy())
            .collect()
    }

    /// The trailing row id, if the last segment is numeric.
    pub fn row_id(&self) -> Option<i64> {
        self.segments.last().and_then(|s| s.parse().ok())
    }

    pub fn as_str(&self) -> &str {
        &self.rendered
    }
}

/// Validate an authority with the same rules `url` applies to opaque hosts.
pub(crate) fn check_authority(authority: &str) -> Result<&str, UriError> {
    if authority.is_empty() {
        return Err(UriError::MissingAuthority);
    }
    Host::parse_opaque(authority)?;
    Ok(authority)
}

impl fmt::Display for ContentUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

impl FromStr for ContentUri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
