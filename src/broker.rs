//! An in-memory broker.
//!
//! [`StaticBroker`] answers broker queries from a fixed table of runtimes,
//! one per broker type, major version and ABI. It stands in for a device
//! when running the CLI offline and in tests.
//!
//! Fixtures are TOML:
//!
//! ```toml
//! [[runtime]]
//! broker = "installable"
//! major_version = 1
//! abi = "arm64-v8a"                   # omit to serve every ABI
//! package_name = "com.example.runtime"
//! native_lib_dir = "/data/app/com.example.runtime/lib/arm64"
//! so_filename = "libexample.so"
//!
//! [runtime.functions]
//! xrCreateInstance = "exampleCreateInstance"
//! ```
//!
//! Function entries whose name is not an OpenXR command name, or whose
//! symbol is empty, are dropped with a warning when the runtime is added.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::{is_function_name, ActiveRuntime, RuntimeData};
use crate::contract::{active_runtime, functions, BrokerType};
use crate::cursor::{CellValue, Cursor, MatrixCursor};
use crate::resolver::{ContentResolver, QueryError, QueryResult};
use crate::uri::{BrokerUriParser, ContentUri, ParsedBrokerUri, TableType};

/// Error loading a broker fixture.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("Fixture file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read fixture file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse fixture file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Duplicate {broker} runtime for OpenXR {major_version} ({abi})")]
    Duplicate {
        broker: BrokerType,
        major_version: u32,
        abi: String,
    },
}

/// One runtime served by a [`StaticBroker`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticRuntime {
    /// ABI the runtime is served for; `None` matches any ABI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abi: Option<String>,

    #[serde(flatten)]
    pub data: RuntimeData,
}

impl StaticRuntime {
    fn serves(&self, broker: BrokerType, major_version: u32, abi: &str) -> bool {
        self.data.broker == broker
            && self.data.major_version == major_version
            && self.abi.as_deref().map_or(true, |own| own == abi)
    }

    fn abi_label(&self) -> &str {
        self.abi.as_deref().unwrap_or("*")
    }
}

#[derive(Debug, Default, Deserialize)]
struct Fixture {
    #[serde(default, rename = "runtime")]
    runtimes: Vec<StaticRuntime>,
}

/// A [`ContentResolver`] serving a fixed set of active runtimes.
///
/// Which runtime is active is stated up front; there is no selection or
/// preference handling. With no runtime configured the active runtime table
/// is an empty cursor and the functions table has no cursor at all.
#[derive(Debug, Clone, Default)]
pub struct StaticBroker {
    runtimes: Vec<StaticRuntime>,
}

impl StaticBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `data` as the active runtime of its broker for every ABI.
    pub fn with_runtime(self, data: RuntimeData) -> Result<Self, FixtureError> {
        self.with_static(StaticRuntime { abi: None, data })
    }

    /// Serve `data` as the active runtime of its broker for one ABI.
    pub fn with_runtime_for_abi(
        self,
        abi: impl Into<String>,
        data: RuntimeData,
    ) -> Result<Self, FixtureError> {
        self.with_static(StaticRuntime {
            abi: Some(abi.into()),
            data,
        })
    }

    fn with_static(mut self, mut runtime: StaticRuntime) -> Result<Self, FixtureError> {
        let package = runtime.data.package_name.clone();
        runtime.data.functions.retain(|function, symbol| {
            let keep = is_function_name(function) && !symbol.is_empty();
            if !keep {
                warn!(%package, %function, %symbol, "ignoring malformed function mapping");
            }
            keep
        });

        let clash = self.runtimes.iter().any(|existing| {
            existing.data.broker == runtime.data.broker
                && existing.data.major_version == runtime.data.major_version
                && existing.abi == runtime.abi
        });
        if clash {
            return Err(FixtureError::Duplicate {
                broker: runtime.data.broker,
                major_version: runtime.data.major_version,
                abi: runtime.abi_label().to_string(),
            });
        }
        self.runtimes.push(runtime);
        Ok(self)
    }

    /// Parse a TOML fixture.
    pub fn from_toml(content: &str) -> Result<Self, FixtureError> {
        let fixture: Fixture = toml::from_str(content)?;
        fixture
            .runtimes
            .into_iter()
            .try_fold(Self::new(), Self::with_static)
    }

    /// Load a TOML fixture from disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(FixtureError::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn runtimes(&self) -> &[StaticRuntime] {
        &self.runtimes
    }

    /// The runtime active for a broker, preferring an exact ABI match.
    pub fn active(&self, broker: BrokerType, major_version: u32, abi: &str) -> Option<&RuntimeData> {
        let candidates = || {
            self.runtimes
                .iter()
                .filter(move |runtime| runtime.serves(broker, major_version, abi))
        };
        candidates()
            .find(|runtime| runtime.abi.is_some())
            .or_else(|| candidates().next())
            .map(|runtime| &runtime.data)
    }

    fn answer(
        &self,
        request: &ParsedBrokerUri,
        projection: &[&str],
    ) -> QueryResult<Option<MatrixCursor>> {
        let runtime = self.active(request.broker, request.major_version, &request.abi);
        if runtime.is_none() {
            debug!(broker = %request.broker, abi = %request.abi, "no active runtime configured");
        }

        match request.table {
            TableType::ActiveRuntime => {
                let active = runtime.map(RuntimeData::to_active);
                active_rows(active.as_ref(), request.row, projection)
            }
            TableType::Functions => {
                let Some(runtime) = runtime else {
                    return Ok(None);
                };
                if request.package_name.as_deref() != Some(runtime.package_name.as_str()) {
                    debug!(
                        requested = ?request.package_name,
                        active = %runtime.package_name,
                        "functions requested for a package that is not active"
                    );
                    return Ok(None);
                }
                function_rows(runtime, request.row, projection)
            }
        }
    }
}

impl ContentResolver for StaticBroker {
    fn query(
        &self,
        uri: &ContentUri,
        projection: &[&str],
    ) -> QueryResult<Option<Box<dyn Cursor>>> {
        let Some(broker) = BrokerType::from_authority(uri.authority()) else {
            return Err(QueryError::ProviderUnavailable(uri.authority().to_string()));
        };
        let Some(request) = BrokerUriParser::new(broker).parse(uri) else {
            warn!(%uri, "query for an unknown broker table");
            return Err(QueryError::remote(
                "IllegalArgumentException",
                format!("Unknown URI {uri}"),
            ));
        };

        Ok(self
            .answer(&request, projection)?
            .map(MatrixCursor::into_boxed))
    }
}

/// Build the active runtime table, which only ever holds row `0`.
///
/// The cursor is always returned, empty when there is no runtime or another
/// row was asked for.
fn active_rows(
    runtime: Option<&ActiveRuntime>,
    row: Option<i64>,
    projection: &[&str],
) -> QueryResult<Option<MatrixCursor>> {
    use active_runtime::columns::*;

    check_projection(projection, &active_runtime::PROJECTION)?;
    let mut cursor = MatrixCursor::new(projection.iter().copied());

    let row_zero = row.map_or(true, |row| row == active_runtime::ROW_ID);
    if let Some(runtime) = runtime.filter(|_| row_zero) {
        cursor.add_row(projection.iter().map(|column| match *column {
            ID => CellValue::from(runtime.id),
            PACKAGE_NAME => runtime.package_name.as_str().into(),
            NATIVE_LIB_DIR => runtime.native_lib_dir.as_str().into(),
            SO_FILENAME => runtime.so_filename.as_str().into(),
            _ => runtime.has_functions.into(),
        }))?;
    }
    Ok(Some(cursor))
}

/// Build the functions table, sorted by function name, `_id` being the row index.
fn function_rows(
    runtime: &RuntimeData,
    row: Option<i64>,
    projection: &[&str],
) -> QueryResult<Option<MatrixCursor>> {
    use functions::columns::*;

    check_projection(projection, &functions::PROJECTION)?;
    let mut cursor = MatrixCursor::new(projection.iter().copied());

    // BTreeMap iteration is already ordered by function name.
    for (index, (function_name, symbol_name)) in runtime.functions.iter().enumerate() {
        let id = index as i64;
        if row.is_some_and(|row| row != id) {
            continue;
        }
        cursor.add_row(projection.iter().map(|column| match *column {
            FUNCTION_NAME => CellValue::from(function_name.as_str()),
            SYMBOL_NAME => CellValue::from(symbol_name.as_str()),
            _ => CellValue::from(id),
        }))?;
    }
    Ok(Some(cursor))
}

fn check_projection(projection: &[&str], known: &[&str]) -> QueryResult<()> {
    match projection.iter().find(|column| !known.contains(column)) {
        Some(unknown) => Err(QueryError::InvalidColumn(unknown.to_string())),
        None => Ok(()),
    }
}
