//! Decoded broker records.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::contract::{active_runtime, functions, BrokerType};
use crate::cursor::Cursor;
use crate::resolver::{QueryError, QueryResult};

/// OpenXR command names: `xr` followed by CamelCase words.
static FUNCTION_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^xr[A-Z]([a-z0-9]*)([0-9A-Z]([a-z0-9]*))*$").unwrap());

/// The row of the active runtime table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveRuntime {
    /// Row id; always `0` for a conforming broker.
    pub id: i64,
    /// Android package name of the runtime.
    pub package_name: String,
    /// Directory holding the runtime library. Empty if the broker sent NULL.
    pub native_lib_dir: String,
    /// Filename of the runtime shared object.
    pub so_filename: String,
    /// Whether the runtime publishes a functions table.
    pub has_functions: bool,
}

impl ActiveRuntime {
    /// Decode the current row, looking columns up by name.
    pub fn from_cursor(cursor: &dyn Cursor) -> QueryResult<Self> {
        use active_runtime::columns::*;

        let id = cursor.required_column(ID)?;
        let package_name = cursor.required_column(PACKAGE_NAME)?;
        let native_lib_dir = cursor.required_column(NATIVE_LIB_DIR)?;
        let so_filename = cursor.required_column(SO_FILENAME)?;
        let has_functions = cursor.required_column(HAS_FUNCTIONS)?;

        Ok(Self {
            id: cursor.get_int(id)?,
            package_name: required_text(cursor, package_name, PACKAGE_NAME)?,
            native_lib_dir: cursor.get_string(native_lib_dir)?.unwrap_or_default(),
            so_filename: required_text(cursor, so_filename, SO_FILENAME)?,
            has_functions: cursor.get_int(has_functions)? == 1,
        })
    }

    /// One-line description of the runtime.
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ActiveRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Found runtime so {} in package {} {}",
            self.so_filename,
            self.package_name,
            if self.has_functions {
                "with function/symbol mapping defined"
            } else {
                "with no function/symbol mapping changes"
            }
        )
    }
}

/// Outcome of an active runtime query.
///
/// Every failure (no broker, no runtime, query error) is `Absent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeLookup {
    Found(ActiveRuntime),
    Absent,
}

impl RuntimeLookup {
    pub fn is_found(&self) -> bool {
        matches!(self, RuntimeLookup::Found(_))
    }

    pub fn as_runtime(&self) -> Option<&ActiveRuntime> {
        match self {
            RuntimeLookup::Found(runtime) => Some(runtime),
            RuntimeLookup::Absent => None,
        }
    }

    pub fn into_runtime(self) -> Option<ActiveRuntime> {
        match self {
            RuntimeLookup::Found(runtime) => Some(runtime),
            RuntimeLookup::Absent => None,
        }
    }

    /// The summary line, if a runtime was found.
    pub fn summary(&self) -> Option<String> {
        self.as_runtime().map(ActiveRuntime::summary)
    }
}

impl From<Option<ActiveRuntime>> for RuntimeLookup {
    fn from(runtime: Option<ActiveRuntime>) -> Self {
        runtime.map_or(RuntimeLookup::Absent, RuntimeLookup::Found)
    }
}

/// One row of a runtime's functions table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FunctionMapping {
    /// Command name as found in the OpenXR specification.
    pub function_name: String,
    /// Symbol to load from the runtime library instead.
    pub symbol_name: String,
}

impl FunctionMapping {
    pub fn new(function_name: impl Into<String>, symbol_name: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            symbol_name: symbol_name.into(),
        }
    }

    /// Decode the current row given the resolved column indices.
    pub(crate) fn from_row(
        cursor: &dyn Cursor,
        function_column: usize,
        symbol_column: usize,
    ) -> QueryResult<Self> {
        Ok(Self {
            function_name: required_text(
                cursor,
                function_column,
                functions::columns::FUNCTION_NAME,
            )?,
            symbol_name: required_text(cursor, symbol_column, functions::columns::SYMBOL_NAME)?,
        })
    }

    /// Whether the function name looks like an OpenXR command (`xrGetFooBAR`).
    pub fn is_well_formed(&self) -> bool {
        is_function_name(&self.function_name) && !self.symbol_name.is_empty()
    }
}

/// Whether `name` follows the OpenXR command naming pattern.
pub fn is_function_name(name: &str) -> bool {
    FUNCTION_NAME_PATTERN.is_match(name)
}

/// Everything a loader needs to open the active runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeData {
    pub package_name: String,
    pub native_lib_dir: String,
    pub so_filename: String,
    pub major_version: u32,
    /// Function name to symbol name. Empty when the runtime has no table.
    #[serde(default)]
    pub functions: BTreeMap<String, String>,
    /// The broker that answered.
    #[serde(default)]
    pub broker: BrokerType,
}

impl RuntimeData {
    /// Combine an active runtime row with its function table.
    pub fn from_active(
        runtime: ActiveRuntime,
        major_version: u32,
        functions: BTreeMap<String, String>,
        broker: BrokerType,
    ) -> Self {
        Self {
            package_name: runtime.package_name,
            native_lib_dir: runtime.native_lib_dir,
            so_filename: runtime.so_filename,
            major_version,
            functions,
            broker,
        }
    }

    /// The active runtime row a broker would serve for this runtime.
    pub fn to_active(&self) -> ActiveRuntime {
        ActiveRuntime {
            id: active_runtime::ROW_ID,
            package_name: self.package_name.clone(),
            native_lib_dir: self.native_lib_dir.clone(),
            so_filename: self.so_filename.clone(),
            has_functions: !self.functions.is_empty(),
        }
    }
}

fn required_text(cursor: &dyn Cursor, column: usize, name: &str) -> QueryResult<String> {
    cursor
        .get_string(column)?
        .ok_or_else(|| QueryError::Malformed(format!("{name} is NULL")))
}
