//! The runtime broker contract.
//!
//! Authorities, path components and column names shared by every broker
//! implementation and every client. These strings are a stable wire contract
//! with the broker content providers and must not change.
//!
//! ```text
//! content://<authority>/openxr/<major>/abi/<abi>/runtimes/active/0
//! content://<authority>/openxr/<major>/abi/<abi>/runtimes/<package>/functions
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Authority of the user-preference-controlled installable broker.
pub const AUTHORITY: &str = "org.khronos.openxr.runtime_broker";

/// Authority of the system/vendor-provided broker.
pub const SYSTEM_AUTHORITY: &str = "org.khronos.openxr.system_runtime_broker";

/// URI scheme for every broker table.
pub const CONTENT_SCHEME: &str = "content";

/// First path component of every broker table.
pub const BASE_PATH: &str = "openxr";

/// Path component preceding the ABI tag.
pub const ABI_PATH: &str = "abi";

/// Path component preceding the runtime tables.
pub const RUNTIMES_PATH: &str = "runtimes";

/// Column holding the unique row id, present in every table.
pub const ID: &str = "_id";

/// Which broker content provider to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrokerType {
    /// The installable broker, which owns the user's runtime preference.
    #[default]
    Installable,
    /// The system broker shipped with the device image.
    System,
}

impl BrokerType {
    /// Both broker types, in the order a loader consults them.
    pub const ALL: [BrokerType; 2] = [BrokerType::Installable, BrokerType::System];

    /// Map the boolean "use the system broker" flag used by loaders.
    pub fn from_system_flag(use_system_broker: bool) -> Self {
        if use_system_broker {
            BrokerType::System
        } else {
            BrokerType::Installable
        }
    }

    /// The content provider authority for this broker.
    pub fn authority(&self) -> &'static str {
        match self {
            BrokerType::Installable => AUTHORITY,
            BrokerType::System => SYSTEM_AUTHORITY,
        }
    }

    /// Look up the broker type that owns an authority.
    pub fn from_authority(authority: &str) -> Option<Self> {
        match authority {
            AUTHORITY => Some(BrokerType::Installable),
            SYSTEM_AUTHORITY => Some(BrokerType::System),
            _ => None,
        }
    }

    /// Short name used in config files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            BrokerType::Installable => "installable",
            BrokerType::System => "system",
        }
    }
}

impl fmt::Display for BrokerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a broker name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown broker type: {0}. Supported: installable, system")]
pub struct UnknownBrokerType(pub String);

impl FromStr for BrokerType {
    type Err = UnknownBrokerType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "installable" | "runtime_broker" | "runtime" => Ok(BrokerType::Installable),
            "system" | "system_runtime_broker" => Ok(BrokerType::System),
            other => Err(UnknownBrokerType(other.to_string())),
        }
    }
}

/// The `/openxr/<major>/abi/<abi>/runtimes/active` table.
///
/// Holds at most one row: the currently active runtime. Which runtime is
/// active is decided by the broker.
pub mod active_runtime {
    /// Final path component of the table.
    pub const TABLE_PATH: &str = "active";

    /// The only row id this table serves.
    pub const ROW_ID: i64 = 0;

    /// Column names of the active runtime table.
    pub mod columns {
        pub use crate::contract::ID;

        /// Android package name of the runtime.
        pub const PACKAGE_NAME: &str = "package_name";
        /// ABI-specific absolute path of the directory holding the runtime library.
        pub const NATIVE_LIB_DIR: &str = "native_lib_dir";
        /// Filename of the runtime shared object.
        pub const SO_FILENAME: &str = "so_filename";
        /// `1` when the functions table exists for this runtime.
        pub const HAS_FUNCTIONS: &str = "has_functions";
    }

    /// Every column, in the order clients request them.
    pub const PROJECTION: [&str; 5] = [
        columns::ID,
        columns::PACKAGE_NAME,
        columns::NATIVE_LIB_DIR,
        columns::SO_FILENAME,
        columns::HAS_FUNCTIONS,
    ];
}

/// The `/openxr/<major>/abi/<abi>/runtimes/<package>/functions` table.
///
/// Optional function name remapping for one runtime package. It must exist
/// when the active runtime row reports `has_functions`.
pub mod functions {
    /// Final path component of the table.
    pub const TABLE_PATH: &str = "functions";

    /// Column names of the functions table.
    pub mod columns {
        pub use crate::contract::ID;

        /// Function name as found in the OpenXR specification.
        pub const FUNCTION_NAME: &str = "function_name";
        /// Symbol to load from the runtime library instead.
        pub const SYMBOL_NAME: &str = "symbol_name";
    }

    /// Every column, in the order clients request them.
    pub const PROJECTION: [&str; 3] = [columns::ID, columns::FUNCTION_NAME, columns::SYMBOL_NAME];
}

/// The Android ABI tag of the compiling target, if it is an Android ABI.
pub fn host_abi() -> Option<&'static str> {
    if cfg!(target_arch = "aarch64") {
        Some("arm64-v8a")
    } else if cfg!(target_arch = "arm") {
        Some("armeabi-v7a")
    } else if cfg!(target_arch = "x86_64") {
        Some("x86_64")
    } else if cfg!(target_arch = "x86") {
        Some("x86")
    } else {
        None
    }
}
