//! TOML-based configuration for xrbroker.
//!
//! Supports a config file (xrbroker.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [query]
//! broker = "installable"   # or "system"
//! major_version = 1
//! abi = "arm64-v8a"        # defaults to the host ABI
//!
//! [adb]
//! path = "adb"
//! serial = "${ANDROID_SERIAL}"
//!
//! [logging]
//! filter = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::contract::{self, BrokerType};
use crate::resolver::AdbResolver;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "XRBROKER_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG: &str = "xrbroker.toml";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Which broker table to query.
    pub query: QuerySettings,

    /// How to reach the device.
    pub adb: AdbSettings,

    /// Diagnostic output.
    pub logging: LoggingSettings,
}

/// Query parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QuerySettings {
    /// Broker to query.
    pub broker: BrokerType,

    /// OpenXR major version.
    pub major_version: u32,

    /// Android ABI tag; the host ABI when unset.
    pub abi: Option<String>,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            broker: BrokerType::Installable,
            major_version: 1,
            abi: None,
        }
    }
}

impl QuerySettings {
    /// The configured ABI, falling back to the host ABI.
    pub fn resolved_abi(&self) -> Result<String, SettingsError> {
        match &self.abi {
            Some(abi) => {
                let abi = expand_env_vars(abi)?;
                if abi.is_empty() {
                    return Err(SettingsError::InvalidConfig("query.abi is empty".to_string()));
                }
                Ok(abi)
            }
            None => contract::host_abi().map(str::to_string).ok_or_else(|| {
                SettingsError::InvalidConfig(
                    "query.abi is not set and the host ABI is unknown".to_string(),
                )
            }),
        }
    }
}

/// adb transport settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdbSettings {
    /// adb executable (supports ${ENV_VAR} expansion).
    pub path: String,

    /// Device serial (supports ${ENV_VAR} expansion).
    pub serial: Option<String>,
}

impl Default for AdbSettings {
    fn default() -> Self {
        Self {
            path: "adb".to_string(),
            serial: None,
        }
    }
}

impl AdbSettings {
    /// Build a resolver with environment variables expanded.
    pub fn resolver(&self) -> Result<AdbResolver, SettingsError> {
        let mut resolver = AdbResolver::new().with_program(expand_env_vars(&self.path)?);
        if let Some(serial) = &self.serial {
            let serial = expand_env_vars(serial)?;
            if !serial.is_empty() {
                resolver = resolver.with_serial(serial);
            }
        }
        Ok(resolver)
    }
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` overrides it.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `XRBROKER_CONFIG`
    /// 2. `./xrbroker.toml`
    /// 3. `~/.config/xrbroker/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var(CONFIG_ENV) {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG);
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("xrbroker").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                var_name.push(ch);
            }
            if var_name.is_empty() {
                // A lone `$` is kept as is.
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
