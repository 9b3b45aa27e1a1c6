//! Configuration module for xrbroker.
//!
//! Handles the settings file, environment variables and defaults.

mod settings;

pub use settings::{
    expand_env_vars, AdbSettings, LoggingSettings, QuerySettings, Settings, SettingsError,
    CONFIG_ENV, LOCAL_CONFIG,
};
