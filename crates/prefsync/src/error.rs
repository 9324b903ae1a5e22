use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

/// Faults raised while loading or persisting the preference file.
///
/// These never escape the store's public API: reads fall back to defaults
/// and writes are reported as `false`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0} does not contain a JSON object")]
    NotAnObject(PathBuf),
    #[error("failed to serialize preferences: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A preference change request carried a value outside the legal set.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("invalid theme value {0}, expected \"light\", \"dark\" or \"system\"")]
    Theme(Value),
    #[error("invalid hotkeys-enabled value {0}, expected a boolean")]
    HotkeysEnabled(Value),
}

/// The native side of a theme change could not be honoured.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("failed to apply theme source: {0}")]
    ThemeSource(String),
    #[error("failed to query OS color scheme: {0}")]
    ColorScheme(String),
}

#[derive(Debug, Error)]
pub enum ShortcutError {
    #[error("failed to register {accelerator}: {reason}")]
    Register { accelerator: String, reason: String },
    #[error("failed to unregister shortcuts: {0}")]
    Unregister(String),
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("window {0} has been destroyed")]
    Destroyed(String),
    #[error("failed to emit to window {label}: {reason}")]
    Emit { label: String, reason: String },
}
