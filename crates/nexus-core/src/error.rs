//! Core error types for nexus-core.
//!
//! This module defines the error hierarchy using thiserror. Only two
//! conditions are ever surfaced as rejections by the session engine
//! ([`SessionError`]); actuator failures are logged and retried on the next
//! status poll rather than propagated.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for nexus-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Session lifecycle rejections
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Snapshot store errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Lock/unlock gateway errors
    #[error("Actuator error: {0}")]
    Actuator(#[from] ActuatorError),

    /// External bridge errors
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

/// Explicit rejections from the session engine.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// `start` was called while a session is running.
    #[error("Session already active")]
    AlreadyActive,

    /// `abort` was called while strict or hardcore mode is on.
    #[error("Abort is disabled in strict/hardcore mode")]
    AbortDisabled,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Value could not be parsed into the key's type
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Snapshot store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(#[from] rusqlite::Error),

    /// Snapshot could not be encoded
    #[error("Snapshot encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Lock/unlock gateway errors.
#[derive(Error, Debug)]
pub enum ActuatorError {
    /// No base URL configured
    #[error("No actuator URL configured")]
    NotConfigured,

    /// Base URL could not be parsed or joined
    #[error("Invalid actuator URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Network failure or timeout
    #[error("Actuator unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    /// Device answered with a non-success status
    #[error("Actuator rejected command (HTTP {status})")]
    Rejected { status: u16 },

    /// Could not build the request runtime
    #[error("Actuator runtime unavailable: {0}")]
    Runtime(std::io::Error),
}

/// External bridge errors.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Bridge is switched off in configuration
    #[error("Bridge not enabled")]
    Disabled,

    /// Bridge enabled but no URL set
    #[error("No bridge URL configured")]
    NotConfigured,

    /// Network failure or timeout
    #[error("Bridge request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Could not build the request runtime
    #[error("Bridge runtime unavailable: {0}")]
    Runtime(std::io::Error),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
