//! Core error types for lifemap-core.
//!
//! This module defines the error hierarchy using thiserror. The flow engine
//! itself is infallible; these errors belong to the loading and configuration
//! layers around it.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for lifemap-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Snapshot loading errors
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while reading a graph snapshot.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// Failed to read the snapshot file
    #[error("Failed to read snapshot at {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not a valid snapshot
    #[error("Failed to parse snapshot: {0}")]
    ParseFailed(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The home directory or config directory is unavailable
    #[error("Config directory unavailable: {0}")]
    DirUnavailable(#[source] std::io::Error),

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Semantically invalid configuration
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    /// Weight table has no entries
    #[error("Weight table is empty")]
    EmptyWeightTable,

    /// Weight points must be positive and finite
    #[error("Weight {weight} maps to invalid points {points}")]
    InvalidWeightPoints { weight: u8, points: f64 },

    /// Weight points must not decrease as weight grows
    #[error("Weight points must not decrease: weight {weight} has {points}, below {previous}")]
    NonMonotonicWeights {
        weight: u8,
        points: f64,
        previous: f64,
    },

    /// Custom window ends before it starts
    #[error("Invalid custom range: end ({end}) is before start ({start})")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
