//! Error types for the Prism enhancement pipeline.
//!
//! Errors are organized by layer: configuration, the enhancement engine,
//! the external analysis collaborator, and persistence. The color math
//! layers (`color::pixel`, `color::matrix`) are total and never produce
//! errors; validation happens once at the engine boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ImageId;

/// Top-level error type for Prism operations.
#[derive(Error, Debug)]
pub enum PrismError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Enhancement engine errors (decode, parameters, timeouts)
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Content analysis collaborator errors
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// Persistence collaborator errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// No image record with this id exists
    #[error("Image not found: {0}")]
    NotFound(ImageId),

    /// A stage for this image is running in this process
    #[error("Image {0} has a stage in flight")]
    InFlight(ImageId),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors raised by the enhancement engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Input bytes could not be decoded into a pixel buffer
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Output buffer could not be encoded
    #[error("Encode error: {message}")]
    Encode { message: String },

    /// A transform parameter is outside its legal range
    #[error("Invalid parameter {name}={value} (expected {min}..={max})")]
    InvalidParameter {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Preset id not present in the catalog
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    /// Filter id not present in the catalog
    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    /// Operation exceeded its time budget
    #[error("Timeout in {stage} stage after {timeout_ms}ms")]
    Timeout { stage: String, timeout_ms: u64 },

    /// Background task failed to complete
    #[error("Task error: {0}")]
    Task(String),
}

impl EngineError {
    pub(crate) fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub(crate) fn invalid(name: &str, value: f64, min: f64, max: f64) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            value,
            min,
            max,
        }
    }
}

/// How the orchestrator should react to an analysis failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisErrorKind {
    /// Retry now (network blip, 5xx, dropped connection)
    Transient,
    /// Quota exhausted; retry later, never immediately
    RateLimited,
    /// Propagate as failure (bad request, auth, unparseable output)
    Unrecoverable,
}

impl std::fmt::Display for AnalysisErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisErrorKind::Transient => write!(f, "transient"),
            AnalysisErrorKind::RateLimited => write!(f, "rate-limited"),
            AnalysisErrorKind::Unrecoverable => write!(f, "unrecoverable"),
        }
    }
}

/// Error returned by a content analysis collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind} analysis failure: {message}")]
pub struct AnalysisError {
    pub kind: AnalysisErrorKind,
    pub message: String,
    /// HTTP status code when the failure came from a remote API
    pub status_code: Option<u16>,
}

impl AnalysisError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: AnalysisErrorKind::Transient,
            message: message.into(),
            status_code: None,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: AnalysisErrorKind::RateLimited,
            message: message.into(),
            status_code: Some(429),
        }
    }

    pub fn unrecoverable(message: impl Into<String>) -> Self {
        Self {
            kind: AnalysisErrorKind::Unrecoverable,
            message: message.into(),
            status_code: None,
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }
}

/// Persistence collaborator errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Key does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Filesystem failure in a file-backed store
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored record could not be (de)serialized
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Re-read after a write did not observe the written revision
    #[error("Write to {id} not confirmed (expected revision {expected}, found {found:?})")]
    Unconfirmed {
        id: ImageId,
        expected: u64,
        found: Option<u64>,
    },

    /// Backend-specific failure
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Convenience type alias for Prism results.
pub type Result<T> = std::result::Result<T, PrismError>;

/// Convenience type alias for engine-specific results.
pub type EngineResult<T> = std::result::Result<T, EngineError>;
