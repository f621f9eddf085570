//! Error types with actionable diagnostics.
//!
//! Loading and saving checkpoints have their own error types so callers of
//! [`QuantizedModelAdapter::load`](crate::QuantizedModelAdapter::load) and
//! [`QuantizedModelAdapter::save`](crate::QuantizedModelAdapter::save) get
//! the toolkit's failure back unchanged. Everything else goes through
//! [`Error`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for acelerar operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure while reconstructing a quantized model from a checkpoint.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Checkpoint directory or one of its files does not exist.
    #[error("Checkpoint not found: {path}\n  → Save a quantized model there first or check the path")]
    NotFound { path: PathBuf },

    /// Reading a checkpoint file failed.
    #[error("Failed to read {path}\n  Cause: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Checkpoint content could not be parsed.
    #[error("Malformed checkpoint {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    /// Checkpoint was written by an incompatible format revision.
    #[error("Unsupported checkpoint format version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Weights file digest does not match the one recorded at save time.
    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}\n  → The checkpoint is corrupt, re-export it")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// Reference model does not have the architecture that was quantized.
    #[error("Reference model does not match checkpoint: {message}\n  → Pass the float model the checkpoint was quantized from")]
    ArchitectureMismatch { message: String },
}

impl LoadError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Malformed { path: path.into(), message: message.into() }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::Io { path, source }
        }
    }
}

/// Failure while persisting a quantized model.
#[derive(Error, Debug)]
pub enum SaveError {
    /// Destination could not be created or written.
    #[error("Failed to write {path}\n  Cause: {source}\n  → Check that the destination is a writable directory")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Model state could not be serialized.
    #[error("Serialization failed: {message}")]
    Serialization { message: String },
}

impl SaveError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

/// Crate-wide error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Save(#[from] SaveError),

    /// Quantization configuration value is invalid.
    #[error("Invalid quantization config '{field}': {message}")]
    InvalidConfig { field: String, message: String },

    /// Tensor shape mismatch.
    #[error("Tensor shape mismatch: expected {expected:?}, got {actual:?}\n  → Check model architecture compatibility")]
    ShapeMismatch { expected: Vec<usize>, actual: Vec<usize> },

    /// IO error with context.
    #[error("IO error: {context}\n  Cause: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }

    pub(crate) fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig { field: field.into(), message: message.into() }
    }
}
