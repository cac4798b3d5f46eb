//! Unified error handling for the runner tools
//!
//! Every failure the format and export crates can report is one of these
//! variants. The binaries wrap them in `anyhow` for reporting.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for all runner operations
#[derive(Error, Debug)]
pub enum Error {
    // ==================== I/O Errors ====================

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    // ==================== Container Errors ====================

    /// Invalid magic bytes at file start
    #[error("Invalid magic bytes: expected {expected:?}, found {found:?}")]
    InvalidMagic {
        expected: Vec<u8>,
        found: Vec<u8>,
    },

    /// Unsupported format version
    #[error("Unsupported version: {version} (supported: {supported})")]
    UnsupportedVersion {
        version: u32,
        supported: u32,
    },

    /// Unexpected end of data
    #[error("Unexpected end of data at offset {offset}")]
    UnexpectedEof {
        offset: u64,
    },

    /// Offset field pointing outside the data section
    #[error("{what} at offset {offset} (+{len} bytes) exceeds data section of {available} bytes")]
    OffsetOutOfBounds {
        what: String,
        offset: u64,
        len: u64,
        available: u64,
    },

    /// Invalid data structure
    #[error("Invalid data: {message}")]
    InvalidData {
        message: String,
    },

    // ==================== Scene Errors ====================

    /// Missing required field
    #[error("Missing required field: {field}")]
    MissingField {
        field: String,
    },

    /// Name that does not resolve to anything in the scene
    #[error("Invalid reference: {reference}")]
    InvalidReference {
        reference: String,
    },

    // ==================== Configuration Errors ====================

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        message: String,
    },

    // ==================== General Errors ====================

    /// Custom error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

/// Result type using the unified Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error with additional context
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Error::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create an invalid data error
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Error::InvalidData {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Error::MissingField {
            field: field.into(),
        }
    }

    /// Create an invalid reference error
    pub fn invalid_reference(reference: impl Into<String>) -> Self {
        Error::InvalidReference {
            reference: reference.into(),
        }
    }

    /// Check if this is a parse/format error
    pub fn is_format_error(&self) -> bool {
        match self {
            Error::InvalidMagic { .. }
            | Error::UnsupportedVersion { .. }
            | Error::UnexpectedEof { .. }
            | Error::OffsetOutOfBounds { .. }
            | Error::InvalidData { .. } => true,
            Error::WithContext { source, .. } => source.is_format_error(),
            _ => false,
        }
    }

    /// Check if this error comes from a malformed scene description
    pub fn is_scene_error(&self) -> bool {
        match self {
            Error::MissingField { .. } | Error::InvalidReference { .. } => true,
            Error::WithContext { source, .. } => source.is_scene_error(),
            _ => false,
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
