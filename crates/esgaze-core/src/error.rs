//! Error types for the ElasticGaze backend.
//!
//! This module defines the error taxonomy shared by the core library and the
//! RPC boundary. Cache-tier failures are absorbed close to where they happen;
//! only load failures and caller mistakes are meant to travel far.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for ElasticGaze operations.
#[derive(Debug, Error)]
pub enum EsGazeError {
    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Database errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Cache tier errors
    #[error("Cache entry not found: {key}")]
    CacheEntryNotFound { key: String },

    // Editor preload errors
    #[error("Editor load failed: {message}")]
    EditorLoadFailed { message: String },

    // RPC parameter errors
    #[error("Invalid params: {message}")]
    InvalidParams { message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for ElasticGaze operations.
pub type Result<T> = std::result::Result<T, EsGazeError>;

// Conversion implementations for common error types

impl From<std::io::Error> for EsGazeError {
    fn from(err: std::io::Error) -> Self {
        EsGazeError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for EsGazeError {
    fn from(err: serde_json::Error) -> Self {
        EsGazeError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for EsGazeError {
    fn from(err: rusqlite::Error) -> Self {
        EsGazeError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl EsGazeError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        EsGazeError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Convert to a JSON-RPC error code.
    ///
    /// Standard JSON-RPC error codes:
    /// - -32602: Invalid params
    /// - -32603: Internal error
    ///
    /// Custom error codes (application-defined, -32000 to -32099):
    /// - -32000: Cache entry not found
    /// - -32001: Editor load failed
    pub fn to_rpc_error_code(&self) -> i32 {
        match self {
            EsGazeError::CacheEntryNotFound { .. } => -32000,
            EsGazeError::EditorLoadFailed { .. } => -32001,
            EsGazeError::InvalidParams { .. } => -32602,
            _ => -32603,
        }
    }
}
