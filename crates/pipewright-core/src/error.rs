//! Error types for pipewright-core

use thiserror::Error;

use crate::diag::Report;

/// Result type alias for pipewright-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in pipewright-core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file could not be found
    #[error("configuration file not found: {path}")]
    ConfigNotFound {
        /// Path that was searched
        path: String,
    },

    /// The configuration text is not valid block syntax
    #[error("failed to parse {origin}: {message}")]
    Syntax {
        /// Identifying path of the source, used only in messages
        origin: String,
        /// Parser description of the failure
        message: String,
    },

    /// Decoding completed but recorded validation failures
    #[error("invalid configuration ({} errors):\n{}", .report.len(), .report)]
    Invalid {
        /// Every failure from the decode pass, in traversal order
        report: Report,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
