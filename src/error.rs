//! Error types for rust-sqlsig

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a batch or the CLI.
///
/// Problems with an individual routine's text or metadata are never errors;
/// they are reported as diagnostics on the routine's signature.
#[derive(Error, Debug)]
pub enum SqlSigError {
    #[error("Failed to read snapshot file: {path}")]
    SnapshotReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse snapshot file: {path}")]
    SnapshotParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read signature cache: {path}")]
    CacheReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse signature cache: {path}")]
    CacheParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid routine name pattern '{pattern}': {message}")]
    InvalidNamePattern { pattern: String, message: String },

    #[error("Routine object id {object_id} appears more than once in the batch")]
    DuplicateRoutineId { object_id: i64 },

    #[error("Routine not found in snapshot: {name}")]
    RoutineNotFound { name: String },

    #[error("Failed to serialize signatures")]
    SerializeError {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write signatures to {path}")]
    OutputWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
