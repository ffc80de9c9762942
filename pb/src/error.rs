//! Error types for progress-bar-plus

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Errors raised by a render target while emitting a frame
///
/// These never reach the caller of a tracker operation: a failed render is
/// logged and dropped so the wrapped workload keeps running.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to write progress output: {0}")]
    Write(#[from] std::io::Error),

    #[error("Display handle closed")]
    HandleClosed,
}
