use std::path::PathBuf;
use thiserror::Error;

/// Errors that count a file as failed. Missing sidecars and unsupported
/// formats are not errors, they are skips (see `dispatch::Outcome`).
#[derive(Debug, Error)]
pub enum FixrError {
    #[error("malformed sidecar JSON {path}: {reason}")]
    MalformedMetadata { path: PathBuf, reason: String },

    #[error("failed to write metadata to {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FixrError>;
