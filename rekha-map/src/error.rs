//! Error types for map loading.

use thiserror::Error;

/// Errors produced while loading a vector map.
#[derive(Error, Debug)]
pub enum MapError {
    #[error("failed to read map file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed map line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, MapError>;
