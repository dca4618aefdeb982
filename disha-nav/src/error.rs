//! Error types for the navigation core.

use thiserror::Error;

/// Navigation core error type.
#[derive(Error, Debug)]
pub enum NavError {
    #[error("map error: {0}")]
    Map(#[from] rekha_map::MapError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for NavError {
    fn from(e: toml::de::Error) -> Self {
        NavError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NavError>;
