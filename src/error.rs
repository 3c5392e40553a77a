//! Top-level error type aggregating the errors of every subsystem.

use thiserror::Error;

use crate::probe::ProbeError;
use crate::settings::store::StoreError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Settings store error: {0}")]
    Store(#[from] StoreError),

    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Legacy error: {0}")]
    Anyhow(#[from] anyhow::Error),

    #[error("Application error: {message}")]
    Custom { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
        }
    }
}
