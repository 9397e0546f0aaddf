//! Error types for Kindred core operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading records or validating edits.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid family data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("person not found: {0}")]
    PersonNotFound(String),
}

impl CoreError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action: "read",
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action: "write",
            path: path.into(),
            source,
        }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
