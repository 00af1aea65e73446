//! Error types.
//!
//! "No alias applies" is never an error: matching reports it as `None`.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or normalizing a path mapping.
#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot read path mapping {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed path mapping {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid alias pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("invalid target for alias {pattern:?}: {reason}")]
    InvalidTarget { pattern: String, reason: String },
}

/// Failure reported by a host's module resolution function.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Cannot find module '{request}'")]
    NotFound { request: String },

    /// Any other host-specific failure.
    #[error("{0}")]
    Host(String),
}

impl ResolveError {
    #[must_use]
    pub fn not_found(request: impl Into<String>) -> Self {
        Self::NotFound {
            request: request.into(),
        }
    }
}
