//! Error types for schema documentation generation

use std::path::PathBuf;

use thiserror::Error;

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, DocsError>;

/// Conversion errors
///
/// Every variant is fatal to the run: conversion is a single pass with no
/// retries and no partial-success mode.
#[derive(Error, Debug)]
pub enum DocsError {
    #[error("provided path \"{}\" does not exist", path.display())]
    PathNotFound { path: PathBuf },

    #[error("no schemas matching {pattern} found in {}", path.display())]
    NoSchemasFound { path: PathBuf, pattern: String },

    #[error("invalid file pattern: {0}")]
    Pattern(String),

    #[error("failed to decode schema {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to compile schema {url}: {reason}")]
    Compile { url: String, reason: String },

    #[error("unresolved reference {reference} in {from}")]
    UnresolvedRef { reference: String, from: String },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render {location}: {reason}")]
    Render { location: String, reason: String },

    #[error("configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl DocsError {
    /// Attach a path to an I/O error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
