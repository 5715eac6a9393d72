//! Error Handling Module
//!
//! Defines the error type for the dataset preparation pipeline.
//! Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for dataset preparation
#[derive(Error, Debug)]
pub enum PrepError {
    /// Metadata file missing on disk
    #[error("Metadata file not found: {0}")]
    MetadataNotFound(PathBuf),

    /// Header row lacks a required column
    #[error("Metadata header has no column named '{0}'")]
    MissingColumn(String),

    /// Error with dataset operations
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Copying an image into the class-folder tree failed
    #[error("Failed to copy '{src}' to '{dst}': {source}")]
    Copy {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Dataset acquisition failed
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<serde_json::Error> for PrepError {
    fn from(err: serde_json::Error) -> Self {
        PrepError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for PrepError {
    fn from(err: serde_yaml::Error) -> Self {
        PrepError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for PrepError {
    fn from(err: toml::de::Error) -> Self {
        PrepError::Config(err.to_string())
    }
}

/// Convenience Result type for dataset preparation
pub type Result<T> = std::result::Result<T, PrepError>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| PrepError::InvalidInput(format!("{}: {}", f(), e)))
    }
}

impl<T> ResultExt<T> for Option<T> {
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.ok_or_else(|| PrepError::InvalidInput(f()))
    }
}
