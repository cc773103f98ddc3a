//! Store error types.
//!
//! Every store operation returns a structured error with a user-facing
//! message and an optional remediation hint.

use std::path::PathBuf;

use minrand_model::{ConfigurationError, RandomizationError};
use thiserror::Error;

/// Project store operation error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// File I/O error.
    #[error("Failed to {operation} file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid project key '{key}': {reason}")]
    InvalidKey { key: String, reason: &'static str },

    #[error("Project '{key}' not found")]
    NotFound { key: String },

    #[error("Project '{key}' already exists")]
    AlreadyExists { key: String },

    /// The stored project changed between load and commit.
    #[error("Project '{key}' was modified concurrently")]
    Concurrency { key: String },

    /// A lock file outlived its timeout while its owner is still running.
    #[error("Project lock is held: {path}")]
    Locked { path: PathBuf },

    #[error("Failed to serialize project data")]
    Serialization {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to deserialize project data: {path}")]
    Deserialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Temp file could not be renamed over the project file.
    #[error("Failed to complete save operation")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored document does not describe a usable project.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The update applied inside a transaction failed.
    #[error(transparent)]
    Randomization(#[from] RandomizationError),
}

impl StoreError {
    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Io {
                operation, path, ..
            } => format!("Could not {} the file at {}", operation, path.display()),
            Self::InvalidKey { key, reason } => {
                format!("'{key}' cannot be used as a project name: {reason}")
            }
            Self::NotFound { key } => format!("There is no project named '{key}'."),
            Self::AlreadyExists { key } => format!("A project named '{key}' already exists."),
            Self::Concurrency { key } => format!(
                "Project '{key}' was changed by someone else while this operation was running. \
                Nothing was saved."
            ),
            Self::Locked { path } => format!(
                "The project is locked by a writer that has not finished: {}",
                path.display()
            ),
            Self::Serialization { .. } => {
                "An error occurred while saving the project data.".to_string()
            }
            Self::Deserialization { path, .. } => format!(
                "The project file at {} could not be read. The file may be corrupted.",
                path.display()
            ),
            Self::AtomicWriteFailed { target_path, .. } => format!(
                "Could not save the file to {}. Please check disk space and permissions.",
                target_path.display()
            ),
            Self::Configuration(err) => format!("The stored project is invalid: {err}"),
            Self::Randomization(err) => err.to_string(),
        }
    }

    /// Get a suggestion for how to resolve this error.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Io { operation, .. } => {
                if *operation == "read" {
                    Some("Check that the file exists and you have permission to read it.".into())
                } else {
                    Some("Check that you have permission to write to this location.".into())
                }
            }
            Self::InvalidKey { .. } => Some(
                "Use letters, digits, '-' and '_' only, starting with a letter or digit.".into(),
            ),
            Self::NotFound { .. } => Some("Run `minrand list` to see stored projects.".into()),
            Self::AlreadyExists { .. } => {
                Some("Choose another project name or remove the existing file.".into())
            }
            Self::Concurrency { .. } => Some("Run the command again.".into()),
            Self::Locked { path } => Some(format!(
                "If no other minrand command is running, delete {} and try again.",
                path.display()
            )),
            Self::Serialization { .. } | Self::Randomization(_) => None,
            Self::Deserialization { .. } | Self::Configuration(_) => {
                Some("Restore the project file from a backup if you have one.".into())
            }
            Self::AtomicWriteFailed { .. } => {
                Some("Free up disk space or try saving to a different location.".into())
            }
        }
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
