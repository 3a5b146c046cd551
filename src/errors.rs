// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

use crate::store::model::Run;

#[derive(Error, Debug)]
pub enum PulserunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid project configuration: {0}")]
    InvalidProject(String),

    /// The log directory could not be created; no run record was written.
    #[error("could not create log directory {path:?}: {source}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The pipeline executable could not be spawned.
    #[error("could not spawn {executable:?}: {source}")]
    Spawn {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A run was created but its process never started. `run` is the
    /// persisted record, already moved to `errored`.
    #[error("run {} failed to launch: {source}", run.id)]
    LaunchFailure {
        run: Box<Run>,
        #[source]
        source: Box<PulserunError>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PulserunError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        PulserunError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PulserunError>;
