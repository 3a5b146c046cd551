// src/store/model.rs

//! Project and run documents.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{PulserunError, Result};
use crate::types::{ProjectId, RunId, RunStatus};

/// A user-defined pipeline configuration plus the runs started from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    /// Taken from `process.name` in `config`.
    pub name: String,
    /// Raw pipeline configuration (JSON text), handed verbatim to the
    /// pipeline on stdin.
    pub config: String,
    pub creation_date: DateTime<Utc>,
    #[serde(default)]
    pub creation_user: Option<String>,
    /// Owned runs in creation order.
    #[serde(default)]
    pub runs: Vec<RunId>,
}

impl Project {
    /// Build a new project from its configuration text.
    pub fn from_config(config: impl Into<String>, creation_user: Option<String>) -> Result<Self> {
        let config = config.into();
        let name = name_from_config(&config)?;
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            config,
            creation_date: Utc::now(),
            creation_user,
            runs: Vec::new(),
        })
    }

    /// Replace the configuration, re-deriving the name.
    pub fn set_config(&mut self, config: impl Into<String>) -> Result<()> {
        let config = config.into();
        self.name = name_from_config(&config)?;
        self.config = config;
        Ok(())
    }
}

/// Extract `process.name` from a pipeline configuration.
pub fn name_from_config(config: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(config)
        .map_err(|e| PulserunError::InvalidProject(format!("configuration is not JSON: {e}")))?;

    match value.pointer("/process/name") {
        Some(serde_json::Value::String(name)) if !name.trim().is_empty() => Ok(name.clone()),
        Some(serde_json::Value::String(_)) => Err(PulserunError::InvalidProject(
            "process.name must not be blank".to_string(),
        )),
        Some(_) => Err(PulserunError::InvalidProject(
            "process.name must be a string".to_string(),
        )),
        None => Err(PulserunError::InvalidProject(
            "configuration has no process.name".to_string(),
        )),
    }
}

/// One execution attempt of a project's pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub project: ProjectId,
    pub date_start: DateTime<Utc>,
    /// `None` while the run is active.
    #[serde(default)]
    pub date_end: Option<DateTime<Utc>>,
    pub status: RunStatus,
    /// Absolute path of the file receiving the pipeline's stdout/stderr.
    pub log: PathBuf,
    /// Set once the pipeline process has been spawned.
    #[serde(default)]
    pub pid: Option<u32>,
    /// Why the run ended up `errored`, when known.
    #[serde(default)]
    pub failure: Option<String>,
}

impl Run {
    /// A run is active until it has an end timestamp.
    pub fn is_active(&self) -> bool {
        self.date_end.is_none()
    }
}
