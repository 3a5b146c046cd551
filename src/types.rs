// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ProjectId = Uuid;
pub type RunId = Uuid;

/// Identity of one transport connection watching run logs.
pub type ObserverId = Uuid;

/// Lifecycle status of a run.
///
/// - `Running`: the record exists and the pipeline process was (or is being)
///   launched.
/// - `Completed`, `Errored`, `Stopped`: terminal; once a run reaches one of
///   these it never changes again.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Running,
    Completed,
    Errored,
    Stopped,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunStatus::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Errored => "errored",
            RunStatus::Stopped => "stopped",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "running" => Ok(RunStatus::Running),
            "completed" => Ok(RunStatus::Completed),
            "errored" => Ok(RunStatus::Errored),
            "stopped" => Ok(RunStatus::Stopped),
            other => Err(format!(
                "invalid run status: {other} (expected running, completed, errored or stopped)"
            )),
        }
    }
}

/// Result of asking the OS to terminate a process.
///
/// Signalling is best-effort: none of these outcomes is an error for the
/// caller, they only decide what gets logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalOutcome {
    Delivered,
    /// The process was already gone (`ESRCH`).
    AlreadyExited,
    Failed(String),
}
