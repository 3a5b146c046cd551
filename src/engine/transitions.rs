// src/engine/transitions.rs

//! Pure run state transitions.
//!
//! Everything here is synchronous and deterministic: no store, no processes,
//! the clock is passed in. The lifecycle manager feeds the results to the
//! store.

use std::path::Path;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::exec::naming::log_file_name;
use crate::store::model::{Project, Run};
use crate::types::RunStatus;

/// How a running run ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEnd {
    Completed,
    /// Carries the failure reason recorded on the run.
    Errored(String),
    Stopped,
}

impl RunEnd {
    pub fn status(&self) -> RunStatus {
        match self {
            RunEnd::Completed => RunStatus::Completed,
            RunEnd::Errored(_) => RunStatus::Errored,
            RunEnd::Stopped => RunStatus::Stopped,
        }
    }
}

/// Result of applying a change to a run.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The run was active and now carries the change.
    Applied(Run),
    /// The run had already ended; returned untouched.
    AlreadyTerminal(Run),
}

impl Transition {
    pub fn into_run(self) -> Run {
        match self {
            Transition::Applied(run) | Transition::AlreadyTerminal(run) => run,
        }
    }
}

/// A fresh `running` run for `project`, logging under `logs_dir`.
pub fn new_run(project: &Project, logs_dir: &Path, now: DateTime<Utc>) -> Run {
    Run {
        id: Uuid::new_v4(),
        project: project.id,
        date_start: now,
        date_end: None,
        status: RunStatus::Running,
        log: logs_dir.join(log_file_name(&project.name, now)),
        pid: None,
        failure: None,
    }
}

/// Record the pid of the launched pipeline.
///
/// A run that ended while its pipeline was starting keeps its terminal
/// record; the caller owns the orphaned process.
pub fn attach_pid(mut run: Run, pid: u32) -> Transition {
    if !run.is_active() {
        return Transition::AlreadyTerminal(run);
    }
    run.pid = Some(pid);
    Transition::Applied(run)
}

/// Move an active run to a terminal status.
///
/// The end timestamp is what decides whether a run is still active, so a run
/// with `date_end` set is never touched again, whatever its status says.
pub fn finish(mut run: Run, end: RunEnd, now: DateTime<Utc>) -> Transition {
    if !run.is_active() {
        return Transition::AlreadyTerminal(run);
    }

    run.status = end.status();
    run.date_end = Some(now);
    if let RunEnd::Errored(reason) = end {
        run.failure = Some(reason);
    }
    Transition::Applied(run)
}
