// src/engine/lifecycle.rs

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::config::ConfigFile;
use crate::engine::transitions::{self, RunEnd, Transition};
use crate::errors::{PulserunError, Result};
use crate::exec::{LaunchRequest, ProcessBackend};
use crate::store::{Project, Run, RunStore};
use crate::types::{ProjectId, RunId, SignalOutcome};

/// Where and how runs are launched.
#[derive(Debug, Clone)]
pub struct LaunchSettings {
    pub executable: PathBuf,
    pub database: Option<String>,
    /// Directory receiving run logs. Made absolute on construction when
    /// possible, so run records carry absolute log paths.
    pub logs_dir: PathBuf,
}

impl LaunchSettings {
    pub fn new(
        executable: impl Into<PathBuf>,
        database: Option<String>,
        logs_dir: impl Into<PathBuf>,
    ) -> Self {
        let logs_dir = logs_dir.into();
        let logs_dir = std::path::absolute(&logs_dir).unwrap_or(logs_dir);
        Self {
            executable: executable.into(),
            database,
            logs_dir,
        }
    }
}

impl From<&ConfigFile> for LaunchSettings {
    fn from(cfg: &ConfigFile) -> Self {
        LaunchSettings::new(
            cfg.pipeline.executable.clone(),
            cfg.pipeline.database.clone(),
            cfg.logs.path.clone(),
        )
    }
}

/// Drives runs through `running → {completed, errored, stopped}`.
///
/// Each call is independent: nothing serializes launches of different runs,
/// and the only shared state is the store.
#[derive(Debug)]
pub struct RunManager<S: RunStore, B: ProcessBackend> {
    store: Arc<S>,
    backend: Arc<B>,
    settings: LaunchSettings,
}

impl<S: RunStore, B: ProcessBackend> Clone for RunManager<S, B> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            backend: Arc::clone(&self.backend),
            settings: self.settings.clone(),
        }
    }
}

impl<S: RunStore, B: ProcessBackend> RunManager<S, B> {
    pub fn new(store: Arc<S>, backend: Arc<B>, settings: LaunchSettings) -> Self {
        Self {
            store,
            backend,
            settings,
        }
    }

    pub fn settings(&self) -> &LaunchSettings {
        &self.settings
    }

    /// Create a run for `project_id` and launch its pipeline.
    ///
    /// On success the returned run is `running` with a pid. If the run was
    /// stopped or reported while its pipeline was starting, that terminal
    /// record is returned and the new process is terminated. If the process
    /// cannot be started, the run is persisted as `errored` (end timestamp
    /// set) and returned inside `PulserunError::LaunchFailure` together with
    /// the original error. If the log directory cannot be created, no run
    /// record is written at all.
    pub async fn start_run(&self, project_id: ProjectId) -> Result<Run> {
        let project = self.store.get_project(project_id).await?;
        self.backend.ensure_log_dir(&self.settings.logs_dir).await?;

        let run = transitions::new_run(&project, &self.settings.logs_dir, Utc::now());
        let run = self.store.create_run(run).await?;
        info!(
            project = %project.id,
            run_id = %run.id,
            log = %run.log.display(),
            "created run"
        );

        let request = LaunchRequest {
            executable: self.settings.executable.clone(),
            run_id: Some(run.id),
            log: Some(run.log.clone()),
            database: self.settings.database.clone(),
            configuration: project.config.clone(),
        };

        let pid = match self.backend.launch(request).await {
            Ok(pid) => pid,
            Err(err) => return Err(self.reconcile_launch_failure(run, err).await),
        };

        let run_id = run.id;
        let recorded = self
            .store
            .modify_run(run_id, move |run| transitions::attach_pid(run, pid))
            .await;

        match recorded {
            Ok(Transition::Applied(run)) => {
                info!(run_id = %run.id, pid, "run started");
                Ok(run)
            }
            Ok(Transition::AlreadyTerminal(run)) => {
                // Stopped or reported while launching: nobody else knows this pid.
                warn!(
                    run_id = %run.id,
                    pid,
                    status = %run.status,
                    "run ended during launch; terminating pipeline"
                );
                self.backend.terminate(pid).await;
                Ok(run)
            }
            Err(err) => {
                // A process we cannot account for must not keep running.
                error!(
                    run_id = %run_id,
                    pid,
                    error = %err,
                    "could not record pid; terminating pipeline"
                );
                self.backend.terminate(pid).await;
                Err(self.reconcile_launch_failure(run, err).await)
            }
        }
    }

    /// Mark `run` errored after a failed launch and build the error returned
    /// to the caller. A run that already ended keeps its first terminal
    /// status.
    async fn reconcile_launch_failure(&self, run: Run, err: PulserunError) -> PulserunError {
        error!(run_id = %run.id, error = %err, "pipeline launch failed");

        let end = RunEnd::Errored(err.to_string());
        let now = Utc::now();
        let errored = match self
            .store
            .modify_run(run.id, {
                let end = end.clone();
                move |run| transitions::finish(run, end, now)
            })
            .await
        {
            Ok(transition) => transition.into_run(),
            Err(store_err) => {
                warn!(
                    run_id = %run.id,
                    error = %store_err,
                    "could not persist errored run"
                );
                transitions::finish(run, end, now).into_run()
            }
        };

        PulserunError::LaunchFailure {
            run: Box::new(errored),
            source: Box::new(err),
        }
    }

    /// Stop a run: mark it `stopped`, then ask its process to terminate.
    ///
    /// Idempotent: a run that already has an end timestamp is returned as-is
    /// and no signal is sent. A process that has already exited is not an
    /// error.
    pub async fn stop_run(&self, run_id: RunId) -> Result<Run> {
        let now = Utc::now();
        let transition = self
            .store
            .modify_run(run_id, move |run| transitions::finish(run, RunEnd::Stopped, now))
            .await?;

        let run = match transition {
            Transition::AlreadyTerminal(run) => {
                debug!(run_id = %run.id, status = %run.status, "stop requested for ended run");
                return Ok(run);
            }
            Transition::Applied(run) => run,
        };

        match run.pid {
            Some(pid) => match self.backend.terminate(pid).await {
                SignalOutcome::Delivered => info!(run_id = %run.id, pid, "run stopped"),
                SignalOutcome::AlreadyExited => {
                    info!(run_id = %run.id, pid, "run stopped; process had already exited")
                }
                SignalOutcome::Failed(reason) => {
                    warn!(run_id = %run.id, pid, reason = %reason, "run stopped; signalling failed")
                }
            },
            // The launch in flight sees the terminal record and terminates it.
            None => info!(run_id = %run.id, "run stopped before its pid was recorded"),
        }

        Ok(run)
    }

    /// Report that the pipeline finished successfully.
    pub async fn mark_completed(&self, run_id: RunId) -> Result<Run> {
        self.end_run(run_id, RunEnd::Completed).await
    }

    /// Report that the pipeline failed.
    pub async fn mark_errored(&self, run_id: RunId, reason: impl Into<String>) -> Result<Run> {
        self.end_run(run_id, RunEnd::Errored(reason.into())).await
    }

    async fn end_run(&self, run_id: RunId, end: RunEnd) -> Result<Run> {
        let status = end.status();
        let now = Utc::now();
        let transition = self
            .store
            .modify_run(run_id, move |run| transitions::finish(run, end, now))
            .await?;

        match transition {
            Transition::Applied(run) => {
                info!(run_id = %run.id, %status, "run ended");
                Ok(run)
            }
            Transition::AlreadyTerminal(run) => {
                debug!(
                    run_id = %run.id,
                    current = %run.status,
                    requested = %status,
                    "run already ended; keeping first terminal status"
                );
                Ok(run)
            }
        }
    }

    /// Delete a project and its run records.
    ///
    /// Fails with `Conflict`, changing nothing, while any run of the project
    /// lacks an end timestamp. Returns the ids of the deleted runs.
    pub async fn delete_project(&self, project_id: ProjectId) -> Result<Vec<RunId>> {
        let project = self.store.get_project(project_id).await?;
        let runs = self.store.list_runs_by_project(project_id).await?;

        let active = runs.iter().filter(|r| r.is_active()).count();
        if active > 0 {
            return Err(PulserunError::Conflict(format!(
                "project '{}' has {active} active run(s) and can't be deleted",
                project.name
            )));
        }

        let mut deleted = Vec::with_capacity(runs.len());
        for run in runs {
            self.store.delete_run(run.id).await?;
            deleted.push(run.id);
        }
        self.store.delete_project(project_id).await?;

        info!(project = %project_id, runs = deleted.len(), "project deleted");
        Ok(deleted)
    }

    /// Create a project from its pipeline configuration.
    pub async fn create_project(
        &self,
        config: impl Into<String>,
        creation_user: Option<String>,
    ) -> Result<Project> {
        let project = Project::from_config(config, creation_user)?;
        let project = self.store.create_project(project).await?;
        info!(project = %project.id, name = %project.name, "project created");
        Ok(project)
    }

    /// Replace a project's configuration (and therefore its name).
    pub async fn update_project(
        &self,
        project_id: ProjectId,
        config: impl Into<String>,
    ) -> Result<Project> {
        let mut project = self.store.get_project(project_id).await?;
        project.set_config(config)?;
        let project = self.store.update_project(project).await?;
        debug!(project = %project.id, name = %project.name, "project updated");
        Ok(project)
    }

    pub async fn get_project(&self, project_id: ProjectId) -> Result<Project> {
        self.store.get_project(project_id).await
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        self.store.list_projects().await
    }

    pub async fn get_run(&self, run_id: RunId) -> Result<Run> {
        self.store.get_run(run_id).await
    }

    pub async fn project_runs(&self, project_id: ProjectId) -> Result<Vec<Run>> {
        self.store.list_runs_by_project(project_id).await
    }
}
