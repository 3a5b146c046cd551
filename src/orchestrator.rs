// src/orchestrator.rs

//! The run orchestrator: one lifecycle manager plus one tail broker sharing a
//! store.
//!
//! This is the value handed to whatever exposes runs to clients (the CLI, a
//! socket layer). The observer registry lives inside the broker and is owned
//! by this instance, not by the process.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::ConfigFile;
use crate::engine::{LaunchSettings, RunManager};
use crate::errors::Result;
use crate::exec::ProcessBackend;
use crate::observer::{spawn_session, ObserverEvent, ObserverSessionHandle};
use crate::store::{Project, Run, RunStore};
use crate::tail::{TailBroker, TailFeed, TailSettings};
use crate::types::{ObserverId, ProjectId, RunId};

#[derive(Debug)]
pub struct Orchestrator<S: RunStore, B: ProcessBackend> {
    runs: RunManager<S, B>,
    tails: Arc<TailBroker<S>>,
}

impl<S: RunStore, B: ProcessBackend> Orchestrator<S, B> {
    pub fn new(
        store: Arc<S>,
        backend: Arc<B>,
        launch: LaunchSettings,
        tail: TailSettings,
    ) -> Self {
        let tails = Arc::new(TailBroker::new(Arc::clone(&store), tail));
        Self {
            runs: RunManager::new(store, backend, launch),
            tails,
        }
    }

    pub fn from_config(cfg: &ConfigFile, store: Arc<S>, backend: Arc<B>) -> Self {
        Self::new(
            store,
            backend,
            LaunchSettings::from(cfg),
            TailSettings::from(&cfg.tail),
        )
    }

    pub fn runs(&self) -> &RunManager<S, B> {
        &self.runs
    }

    pub fn tails(&self) -> &Arc<TailBroker<S>> {
        &self.tails
    }

    pub async fn create_project(
        &self,
        config: impl Into<String>,
        creation_user: Option<String>,
    ) -> Result<Project> {
        self.runs.create_project(config, creation_user).await
    }

    pub async fn update_project(
        &self,
        project_id: ProjectId,
        config: impl Into<String>,
    ) -> Result<Project> {
        self.runs.update_project(project_id, config).await
    }

    pub async fn get_project(&self, project_id: ProjectId) -> Result<Project> {
        self.runs.get_project(project_id).await
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        self.runs.list_projects().await
    }

    /// Delete a project whose runs have all ended, closing any live feeds on
    /// those runs.
    pub async fn delete_project(&self, project_id: ProjectId) -> Result<Vec<RunId>> {
        let deleted = self.runs.delete_project(project_id).await?;
        for run_id in &deleted {
            self.tails.close_run_tails(*run_id);
        }
        Ok(deleted)
    }

    pub async fn start_run(&self, project_id: ProjectId) -> Result<Run> {
        self.runs.start_run(project_id).await
    }

    pub async fn stop_run(&self, run_id: RunId) -> Result<Run> {
        self.runs.stop_run(run_id).await
    }

    pub async fn mark_completed(&self, run_id: RunId) -> Result<Run> {
        self.runs.mark_completed(run_id).await
    }

    pub async fn mark_errored(&self, run_id: RunId, reason: impl Into<String>) -> Result<Run> {
        self.runs.mark_errored(run_id, reason).await
    }

    pub async fn get_run(&self, run_id: RunId) -> Result<Run> {
        self.runs.get_run(run_id).await
    }

    pub async fn project_runs(&self, project_id: ProjectId) -> Result<Vec<Run>> {
        self.runs.project_runs(project_id).await
    }

    pub async fn open_tail(&self, observer: ObserverId, run_id: RunId) -> Result<TailFeed> {
        self.tails.open_tail(observer, run_id).await
    }

    pub fn close_tail(&self, observer: ObserverId, run_id: Option<RunId>) -> usize {
        self.tails.close_tail(observer, run_id)
    }

    /// Start an observer session for a new transport connection.
    pub fn open_session(&self, events: mpsc::Sender<ObserverEvent>) -> ObserverSessionHandle {
        spawn_session(Arc::clone(&self.tails), events)
    }
}
