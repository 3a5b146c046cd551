// src/store/memory.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::model::{Project, Run};
use super::RunStore;
use crate::engine::Transition;
use crate::errors::{PulserunError, Result};
use crate::types::{ProjectId, RunId};

#[derive(Debug, Default)]
struct MemoryState {
    projects: HashMap<ProjectId, Project>,
    runs: HashMap<RunId, Run>,
}

/// In-process store. Clones share the same documents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RunStore for MemoryStore {
    async fn create_project(&self, project: Project) -> Result<Project> {
        let mut state = self.state();
        if state.projects.contains_key(&project.id) {
            return Err(PulserunError::Conflict(format!(
                "project {} already exists",
                project.id
            )));
        }
        state.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn get_project(&self, id: ProjectId) -> Result<Project> {
        self.state()
            .projects
            .get(&id)
            .cloned()
            .ok_or_else(|| PulserunError::not_found("project", id))
    }

    async fn update_project(&self, project: Project) -> Result<Project> {
        let mut state = self.state();
        match state.projects.get_mut(&project.id) {
            Some(slot) => {
                *slot = project.clone();
                Ok(project)
            }
            None => Err(PulserunError::not_found("project", project.id)),
        }
    }

    async fn delete_project(&self, id: ProjectId) -> Result<()> {
        self.state()
            .projects
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| PulserunError::not_found("project", id))
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        let mut projects: Vec<Project> = self.state().projects.values().cloned().collect();
        projects.sort_by_key(|p| p.creation_date);
        Ok(projects)
    }

    async fn create_run(&self, run: Run) -> Result<Run> {
        let mut state = self.state();
        let Some(project) = state.projects.get_mut(&run.project) else {
            return Err(PulserunError::not_found("project", run.project));
        };
        project.runs.push(run.id);
        state.runs.insert(run.id, run.clone());
        Ok(run)
    }

    async fn get_run(&self, id: RunId) -> Result<Run> {
        self.state()
            .runs
            .get(&id)
            .cloned()
            .ok_or_else(|| PulserunError::not_found("run", id))
    }

    async fn modify_run<F>(&self, id: RunId, change: F) -> Result<Transition>
    where
        F: FnOnce(Run) -> Transition + Send,
    {
        let mut state = self.state();
        let slot = state
            .runs
            .get_mut(&id)
            .ok_or_else(|| PulserunError::not_found("run", id))?;

        let transition = change(slot.clone());
        if let Transition::Applied(run) = &transition {
            *slot = run.clone();
        }
        Ok(transition)
    }

    async fn delete_run(&self, id: RunId) -> Result<()> {
        let mut state = self.state();
        let Some(run) = state.runs.remove(&id) else {
            return Err(PulserunError::not_found("run", id));
        };
        if let Some(project) = state.projects.get_mut(&run.project) {
            project.runs.retain(|r| *r != id);
        }
        Ok(())
    }

    async fn list_runs_by_project(&self, project: ProjectId) -> Result<Vec<Run>> {
        let state = self.state();
        let owner = state
            .projects
            .get(&project)
            .ok_or_else(|| PulserunError::not_found("project", project))?;

        Ok(owner
            .runs
            .iter()
            .filter_map(|id| state.runs.get(id).cloned())
            .collect())
    }
}
