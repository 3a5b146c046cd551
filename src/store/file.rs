// src/store/file.rs

//! JSON-document-per-file store.
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/projects/<project-id>.json
//! <root>/runs/<run-id>.json
//! ```
//!
//! Documents are written to a temporary sibling and renamed into place, so a
//! reader never sees a half-written file. Writes, including the
//! read-modify-write of `modify_run` and multi-document updates (creating a
//! run also rewrites its project), are serialized by an in-process lock; the
//! store does not coordinate between processes.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use super::model::{Project, Run};
use super::RunStore;
use crate::engine::Transition;
use crate::errors::{PulserunError, Result};
use crate::types::{ProjectId, RunId};

const PROJECTS_DIR: &str = "projects";
const RUNS_DIR: &str = "runs";

#[derive(Debug)]
pub struct JsonFileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(PROJECTS_DIR)).await?;
        fs::create_dir_all(root.join(RUNS_DIR)).await?;
        debug!(root = %root.display(), "opened JSON store");
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn project_path(&self, id: ProjectId) -> PathBuf {
        self.root.join(PROJECTS_DIR).join(format!("{id}.json"))
    }

    fn run_path(&self, id: RunId) -> PathBuf {
        self.root.join(RUNS_DIR).join(format!("{id}.json"))
    }

    async fn read_project(&self, id: ProjectId) -> Result<Project> {
        read_doc(&self.project_path(id))
            .await?
            .ok_or_else(|| PulserunError::not_found("project", id))
    }

    async fn read_run(&self, id: RunId) -> Result<Run> {
        read_doc(&self.run_path(id))
            .await?
            .ok_or_else(|| PulserunError::not_found("run", id))
    }
}

async fn read_doc<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_doc<T: Serialize>(path: &Path, doc: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(doc)?;
    let tmp = path.with_extension(format!("json.{}.tmp", Uuid::new_v4()));
    fs::write(&tmp, &bytes).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

async fn remove_doc(path: &Path) -> Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Read every `*.json` document in a directory, skipping unreadable ones.
async fn read_all<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut docs = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        match read_doc::<T>(&path).await {
            Ok(Some(doc)) => docs.push(doc),
            Ok(None) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable document"),
        }
    }
    Ok(docs)
}

#[async_trait]
impl RunStore for JsonFileStore {
    async fn create_project(&self, project: Project) -> Result<Project> {
        let _guard = self.write_lock.lock().await;
        let path = self.project_path(project.id);
        if fs::try_exists(&path).await? {
            return Err(PulserunError::Conflict(format!(
                "project {} already exists",
                project.id
            )));
        }
        write_doc(&path, &project).await?;
        Ok(project)
    }

    async fn get_project(&self, id: ProjectId) -> Result<Project> {
        self.read_project(id).await
    }

    async fn update_project(&self, project: Project) -> Result<Project> {
        let _guard = self.write_lock.lock().await;
        // Fail with NotFound rather than silently creating the document.
        self.read_project(project.id).await?;
        write_doc(&self.project_path(project.id), &project).await?;
        Ok(project)
    }

    async fn delete_project(&self, id: ProjectId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if remove_doc(&self.project_path(id)).await? {
            Ok(())
        } else {
            Err(PulserunError::not_found("project", id))
        }
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        let mut projects: Vec<Project> = read_all(&self.root.join(PROJECTS_DIR)).await?;
        projects.sort_by_key(|p| p.creation_date);
        Ok(projects)
    }

    async fn create_run(&self, run: Run) -> Result<Run> {
        let _guard = self.write_lock.lock().await;
        let mut project = self.read_project(run.project).await?;
        write_doc(&self.run_path(run.id), &run).await?;
        project.runs.push(run.id);
        write_doc(&self.project_path(project.id), &project).await?;
        Ok(run)
    }

    async fn get_run(&self, id: RunId) -> Result<Run> {
        self.read_run(id).await
    }

    async fn modify_run<F>(&self, id: RunId, change: F) -> Result<Transition>
    where
        F: FnOnce(Run) -> Transition + Send,
    {
        let _guard = self.write_lock.lock().await;
        let transition = change(self.read_run(id).await?);
        if let Transition::Applied(run) = &transition {
            write_doc(&self.run_path(id), run).await?;
        }
        Ok(transition)
    }

    async fn delete_run(&self, id: RunId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let run = self.read_run(id).await?;
        remove_doc(&self.run_path(id)).await?;

        match self.read_project(run.project).await {
            Ok(mut project) => {
                project.runs.retain(|r| *r != id);
                write_doc(&self.project_path(project.id), &project).await?;
            }
            Err(PulserunError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }
        Ok(())
    }

    async fn list_runs_by_project(&self, project: ProjectId) -> Result<Vec<Run>> {
        let owner = self.read_project(project).await?;
        let mut runs = Vec::with_capacity(owner.runs.len());
        for id in owner.runs {
            match self.read_run(id).await {
                Ok(run) => runs.push(run),
                Err(PulserunError::NotFound { .. }) => {
                    warn!(project = %project, run_id = %id, "project references a missing run");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(runs)
    }
}
