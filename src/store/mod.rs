// src/store/mod.rs

//! Persistence of project and run documents.
//!
//! The orchestrator only talks to a [`RunStore`]; where the documents live is
//! up to the implementation:
//!
//! - [`memory::MemoryStore`] keeps everything in process (tests, embedding).
//! - [`file::JsonFileStore`] writes one JSON document per project/run under a
//!   directory (used by the CLI).
//!
//! No transaction spans a create + launch sequence. The lifecycle manager
//! reconciles launch failures itself, and every change to an existing run
//! goes through [`RunStore::modify_run`] so concurrent stop, report, and
//! launch completion never overwrite each other.

use async_trait::async_trait;

use crate::engine::Transition;
use crate::errors::Result;
use crate::types::{ProjectId, RunId};

pub mod file;
pub mod memory;
pub mod model;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use model::{Project, Run};

/// Document store for projects and their runs.
///
/// Lookups of unknown ids fail with `PulserunError::NotFound`.
#[async_trait]
pub trait RunStore: Send + Sync + 'static {
    async fn create_project(&self, project: Project) -> Result<Project>;
    async fn get_project(&self, id: ProjectId) -> Result<Project>;
    async fn update_project(&self, project: Project) -> Result<Project>;
    async fn delete_project(&self, id: ProjectId) -> Result<()>;
    async fn list_projects(&self) -> Result<Vec<Project>>;

    /// Persist a new run and append its id to the owning project's run list.
    async fn create_run(&self, run: Run) -> Result<Run>;
    async fn get_run(&self, id: RunId) -> Result<Run>;
    /// Apply `change` to the stored run, with no other write to that run in
    /// between. An `Applied` result is persisted; `AlreadyTerminal` leaves
    /// the document as it was.
    async fn modify_run<F>(&self, id: RunId, change: F) -> Result<Transition>
    where
        F: FnOnce(Run) -> Transition + Send;
    async fn delete_run(&self, id: RunId) -> Result<()>;

    /// All runs owned by a project, oldest first.
    async fn list_runs_by_project(&self, project: ProjectId) -> Result<Vec<Run>>;
}
