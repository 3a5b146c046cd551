#![allow(dead_code)]

pub use pulserun_test_utils::{builders, eventually, fake_backend, init_tracing, with_timeout};
#[cfg(unix)]
pub use pulserun_test_utils::scripts;

use std::sync::Arc;

use pulserun::engine::{LaunchSettings, RunManager};
use pulserun::store::{MemoryStore, Project, RunStore};

use self::builders::project_config;
use self::fake_backend::FakeBackend;

pub type FakeManager = RunManager<MemoryStore, FakeBackend>;

/// A run manager over an in-memory store and a fake backend.
pub fn fake_manager(backend: FakeBackend) -> (FakeManager, Arc<MemoryStore>, Arc<FakeBackend>) {
    let store = Arc::new(MemoryStore::new());
    let backend = Arc::new(backend);
    let settings = LaunchSettings::new(
        "/opt/crowd-pulse/bin/crowd-pulse",
        Some("crowd-pulse".to_string()),
        "/var/log/crowd-pulse",
    );
    let manager = RunManager::new(Arc::clone(&store), Arc::clone(&backend), settings);
    (manager, store, backend)
}

/// Store a project called `name` directly, bypassing any manager.
pub async fn seed_project<S: RunStore>(store: &S, name: &str) -> Project {
    let project = Project::from_config(project_config(name), Some("tester".to_string()))
        .expect("valid project config");
    store.create_project(project).await.expect("create project")
}
