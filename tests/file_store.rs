// tests/file_store.rs

mod common;
use crate::common::builders::project_config;
use crate::common::init_tracing;

use std::error::Error;
use std::fs;

use chrono::Utc;
use pulserun::engine::transitions::{attach_pid, finish, new_run, RunEnd};
use pulserun::engine::Transition;
use pulserun::errors::PulserunError;
use pulserun::store::{JsonFileStore, Project, RunStore};
use pulserun::types::RunStatus;
use tempfile::tempdir;
use uuid::Uuid;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn documents_survive_reopening() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let project = Project::from_config(project_config("demo"), Some("bob".to_string()))?;

    let run = {
        let store = JsonFileStore::open(dir.path()).await?;
        store.create_project(project.clone()).await?;
        let run = store
            .create_run(new_run(&project, &dir.path().join("logs"), Utc::now()))
            .await?;
        let now = Utc::now();
        store
            .modify_run(run.id, move |run| finish(run, RunEnd::Errored("boom".to_string()), now))
            .await?
            .into_run()
    };

    let store = JsonFileStore::open(dir.path()).await?;
    let loaded = store.get_project(project.id).await?;
    assert_eq!(loaded.name, "demo");
    assert_eq!(loaded.creation_user.as_deref(), Some("bob"));
    assert_eq!(loaded.runs, vec![run.id]);

    let loaded_run = store.get_run(run.id).await?;
    assert_eq!(loaded_run, run);
    assert_eq!(loaded_run.status, RunStatus::Errored);
    assert_eq!(loaded_run.failure.as_deref(), Some("boom"));
    assert_eq!(store.list_runs_by_project(project.id).await?, vec![run]);
    Ok(())
}

#[tokio::test]
async fn documents_are_plain_json_files() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let store = JsonFileStore::open(dir.path()).await?;
    let project = store
        .create_project(Project::from_config(project_config("demo"), None)?)
        .await?;

    let path = dir.path().join("projects").join(format!("{}.json", project.id));
    let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    assert_eq!(doc["name"], "demo");
    assert_eq!(doc["runs"], serde_json::json!([]));

    // Nothing but the document itself is left behind.
    let entries = fs::read_dir(dir.path().join("projects"))?.count();
    assert_eq!(entries, 1);
    Ok(())
}

#[tokio::test]
async fn missing_documents_are_not_found() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let store = JsonFileStore::open(dir.path()).await?;
    let id = Uuid::new_v4();

    assert!(matches!(
        store.get_project(id).await,
        Err(PulserunError::NotFound { kind: "project", .. })
    ));
    assert!(matches!(
        store.get_run(id).await,
        Err(PulserunError::NotFound { kind: "run", .. })
    ));
    assert!(matches!(
        store.delete_project(id).await,
        Err(PulserunError::NotFound { .. })
    ));

    let orphan = Project::from_config(project_config("ghost"), None)?;
    let err = store
        .create_run(new_run(&orphan, dir.path(), Utc::now()))
        .await
        .unwrap_err();
    assert!(matches!(err, PulserunError::NotFound { kind: "project", .. }));
    Ok(())
}

#[tokio::test]
async fn ended_runs_are_not_rewritten() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let store = JsonFileStore::open(dir.path()).await?;
    let project = store
        .create_project(Project::from_config(project_config("demo"), None)?)
        .await?;
    let run = store
        .create_run(new_run(&project, &dir.path().join("logs"), Utc::now()))
        .await?;

    let now = Utc::now();
    let stopped = match store
        .modify_run(run.id, move |run| finish(run, RunEnd::Stopped, now))
        .await?
    {
        Transition::Applied(run) => run,
        other => panic!("Expected Applied, got: {other:?}"),
    };

    let late_pid = store.modify_run(run.id, |run| attach_pid(run, 4321)).await?;
    assert_eq!(late_pid, Transition::AlreadyTerminal(stopped.clone()));
    assert_eq!(store.get_run(run.id).await?, stopped);

    let missing = store
        .modify_run(Uuid::new_v4(), |run| attach_pid(run, 1))
        .await
        .unwrap_err();
    assert!(matches!(missing, PulserunError::NotFound { kind: "run", .. }));
    Ok(())
}

#[tokio::test]
async fn deleting_a_run_unlinks_it_from_its_project() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let store = JsonFileStore::open(dir.path()).await?;
    let project = store
        .create_project(Project::from_config(project_config("demo"), None)?)
        .await?;
    let a = store.create_run(new_run(&project, dir.path(), Utc::now())).await?;
    let b = store.create_run(new_run(&project, dir.path(), Utc::now())).await?;

    store.delete_run(a.id).await?;

    assert_eq!(store.get_project(project.id).await?.runs, vec![b.id]);
    assert_eq!(store.list_runs_by_project(project.id).await?, vec![b]);
    Ok(())
}

#[tokio::test]
async fn corrupt_documents_are_skipped_when_listing() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let store = JsonFileStore::open(dir.path()).await?;
    let first = store
        .create_project(Project::from_config(project_config("first"), None)?)
        .await?;
    let second = store
        .create_project(Project::from_config(project_config("second"), None)?)
        .await?;
    fs::write(dir.path().join("projects").join("broken.json"), "{ not json")?;
    fs::write(dir.path().join("projects").join("notes.txt"), "ignored")?;

    let names: Vec<String> = store
        .list_projects()
        .await?
        .into_iter()
        .map(|p| p.name)
        .collect();

    assert_eq!(names, vec![first.name, second.name]);
    Ok(())
}
