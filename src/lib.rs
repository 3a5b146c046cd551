// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod observer;
pub mod orchestrator;
pub mod store;
pub mod tail;
pub mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, Command, ProjectCommand, RunCommand};
use crate::config::loader::load_and_validate;
use crate::errors::PulserunError;
use crate::exec::RealProcessBackend;
use crate::observer::ObserverEvent;
use crate::orchestrator::Orchestrator;
use crate::store::JsonFileStore;
use crate::types::RunId;

type CliOrchestrator = Orchestrator<JsonFileStore, RealProcessBackend>;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the JSON document store under `[store].path`
/// - the real process backend
/// - one subcommand, whose result is printed to stdout
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    debug!(
        executable = %cfg.pipeline.executable.display(),
        logs = %cfg.logs.path.display(),
        store = %cfg.store.path.display(),
        "config loaded"
    );

    let store = Arc::new(JsonFileStore::open(cfg.store.path.clone()).await?);
    let orchestrator = Orchestrator::from_config(&cfg, store, Arc::new(RealProcessBackend::new()));

    match args.command {
        Command::Project(cmd) => project_command(&orchestrator, cmd).await,
        Command::Run(cmd) => run_command(&orchestrator, cmd).await,
        Command::Logs { run } => follow_logs(&orchestrator, run).await,
    }
}

async fn project_command(orchestrator: &CliOrchestrator, cmd: ProjectCommand) -> Result<()> {
    match cmd {
        ProjectCommand::Add { config, user } => {
            let text = read_project_config(&config).await?;
            let project = orchestrator.create_project(text, user).await?;
            print_json(&project)
        }
        ProjectCommand::List => {
            for project in orchestrator.list_projects().await? {
                println!(
                    "{}  {}  runs={}  created={}",
                    project.id,
                    project.name,
                    project.runs.len(),
                    project.creation_date.to_rfc3339()
                );
            }
            Ok(())
        }
        ProjectCommand::Show { id } => {
            let project = orchestrator.get_project(id).await?;
            let runs = orchestrator.project_runs(id).await?;
            print_json(&serde_json::json!({ "project": project, "runs": runs }))
        }
        ProjectCommand::Update { id, config } => {
            let text = read_project_config(&config).await?;
            let project = orchestrator.update_project(id, text).await?;
            print_json(&project)
        }
        ProjectCommand::Delete { id } => {
            let deleted = orchestrator.delete_project(id).await?;
            info!(project = %id, runs = deleted.len(), "deleted");
            print_json(&serde_json::json!({ "project": id, "deleted_runs": deleted }))
        }
    }
}

async fn run_command(orchestrator: &CliOrchestrator, cmd: RunCommand) -> Result<()> {
    let run = match cmd {
        RunCommand::Start { project } => match orchestrator.start_run(project).await {
            Ok(run) => run,
            Err(PulserunError::LaunchFailure { run, source }) => {
                print_json(&run)?;
                anyhow::bail!("run {} failed to launch: {source}", run.id);
            }
            Err(e) => return Err(e.into()),
        },
        RunCommand::Stop { run } => orchestrator.stop_run(run).await?,
        RunCommand::Complete { run } => orchestrator.mark_completed(run).await?,
        RunCommand::Fail { run, reason } => orchestrator.mark_errored(run, reason).await?,
        RunCommand::Show { run } => orchestrator.get_run(run).await?,
    };
    print_json(&run)
}

/// Print a run's log to stdout as it grows, until Ctrl-C.
async fn follow_logs(orchestrator: &CliOrchestrator, run_id: RunId) -> Result<()> {
    let (tx, mut events) = mpsc::channel(64);
    let session = orchestrator.open_session(tx);
    session.open_log(run_id).await;

    let mut failure = None;
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(ObserverEvent::Clear { .. }) => {}
                Some(ObserverEvent::Tail { lines, .. }) => {
                    for line in lines {
                        println!("{line}");
                    }
                }
                Some(ObserverEvent::Failed { message, .. }) => {
                    failure = Some(message);
                    break;
                }
                None => break,
            },
            res = tokio::signal::ctrl_c() => {
                if let Err(e) = res {
                    warn!(error = %e, "failed to listen for Ctrl+C");
                }
                break;
            }
        }
    }

    session.disconnect().await;
    match failure {
        Some(message) => anyhow::bail!("could not follow run {run_id}: {message}"),
        None => Ok(()),
    }
}

async fn read_project_config(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading project configuration {}", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
