// src/exec/launcher.rs

//! Fire-and-forget pipeline launcher.
//!
//! The pipeline is started in its own process group with stdout and stderr
//! redirected to the run's log file, receives its whole configuration on
//! stdin, and is then let go: we keep the pid and nothing else. Tokio reaps the
//! dropped child in the background once it exits.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::process::{ChildStdin, Command};
use tracing::{debug, info, warn};

use crate::errors::{PulserunError, Result};
use crate::types::RunId;

/// Everything needed to start one pipeline process.
///
/// The optional fields map to the optional `--run`, `--log` and `--db`
/// arguments; each is only passed when present.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    pub executable: PathBuf,
    pub run_id: Option<RunId>,
    pub log: Option<PathBuf>,
    pub database: Option<String>,
    /// Pipeline configuration (JSON), written to stdin.
    pub configuration: String,
}

impl LaunchRequest {
    /// Command-line arguments for the pipeline, in `--run`, `--log`, `--db`
    /// order.
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(run_id) = self.run_id {
            args.push("--run".to_string());
            args.push(run_id.to_string());
        }
        if let Some(log) = &self.log {
            args.push("--log".to_string());
            args.push(log.display().to_string());
        }
        if let Some(db) = &self.database {
            args.push("--db".to_string());
            args.push(db.clone());
        }
        args
    }
}

/// Create `dir` (and parents) if it does not exist yet.
pub async fn ensure_log_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .await
        .map_err(|source| PulserunError::DirectoryCreation {
            path: dir.to_path_buf(),
            source,
        })
}

/// Spawn the pipeline and return its pid as soon as the process exists.
///
/// - The log directory is created first (`DirectoryCreation` on failure).
/// - The log file is created or truncated and receives both stdout and
///   stderr. Without a log path the output is discarded.
/// - The configuration is written to stdin and stdin is closed before the
///   pid is returned, so the payload is complete even if the caller's
///   runtime shuts down right after. A failed write (the child exited
///   early) is logged.
/// - Spawn failures surface as `Spawn` with the OS error.
pub async fn launch(request: LaunchRequest) -> Result<u32> {
    let (stdout, stderr) = match &request.log {
        Some(log) => {
            if let Some(parent) = log.parent().filter(|p| !p.as_os_str().is_empty()) {
                ensure_log_dir(parent).await?;
            }
            open_log_stdio(log).await?
        }
        None => (Stdio::null(), Stdio::null()),
    };

    let args = request.args();
    info!(
        executable = %request.executable.display(),
        args = %args.join(" "),
        "launching pipeline"
    );

    let mut cmd = Command::new(&request.executable);
    cmd.args(&args)
        .stdin(Stdio::piped())
        .stdout(stdout)
        .stderr(stderr);

    // Own process group: a Ctrl-C aimed at the orchestrator must not reach
    // the pipeline.
    #[cfg(unix)]
    cmd.process_group(0);

    let spawn_error = |source: std::io::Error| PulserunError::Spawn {
        executable: request.executable.clone(),
        source,
    };

    let mut child = cmd.spawn().map_err(spawn_error)?;
    let pid = child
        .id()
        .ok_or_else(|| spawn_error(std::io::Error::other("spawned process has no pid")))?;

    if let Some(stdin) = child.stdin.take() {
        write_configuration(pid, stdin, request.configuration.as_bytes()).await;
    }

    // Let go of the child: we never wait on it, only signal it by pid.
    drop(child);

    info!(pid, "pipeline launched");
    Ok(pid)
}

async fn write_configuration(pid: u32, mut stdin: ChildStdin, configuration: &[u8]) {
    if let Err(e) = stdin.write_all(configuration).await {
        warn!(pid, error = %e, "could not write configuration to pipeline stdin");
        return;
    }
    if let Err(e) = stdin.shutdown().await {
        debug!(pid, error = %e, "closing pipeline stdin failed");
    }
    debug!(pid, bytes = configuration.len(), "configuration written");
}

async fn open_log_stdio(log: &Path) -> Result<(Stdio, Stdio)> {
    let file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(log)
        .await?
        .into_std()
        .await;
    let err_file = file.try_clone()?;
    debug!(log = %log.display(), "pipeline output redirected");
    Ok((Stdio::from(file), Stdio::from(err_file)))
}
