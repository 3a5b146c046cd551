// src/exec/backend.rs

//! Pluggable process backend abstraction.
//!
//! The lifecycle manager talks to a `ProcessBackend` instead of spawning and
//! signalling processes directly. Production code uses
//! [`RealProcessBackend`]; tests can provide their own implementation that
//! records launches and signals without touching the OS.

use std::path::Path;

use async_trait::async_trait;

use crate::errors::Result;
use crate::types::SignalOutcome;

use super::launcher::{self, LaunchRequest};
use super::signal;

/// How the lifecycle manager reaches the operating system.
#[async_trait]
pub trait ProcessBackend: Send + Sync + 'static {
    /// Make sure the log directory exists before a run record is created.
    async fn ensure_log_dir(&self, dir: &Path) -> Result<()>;

    /// Start the pipeline described by `request`, returning its pid.
    async fn launch(&self, request: LaunchRequest) -> Result<u32>;

    /// Ask the process to terminate. Never fails; see [`SignalOutcome`].
    async fn terminate(&self, pid: u32) -> SignalOutcome;
}

/// Backend that spawns real, detached processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealProcessBackend;

impl RealProcessBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessBackend for RealProcessBackend {
    async fn ensure_log_dir(&self, dir: &Path) -> Result<()> {
        launcher::ensure_log_dir(dir).await
    }

    async fn launch(&self, request: LaunchRequest) -> Result<u32> {
        launcher::launch(request).await
    }

    async fn terminate(&self, pid: u32) -> SignalOutcome {
        signal::terminate(pid)
    }
}
