use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use pulserun::errors::{PulserunError, Result};
use pulserun::exec::{LaunchRequest, ProcessBackend};
use pulserun::types::SignalOutcome;

/// A fake process backend that:
/// - records every log directory check, launch request and terminate call
/// - hands out increasing fake pids starting at 4000
/// - can be told to fail the directory check or the launch
/// - can be told to take a while to launch
/// - answers `terminate` with a configurable outcome
#[derive(Debug)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

#[derive(Debug)]
struct FakeState {
    next_pid: u32,
    log_dirs: Vec<PathBuf>,
    launches: Vec<LaunchRequest>,
    terminated: Vec<u32>,
    fail_log_dir: bool,
    fail_launch: Option<String>,
    launch_delay: Option<Duration>,
    signal_outcome: SignalOutcome,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                next_pid: 4000,
                log_dirs: Vec::new(),
                launches: Vec::new(),
                terminated: Vec::new(),
                fail_log_dir: false,
                fail_launch: None,
                launch_delay: None,
                signal_outcome: SignalOutcome::Delivered,
            }),
        }
    }

    /// Every launch fails as if the executable did not exist.
    pub fn failing_launch(self, message: &str) -> Self {
        self.lock().fail_launch = Some(message.to_string());
        self
    }

    /// The log directory can never be created.
    pub fn failing_log_dir(self) -> Self {
        self.lock().fail_log_dir = true;
        self
    }

    /// Every launch takes `delay` before the pid is handed out.
    pub fn slow_launch(self, delay: Duration) -> Self {
        self.lock().launch_delay = Some(delay);
        self
    }

    pub fn with_signal_outcome(self, outcome: SignalOutcome) -> Self {
        self.lock().signal_outcome = outcome;
        self
    }

    pub fn launches(&self) -> Vec<LaunchRequest> {
        self.lock().launches.clone()
    }

    pub fn terminated(&self) -> Vec<u32> {
        self.lock().terminated.clone()
    }

    pub fn log_dirs(&self) -> Vec<PathBuf> {
        self.lock().log_dirs.clone()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessBackend for FakeBackend {
    async fn ensure_log_dir(&self, dir: &Path) -> Result<()> {
        let mut state = self.lock();
        state.log_dirs.push(dir.to_path_buf());
        if state.fail_log_dir {
            return Err(PulserunError::DirectoryCreation {
                path: dir.to_path_buf(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only volume"),
            });
        }
        Ok(())
    }

    async fn launch(&self, request: LaunchRequest) -> Result<u32> {
        let executable = request.executable.clone();
        let delay = {
            let mut state = self.lock();
            state.launches.push(request);
            state.launch_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.lock();
        if let Some(message) = &state.fail_launch {
            return Err(PulserunError::Spawn {
                executable,
                source: io::Error::new(io::ErrorKind::NotFound, message.clone()),
            });
        }
        let pid = state.next_pid;
        state.next_pid += 1;
        Ok(pid)
    }

    async fn terminate(&self, pid: u32) -> SignalOutcome {
        let mut state = self.lock();
        state.terminated.push(pid);
        state.signal_outcome.clone()
    }
}
