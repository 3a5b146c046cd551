// src/observer/registry.rs

//! Observer → run → tail handle bookkeeping.

use std::collections::HashMap;

use tokio::sync::oneshot;
use tracing::debug;

use crate::types::{ObserverId, RunId};

/// Handle to one live follower process.
///
/// - `cancel` asks the follower task to kill its process. Dropping the
///   handle has the same effect, so removing a handle from the registry is
///   enough to stop the follower.
/// - `pid` identifies the exact follower process.
#[derive(Debug)]
pub struct TailHandle {
    observer: ObserverId,
    run_id: RunId,
    pid: u32,
    cancel: Option<oneshot::Sender<()>>,
}

impl TailHandle {
    pub fn new(observer: ObserverId, run_id: RunId, pid: u32, cancel: oneshot::Sender<()>) -> Self {
        Self {
            observer,
            run_id,
            pid,
            cancel: Some(cancel),
        }
    }

    pub fn observer(&self) -> ObserverId {
        self.observer
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Ask the follower to stop.
    ///
    /// Returns `false` if the follower had already finished; that is not an
    /// error.
    pub fn cancel(mut self) -> bool {
        let Some(cancel) = self.cancel.take() else {
            return false;
        };
        if cancel.send(()).is_err() {
            debug!(
                observer = %self.observer,
                run_id = %self.run_id,
                pid = self.pid,
                "follower already finished while cancelling"
            );
            return false;
        }
        true
    }
}

/// Which runs each observer is following, and the handle for each.
///
/// Pure bookkeeping: at most one handle per (observer, run). Removing a
/// handle always cancels it.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    observers: HashMap<ObserverId, HashMap<RunId, TailHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle` under its observer and run.
    ///
    /// An existing handle for the same pair is cancelled first; its pid is
    /// returned.
    pub fn register(&mut self, handle: TailHandle) -> Option<u32> {
        let runs = self.observers.entry(handle.observer).or_default();
        let replaced = runs.insert(handle.run_id, handle)?;
        let pid = replaced.pid;
        replaced.cancel();
        Some(pid)
    }

    /// Cancel and remove the handle for (observer, run). Returns whether one
    /// existed.
    pub fn unregister(&mut self, observer: ObserverId, run_id: RunId) -> bool {
        let Some(runs) = self.observers.get_mut(&observer) else {
            return false;
        };
        let removed = runs.remove(&run_id);
        if runs.is_empty() {
            self.observers.remove(&observer);
        }
        match removed {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel and remove every handle of `observer`. Unknown observers are a
    /// no-op. Returns the number of handles removed.
    pub fn unregister_all(&mut self, observer: ObserverId) -> usize {
        let Some(runs) = self.observers.remove(&observer) else {
            return 0;
        };
        let count = runs.len();
        for handle in runs.into_values() {
            handle.cancel();
        }
        count
    }

    /// Cancel and remove every observer's handle for `run_id`.
    pub fn unregister_run(&mut self, run_id: RunId) -> usize {
        let mut count = 0;
        self.observers.retain(|_, runs| {
            if let Some(handle) = runs.remove(&run_id) {
                handle.cancel();
                count += 1;
            }
            !runs.is_empty()
        });
        count
    }

    pub fn watched_runs(&self, observer: ObserverId) -> Vec<RunId> {
        self.observers
            .get(&observer)
            .map(|runs| runs.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn pid_of(&self, observer: ObserverId, run_id: RunId) -> Option<u32> {
        self.observers
            .get(&observer)
            .and_then(|runs| runs.get(&run_id))
            .map(TailHandle::pid)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}
