// src/tail/broker.rs

use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tracing::{debug, info};

use crate::config::TailSection;
use crate::errors::Result;
use crate::observer::registry::{SessionRegistry, TailHandle};
use crate::store::RunStore;
use crate::types::{ObserverId, RunId};

use super::batch::{batch_lines, BatchPolicy, LogLineBatch};
use super::follower::spawn_follower;

/// Batches buffered between the batcher and a slow observer.
const BATCH_CHANNEL_CAPACITY: usize = 16;

/// Tail behaviour shared by every feed a broker opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailSettings {
    /// Existing lines replayed before following.
    pub initial_lines: usize,
    pub batch: BatchPolicy,
}

impl Default for TailSettings {
    fn default() -> Self {
        Self {
            initial_lines: 100,
            batch: BatchPolicy::default(),
        }
    }
}

impl From<&TailSection> for TailSettings {
    fn from(tail: &TailSection) -> Self {
        Self {
            initial_lines: tail.initial_lines,
            batch: BatchPolicy::from(tail),
        }
    }
}

/// Live log feed for one (observer, run) pair.
///
/// Yields non-empty batches in file order and ends when the follower process
/// exits, including when the tail is closed.
#[derive(Debug)]
pub struct TailFeed {
    run_id: RunId,
    pid: u32,
    batches: ReceiverStream<LogLineBatch>,
}

impl TailFeed {
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Pid of the follower process behind this feed.
    pub fn pid(&self) -> u32 {
        self.pid
    }
}

impl Stream for TailFeed {
    type Item = LogLineBatch;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.batches).poll_next(cx)
    }
}

/// Opens and closes live log feeds, one follower process per
/// (observer, run), and keeps the [`SessionRegistry`] that makes each of them
/// individually cancellable.
#[derive(Debug)]
pub struct TailBroker<S: RunStore> {
    store: Arc<S>,
    settings: TailSettings,
    registry: Mutex<SessionRegistry>,
}

impl<S: RunStore> TailBroker<S> {
    pub fn new(store: Arc<S>, settings: TailSettings) -> Self {
        Self {
            store,
            settings,
            registry: Mutex::new(SessionRegistry::new()),
        }
    }

    pub fn settings(&self) -> TailSettings {
        self.settings
    }

    fn registry(&self) -> MutexGuard<'_, SessionRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start following the log of `run_id` on behalf of `observer`.
    ///
    /// If the observer already follows this run, the previous follower is
    /// cancelled and replaced.
    pub async fn open_tail(&self, observer: ObserverId, run_id: RunId) -> Result<TailFeed> {
        let run = self.store.get_run(run_id).await?;

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let follower = spawn_follower(run_id, &run.log, self.settings.initial_lines, cancel_rx)?;
        let pid = follower.pid;

        let (batch_tx, batch_rx) = mpsc::channel(BATCH_CHANNEL_CAPACITY);
        tokio::spawn(batch_lines(follower.lines, self.settings.batch, batch_tx));

        let replaced = self
            .registry()
            .register(TailHandle::new(observer, run_id, pid, cancel_tx));
        if let Some(old_pid) = replaced {
            debug!(observer = %observer, run_id = %run_id, old_pid, "replaced existing tail");
        }

        info!(observer = %observer, run_id = %run_id, pid, "tail opened");
        Ok(TailFeed {
            run_id,
            pid,
            batches: ReceiverStream::new(batch_rx),
        })
    }

    /// Close one tail (`Some(run)`) or every tail of `observer` (`None`).
    ///
    /// Unknown observers or runs are a no-op. Returns how many tails were
    /// closed.
    pub fn close_tail(&self, observer: ObserverId, run_id: Option<RunId>) -> usize {
        let closed = match run_id {
            Some(run_id) => usize::from(self.registry().unregister(observer, run_id)),
            None => self.registry().unregister_all(observer),
        };
        if closed > 0 {
            info!(observer = %observer, run_id = ?run_id, closed, "tail closed");
        }
        closed
    }

    /// Close every observer's tail on `run_id`.
    pub fn close_run_tails(&self, run_id: RunId) -> usize {
        let closed = self.registry().unregister_run(run_id);
        if closed > 0 {
            info!(run_id = %run_id, closed, "closed tails of removed run");
        }
        closed
    }

    /// Runs `observer` currently follows.
    pub fn watched_runs(&self, observer: ObserverId) -> Vec<RunId> {
        self.registry().watched_runs(observer)
    }

    /// Follower pid registered for (observer, run), if any.
    pub fn follower_pid(&self, observer: ObserverId, run_id: RunId) -> Option<u32> {
        self.registry().pid_of(observer, run_id)
    }

    /// Number of observers with at least one open tail.
    pub fn observer_count(&self) -> usize {
        self.registry().observer_count()
    }
}
