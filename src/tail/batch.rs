// src/tail/batch.rs

//! Count-or-time line batching.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::trace;

use crate::config::TailSection;

/// Lines delivered to an observer in one message. Never empty.
pub type LogLineBatch = Vec<String>;

/// When to flush buffered lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    /// Flush as soon as this many lines are buffered.
    pub max_lines: usize,
    /// Flush whatever is buffered once this long has passed since the
    /// previous flush.
    pub window: Duration,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            max_lines: 20,
            window: Duration::from_millis(1000),
        }
    }
}

impl From<&TailSection> for BatchPolicy {
    fn from(tail: &TailSection) -> Self {
        Self {
            max_lines: tail.batch_max_lines.max(1),
            window: tail.batch_window(),
        }
    }
}

/// Group lines from `lines` into batches on `out`.
///
/// A batch is flushed when `max_lines` lines are buffered or when `window`
/// has elapsed since the previous flush, whichever comes first; both restart
/// the window. Empty windows produce nothing. When `lines` closes, the
/// remainder is flushed and `out` is dropped; when `out`'s receiver goes away
/// batching stops, which in turn closes `lines` for the producer.
pub async fn batch_lines(
    mut lines: mpsc::Receiver<String>,
    policy: BatchPolicy,
    out: mpsc::Sender<LogLineBatch>,
) {
    let max_lines = policy.max_lines.max(1);
    let mut buffer: LogLineBatch = Vec::with_capacity(max_lines);
    let mut deadline = Instant::now() + policy.window;

    loop {
        tokio::select! {
            line = lines.recv() => match line {
                Some(line) => {
                    buffer.push(line);
                    if buffer.len() >= max_lines {
                        if !flush(&mut buffer, &out).await {
                            return;
                        }
                        deadline = Instant::now() + policy.window;
                    }
                }
                None => {
                    flush(&mut buffer, &out).await;
                    trace!("line source closed; batching finished");
                    return;
                }
            },
            _ = sleep_until(deadline) => {
                if !flush(&mut buffer, &out).await {
                    return;
                }
                deadline = Instant::now() + policy.window;
            }
        }
    }
}

/// Send the buffer if it holds anything. Returns `false` once nobody is
/// listening any more.
async fn flush(buffer: &mut LogLineBatch, out: &mpsc::Sender<LogLineBatch>) -> bool {
    if buffer.is_empty() {
        return !out.is_closed();
    }
    let batch = std::mem::take(buffer);
    out.send(batch).await.is_ok()
}
