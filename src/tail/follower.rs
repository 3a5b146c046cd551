// src/tail/follower.rs

//! `tail -f` follower processes.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::errors::{PulserunError, Result};
use crate::types::RunId;

const TAIL_PROGRAM: &str = "tail";

/// Capacity of the raw line channel between a follower and its batcher.
const LINE_CHANNEL_CAPACITY: usize = 256;

/// A running follower: its pid and the lines it produces.
///
/// The first line is always the follower's own command line, for display.
/// The channel closes when the follower process exits or is cancelled.
#[derive(Debug)]
pub struct Follower {
    pub pid: u32,
    pub lines: mpsc::Receiver<String>,
}

/// The command line shown to observers as the first line of a feed.
pub fn tail_command_line(initial_lines: usize, path: &Path) -> String {
    format!("{TAIL_PROGRAM} -n {initial_lines} -f {}", path.display())
}

/// Start `tail -n <initial_lines> -f <path>` and stream its stdout lines.
///
/// The follower runs until it exits on its own or `cancel_rx` resolves.
/// Both an explicit cancel and a dropped sender kill the process, so a
/// follower never outlives its handle.
pub fn spawn_follower(
    run_id: RunId,
    path: &Path,
    initial_lines: usize,
    cancel_rx: oneshot::Receiver<()>,
) -> Result<Follower> {
    let mut cmd = Command::new(TAIL_PROGRAM);
    cmd.arg("-n")
        .arg(initial_lines.to_string())
        .arg("-f")
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let spawn_error = |source: std::io::Error| PulserunError::Spawn {
        executable: PathBuf::from(TAIL_PROGRAM),
        source,
    };

    let mut child = cmd.spawn().map_err(spawn_error)?;
    let pid = child
        .id()
        .ok_or_else(|| spawn_error(std::io::Error::other("follower has no pid")))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| spawn_error(std::io::Error::other("follower stdout not captured")))?;

    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(async move {
            let mut lines = LossyLines::new(stderr);
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(run_id = %run_id, pid, "tail stderr: {}", line);
            }
        });
    }

    let (line_tx, line_rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
    let header = tail_command_line(initial_lines, path);

    info!(run_id = %run_id, pid, path = %path.display(), "follower started");
    tokio::spawn(follow(run_id, pid, child, stdout, header, line_tx, cancel_rx));

    Ok(Follower {
        pid,
        lines: line_rx,
    })
}

/// Newline-delimited reader that decodes each line lossily, so arbitrary
/// pipeline output (invalid UTF-8 included) never ends a feed.
struct LossyLines<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LossyLines<R> {
    fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            buf: Vec::new(),
        }
    }

    /// The next line without its `\n` or `\r\n` terminator. A final line
    /// without a terminator is still returned. Bytes read before a
    /// cancelled call stay buffered for the next one.
    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        let read = self.reader.read_until(b'\n', &mut self.buf).await?;
        if read == 0 && self.buf.is_empty() {
            return Ok(None);
        }

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        Ok(Some(line))
    }
}

async fn follow(
    run_id: RunId,
    pid: u32,
    mut child: Child,
    stdout: ChildStdout,
    header: String,
    line_tx: mpsc::Sender<String>,
    mut cancel_rx: oneshot::Receiver<()>,
) {
    let mut lines = LossyLines::new(stdout);
    let mut kill = line_tx.send(header).await.is_err();

    while !kill {
        tokio::select! {
            biased;

            cancel = &mut cancel_rx => {
                match cancel {
                    Ok(()) => debug!(run_id = %run_id, pid, "follower cancelled"),
                    Err(_) => debug!(run_id = %run_id, pid, "follower handle dropped"),
                }
                kill = true;
            }

            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if line_tx.send(line).await.is_err() {
                        debug!(run_id = %run_id, pid, "feed dropped by observer");
                        kill = true;
                    }
                }
                Ok(None) => {
                    debug!(run_id = %run_id, pid, "follower output ended");
                    break;
                }
                Err(e) => {
                    warn!(run_id = %run_id, pid, error = %e, "reading follower output failed");
                    kill = true;
                }
            },
        }
    }

    if kill {
        if let Err(e) = child.kill().await {
            // Usually means the process already exited.
            debug!(run_id = %run_id, pid, error = %e, "could not kill follower");
        }
    } else if let Err(e) = child.wait().await {
        debug!(run_id = %run_id, pid, error = %e, "waiting for follower failed");
    }

    info!(run_id = %run_id, pid, "follower finished");
}
