// src/observer/session.rs

//! Transport-facing observer session.
//!
//! One session per transport connection (e.g. a websocket). The transport
//! forwards what the client asks for as [`ObserverCommand`]s and relays the
//! [`ObserverEvent`]s it receives back to the client. When the transport goes
//! away (sends `Disconnect` or simply drops the command sender), every tail
//! the session opened is closed.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::store::RunStore;
use crate::tail::{LogLineBatch, TailBroker, TailFeed};
use crate::types::{ObserverId, RunId};

const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Requests coming from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserverCommand {
    /// Start following a run's log.
    OpenLog(RunId),
    /// Stop following one run, or every run when `None`.
    CloseLog(Option<RunId>),
    Disconnect,
}

/// Messages for the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserverEvent {
    /// A new feed is being opened; the client should clear its log view.
    Clear { run_id: RunId },
    /// New lines for a run, in file order.
    Tail { run_id: RunId, lines: LogLineBatch },
    /// The feed could not be opened.
    Failed { run_id: RunId, message: String },
}

/// Handle kept by the transport to drive a running session.
#[derive(Debug)]
pub struct ObserverSessionHandle {
    id: ObserverId,
    commands: mpsc::Sender<ObserverCommand>,
    task: JoinHandle<()>,
}

impl ObserverSessionHandle {
    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Queue a command. Returns `false` if the session has already ended.
    pub async fn send(&self, command: ObserverCommand) -> bool {
        self.commands.send(command).await.is_ok()
    }

    pub async fn open_log(&self, run_id: RunId) -> bool {
        self.send(ObserverCommand::OpenLog(run_id)).await
    }

    pub async fn close_log(&self, run_id: Option<RunId>) -> bool {
        self.send(ObserverCommand::CloseLog(run_id)).await
    }

    /// Disconnect and wait until the session has closed all of its tails.
    pub async fn disconnect(self) {
        let _ = self.commands.send(ObserverCommand::Disconnect).await;
        drop(self.commands);
        if let Err(e) = self.task.await {
            warn!(observer = %self.id, error = %e, "observer session task failed");
        }
    }
}

/// Session state owned by the session task.
struct ObserverSession<S: RunStore> {
    id: ObserverId,
    broker: Arc<TailBroker<S>>,
    events: mpsc::Sender<ObserverEvent>,
    /// One relay task per followed run.
    forwarders: HashMap<RunId, JoinHandle<()>>,
}

/// Start a session for a new transport connection.
///
/// Events for the client are sent on `events`; if that channel closes the
/// session keeps serving commands but its feeds stop.
pub fn spawn_session<S: RunStore>(
    broker: Arc<TailBroker<S>>,
    events: mpsc::Sender<ObserverEvent>,
) -> ObserverSessionHandle {
    let id = Uuid::new_v4();
    let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

    let session = ObserverSession {
        id,
        broker,
        events,
        forwarders: HashMap::new(),
    };
    let task = tokio::spawn(session.run(rx));

    ObserverSessionHandle {
        id,
        commands: tx,
        task,
    }
}

impl<S: RunStore> ObserverSession<S> {
    async fn run(mut self, mut commands: mpsc::Receiver<ObserverCommand>) {
        info!(observer = %self.id, "observer connected");

        while let Some(command) = commands.recv().await {
            match command {
                ObserverCommand::OpenLog(run_id) => self.open_log(run_id).await,
                ObserverCommand::CloseLog(run_id) => self.close_log(run_id).await,
                ObserverCommand::Disconnect => break,
            }
        }

        let closed = self.broker.close_tail(self.id, None);
        self.stop_forwarders(None).await;
        info!(observer = %self.id, closed, "observer disconnected");
    }

    async fn open_log(&mut self, run_id: RunId) {
        // A reopened run must not relay anything from its previous feed
        // after the `Clear` below.
        self.stop_forwarders(Some(run_id)).await;
        self.forwarders.retain(|_, task| !task.is_finished());

        if self.events.send(ObserverEvent::Clear { run_id }).await.is_err() {
            debug!(observer = %self.id, run_id = %run_id, "client gone; not opening tail");
            return;
        }

        match self.broker.open_tail(self.id, run_id).await {
            Ok(feed) => {
                let task = tokio::spawn(forward(self.id, feed, self.events.clone()));
                self.forwarders.insert(run_id, task);
            }
            Err(e) => {
                warn!(observer = %self.id, run_id = %run_id, error = %e, "could not open tail");
                let _ = self
                    .events
                    .send(ObserverEvent::Failed {
                        run_id,
                        message: e.to_string(),
                    })
                    .await;
            }
        }
    }

    async fn close_log(&mut self, run_id: Option<RunId>) {
        self.broker.close_tail(self.id, run_id);
        self.stop_forwarders(run_id).await;
    }

    /// Abort and join the relay for `run_id`, or every relay when `None`.
    /// Once this returns, those feeds send no further events.
    async fn stop_forwarders(&mut self, run_id: Option<RunId>) {
        let tasks: Vec<JoinHandle<()>> = match run_id {
            Some(run_id) => self.forwarders.remove(&run_id).into_iter().collect(),
            None => self.forwarders.drain().map(|(_, task)| task).collect(),
        };

        for task in tasks {
            task.abort();
            match task.await {
                Err(e) if !e.is_cancelled() => {
                    warn!(observer = %self.id, error = %e, "feed relay task failed");
                }
                _ => {}
            }
        }
    }
}

/// Relay a feed's batches to the client until either side ends.
async fn forward(observer: ObserverId, mut feed: TailFeed, events: mpsc::Sender<ObserverEvent>) {
    let run_id = feed.run_id();
    while let Some(lines) = feed.next().await {
        if events.send(ObserverEvent::Tail { run_id, lines }).await.is_err() {
            break;
        }
    }
    debug!(observer = %observer, run_id = %run_id, "feed ended");
}
