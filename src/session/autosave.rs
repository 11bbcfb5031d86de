//! Debounced background persistence
//!
//! The session publishes every new forest snapshot into a `watch` channel.
//! A single tokio task waits for a quiet period after the last change, then
//! flattens the latest snapshot and hands it to a [`SyncSink`]. Snapshots
//! superseded during the quiet period are never pushed.

use crate::api::ProjectApi;
use crate::error::ApiError;
use crate::flat::{flatten, FlatRecord};
use crate::reconcile::ReconcileStrategy;
use crate::tree::Forest;
use crate::types::ProjectId;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

/// Default quiet period before a push
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(700);

/// Destination of debounced pushes
#[async_trait]
pub trait SyncSink: Send + Sync {
    async fn push(&self, records: Vec<FlatRecord>) -> Result<(), ApiError>;
}

/// Push counters
#[derive(Debug, Clone, Default)]
pub struct AutosaveStats {
    pub pushes: u64,
    pub failures: u64,
    pub last_error: Option<String>,
}

enum Command {
    Flush(oneshot::Sender<Result<(), ApiError>>),
    Shutdown(oneshot::Sender<Result<(), ApiError>>),
}

/// Handle to the autosave task; dropping it aborts the task
pub struct Autosave {
    snapshots: watch::Sender<Forest>,
    commands: mpsc::UnboundedSender<Command>,
    task: Option<JoinHandle<()>>,
    stats: Arc<RwLock<AutosaveStats>>,
}

impl Autosave {
    /// Spawn the task on the current tokio runtime
    pub fn spawn(sink: Arc<dyn SyncSink>, debounce: Duration, initial: Forest) -> Self {
        let (snapshots, rx) = watch::channel(initial);
        let (commands, command_rx) = mpsc::unbounded_channel();
        let stats = Arc::new(RwLock::new(AutosaveStats::default()));

        let worker = Worker {
            sink,
            debounce,
            snapshots: rx,
            commands: command_rx,
            stats: stats.clone(),
        };
        let task = tokio::spawn(worker.run());
        debug!(debounce_ms = debounce.as_millis() as u64, "Autosave started");

        Self {
            snapshots,
            commands,
            task: Some(task),
            stats,
        }
    }

    /// Publish a new snapshot and restart the quiet period
    pub fn schedule(&self, forest: Forest) {
        // Fails only once the task is gone
        if self.snapshots.send(forest).is_err() {
            warn!("Autosave task is not running; snapshot dropped");
        }
    }

    /// Push the latest snapshot now if anything is pending
    pub async fn flush(&self) -> Result<(), ApiError> {
        let (ack, done) = oneshot::channel();
        self.commands
            .send(Command::Flush(ack))
            .map_err(|_| ApiError::SyncFailed("Autosave task is not running".to_string()))?;
        done.await
            .map_err(|_| ApiError::SyncFailed("Autosave task stopped during flush".to_string()))?
    }

    /// Flush pending state, then stop the task
    pub async fn shutdown(mut self) -> Result<(), ApiError> {
        let (ack, done) = oneshot::channel();
        let sent = self.commands.send(Command::Shutdown(ack)).is_ok();
        let result = if sent {
            done.await.unwrap_or_else(|_| {
                Err(ApiError::SyncFailed("Autosave task stopped during shutdown".to_string()))
            })
        } else {
            Ok(())
        };
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Autosave task ended abnormally");
            }
        }
        result
    }

    pub fn stats(&self) -> AutosaveStats {
        self.stats.read().clone()
    }
}

impl Drop for Autosave {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct Worker {
    sink: Arc<dyn SyncSink>,
    debounce: Duration,
    snapshots: watch::Receiver<Forest>,
    commands: mpsc::UnboundedReceiver<Command>,
    stats: Arc<RwLock<AutosaveStats>>,
}

impl Worker {
    async fn run(mut self) {
        let mut deadline: Option<Instant> = None;
        // Set when the last push failed; retried on the next flush or change
        let mut unsaved = false;

        loop {
            let wake = deadline.unwrap_or_else(Instant::now);
            tokio::select! {
                biased;
                changed = self.snapshots.changed() => {
                    if changed.is_err() {
                        // Sender dropped: persist what we have and stop
                        if deadline.is_some() || unsaved {
                            let _ = self.push().await;
                        }
                        break;
                    }
                    deadline = Some(Instant::now() + self.debounce);
                }
                command = self.commands.recv() => match command {
                    Some(Command::Flush(ack)) => {
                        let result = if self.has_pending(deadline.take(), unsaved) {
                            self.push().await
                        } else {
                            Ok(())
                        };
                        unsaved = result.is_err();
                        let _ = ack.send(result);
                    }
                    Some(Command::Shutdown(ack)) => {
                        let result = if self.has_pending(deadline, unsaved) {
                            self.push().await
                        } else {
                            Ok(())
                        };
                        let _ = ack.send(result);
                        break;
                    }
                    None => {
                        if self.has_pending(deadline, unsaved) {
                            let _ = self.push().await;
                        }
                        break;
                    }
                },
                _ = sleep_until(wake), if deadline.is_some() => {
                    deadline = None;
                    unsaved = self.push().await.is_err();
                }
            }
        }
        debug!("Autosave stopped");
    }

    /// True when a change is scheduled, unseen, or failed to push
    fn has_pending(&self, deadline: Option<Instant>, unsaved: bool) -> bool {
        deadline.is_some() || unsaved || self.snapshots.has_changed().unwrap_or(false)
    }

    async fn push(&mut self) -> Result<(), ApiError> {
        let records = {
            let forest = self.snapshots.borrow_and_update();
            flatten(&forest)
        };
        let count = records.len();
        match self.sink.push(records).await {
            Ok(()) => {
                self.stats.write().pushes += 1;
                info!(records = count, "Autosave pushed snapshot");
                Ok(())
            }
            Err(e) => {
                {
                    let mut stats = self.stats.write();
                    stats.failures += 1;
                    stats.last_error = Some(e.to_string());
                }
                warn!(error = %e, "Autosave push failed; will retry on next change");
                Err(e)
            }
        }
    }
}

/// Sink reconciling pushes into a stored project
pub struct StoreSink {
    api: Arc<ProjectApi>,
    project: ProjectId,
    strategy: ReconcileStrategy,
}

impl StoreSink {
    pub fn new(api: Arc<ProjectApi>, project: ProjectId, strategy: ReconcileStrategy) -> Self {
        Self {
            api,
            project,
            strategy,
        }
    }
}

#[async_trait]
impl SyncSink for StoreSink {
    async fn push(&self, records: Vec<FlatRecord>) -> Result<(), ApiError> {
        let api = self.api.clone();
        let project = self.project.clone();
        let strategy = self.strategy;
        tokio::task::spawn_blocking(move || {
            api.update_project(&project, None, Some(&records), strategy)
                .map(|_| ())
        })
        .await
        .map_err(|e| ApiError::SyncFailed(format!("Reconcile task failed: {}", e)))?
    }
}
