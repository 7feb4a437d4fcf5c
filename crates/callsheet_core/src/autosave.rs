//! Debounced autosave.
//!
//! A background task owns the state machine
//! `Idle -> Dirty -> Saving -> {Saved, Error} -> Idle`. The editor only sends
//! it change notifications; the task reads the document itself when the
//! debounce window closes, so a save always carries the newest state.
//!
//! A failed save is not retried on a timer. The next change starts a new
//! debounce cycle, and an explicit [`AutosaveHandle::flush`] retries.

use crate::config::AutosaveConfig;
use crate::error::{CoreError, Result};
use crate::types::Document;
use serde::Serialize;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AutosaveState {
    Idle,
    Dirty,
    Saving,
    Saved,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutosaveStatus {
    pub state: AutosaveState,
    /// Message of the most recent failure, cleared by the next success.
    pub last_error: Option<String>,
    pub saves: u64,
    pub failures: u64,
}

impl Default for AutosaveStatus {
    fn default() -> Self {
        Self {
            state: AutosaveState::Idle,
            last_error: None,
            saves: 0,
            failures: 0,
        }
    }
}

/// Persistence collaborator. May be called repeatedly with the same or newer
/// snapshots.
pub trait SaveSink: Send + Sync + 'static {
    fn save(&self, snapshot: Document) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Where the autosave task reads the document from at the moment it saves.
pub trait SnapshotSource: Send + Sync + 'static {
    fn snapshot(&self) -> Document;
}

impl SnapshotSource for Arc<Mutex<Document>> {
    fn snapshot(&self) -> Document {
        self.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

type SaveOutcome = std::result::Result<(), String>;

enum Signal {
    Changed,
    Flush(oneshot::Sender<SaveOutcome>),
}

enum Wake {
    Signal(Option<Signal>),
    Timer,
}

/// Editor-side handle to the autosave task.
pub struct AutosaveHandle {
    signals: mpsc::UnboundedSender<Signal>,
    status: watch::Receiver<AutosaveStatus>,
    task: JoinHandle<()>,
}

impl AutosaveHandle {
    /// Start the autosave task on the current tokio runtime.
    pub fn spawn<P: SnapshotSource, S: SaveSink>(config: AutosaveConfig, source: P, sink: S) -> Self {
        let (signals, receiver) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(AutosaveStatus::default());
        let machine = Machine {
            config,
            source,
            sink,
            signals: receiver,
            status: status_tx,
            dirty: false,
            last_failed: false,
            debounce_at: None,
            display_until: None,
            waiters: Vec::new(),
        };
        let task = tokio::spawn(machine.run());
        Self {
            signals,
            status,
            task,
        }
    }

    /// Record an accepted mutation. Restarts the debounce window.
    pub fn notify_changed(&self) {
        if self.signals.send(Signal::Changed).is_err() {
            tracing::warn!("autosave task has stopped; change was not scheduled");
        }
    }

    pub fn status(&self) -> AutosaveStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AutosaveStatus> {
        self.status.clone()
    }

    /// Save now if there is anything unsaved, skipping the debounce, and wait
    /// for the result. Waits for an in-flight save first.
    pub async fn flush(&self) -> Result<()> {
        let (reply, outcome) = oneshot::channel();
        self.signals
            .send(Signal::Flush(reply))
            .map_err(|_| CoreError::AutosaveStopped)?;
        outcome
            .await
            .map_err(|_| CoreError::AutosaveStopped)?
            .map_err(CoreError::Save)
    }

    /// Flush, then stop the task.
    pub async fn shutdown(self) -> Result<()> {
        let flushed = self.flush().await;
        drop(self.signals);
        if let Err(e) = self.task.await {
            tracing::error!("autosave task ended abnormally: {e}");
        }
        flushed
    }
}

struct Machine<P, S> {
    config: AutosaveConfig,
    source: P,
    sink: S,
    signals: mpsc::UnboundedReceiver<Signal>,
    status: watch::Sender<AutosaveStatus>,
    dirty: bool,
    last_failed: bool,
    debounce_at: Option<Instant>,
    /// When a Saved/Error status falls back to Idle.
    display_until: Option<Instant>,
    waiters: Vec<oneshot::Sender<SaveOutcome>>,
}

impl<P: SnapshotSource, S: SaveSink> Machine<P, S> {
    async fn run(mut self) {
        loop {
            let wake = match self.debounce_at.or(self.display_until) {
                Some(at) => tokio::select! {
                    biased;
                    signal = self.signals.recv() => Wake::Signal(signal),
                    _ = sleep_until(at) => Wake::Timer,
                },
                None => Wake::Signal(self.signals.recv().await),
            };

            match wake {
                Wake::Timer => self.on_timer().await,
                Wake::Signal(Some(Signal::Changed)) => self.mark_dirty(),
                Wake::Signal(Some(Signal::Flush(reply))) => {
                    self.waiters.push(reply);
                    self.answer_waiters().await;
                }
                Wake::Signal(None) => break,
            }
        }

        if self.dirty {
            tracing::info!("editor closed with unsaved changes; saving");
            if self.save_once().await.is_err() {
                tracing::error!("final autosave failed; latest changes are not persisted");
            }
        }
    }

    async fn on_timer(&mut self) {
        let now = Instant::now();
        if self.debounce_at.is_some_and(|at| at <= now) {
            let _ = self.save_once().await;
            self.answer_waiters().await;
        } else if self.display_until.is_some_and(|at| at <= now) {
            self.display_until = None;
            self.set_state(AutosaveState::Idle);
        }
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
        self.display_until = None;
        self.debounce_at = Some(Instant::now() + self.config.debounce());
        self.set_state(AutosaveState::Dirty);
    }

    async fn save_once(&mut self) -> SaveOutcome {
        self.debounce_at = None;
        self.dirty = false;
        self.set_state(AutosaveState::Saving);

        let snapshot = self.source.snapshot();
        let items = snapshot.items.len();
        let result = self.sink.save(snapshot).await;

        // Anything sent while the save was in flight.
        let mut changed_meanwhile = false;
        while let Ok(signal) = self.signals.try_recv() {
            match signal {
                Signal::Changed => changed_meanwhile = true,
                Signal::Flush(reply) => self.waiters.push(reply),
            }
        }

        let outcome = match result {
            Ok(()) => {
                tracing::info!(items, "autosaved");
                self.last_failed = false;
                self.display_until = Some(Instant::now() + self.config.saved_display());
                self.status.send_modify(|s| {
                    s.state = AutosaveState::Saved;
                    s.last_error = None;
                    s.saves += 1;
                });
                Ok(())
            }
            Err(e) => {
                let message = format!("{e:#}");
                tracing::warn!(error = %message, "autosave failed");
                self.last_failed = true;
                self.display_until = Some(Instant::now() + self.config.error_display());
                self.status.send_modify(|s| {
                    s.state = AutosaveState::Error;
                    s.last_error = Some(message.clone());
                    s.failures += 1;
                });
                Err(message)
            }
        };

        if changed_meanwhile {
            self.mark_dirty();
        }
        outcome
    }

    async fn answer_waiters(&mut self) {
        while !self.waiters.is_empty() {
            let waiting = std::mem::take(&mut self.waiters);
            let outcome = if self.dirty || self.last_failed {
                self.save_once().await
            } else {
                Ok(())
            };
            for reply in waiting {
                let _ = reply.send(outcome.clone());
            }
        }
    }

    fn set_state(&self, state: AutosaveState) {
        self.status.send_modify(|s| s.state = state);
    }
}
