//! The polling listener.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use cosigner_pool_core::{Envelope, Identifier};
use cosigner_pool_exchange::ExchangeClient;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::config::ListenerConfig;
use crate::error::{ListenerError, Result};

/// A message found in the exchange under a watched identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub identifier: Identifier,
    pub envelope: Envelope,
}

/// Lifecycle state of a [`Listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerStatus {
    Stopped,
    Running,
}

/// Watch and received sets for one run.
#[derive(Default)]
struct RunSets {
    watch_set: Mutex<Vec<Identifier>>,
    received: Mutex<HashSet<Identifier>>,
}

impl RunSets {
    fn watch_snapshot(&self) -> Vec<Identifier> {
        lock(&self.watch_set).clone()
    }

    fn is_received(&self, id: &Identifier) -> bool {
        lock(&self.received).contains(id)
    }

    /// Returns false if the identifier was already marked.
    fn mark_received(&self, id: Identifier) -> bool {
        lock(&self.received).insert(id)
    }
}

struct ActiveRun {
    sets: Arc<RunSets>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Background poller over the identifiers of local keys.
///
/// All methods take `&self`; the listener can be shared between the task
/// that drives the directory and the one that consumes notifications.
pub struct Listener<E: ExchangeClient + 'static> {
    exchange: Arc<E>,
    config: ListenerConfig,
    active: Mutex<Option<ActiveRun>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<E: ExchangeClient + 'static> Listener<E> {
    /// Create a stopped listener.
    pub fn new(exchange: Arc<E>, config: ListenerConfig) -> Self {
        Self {
            exchange,
            config,
            active: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ListenerConfig {
        &self.config
    }

    pub fn status(&self) -> ListenerStatus {
        match lock(&self.active).as_ref() {
            Some(run) if !run.task.is_finished() => ListenerStatus::Running,
            _ => ListenerStatus::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status() == ListenerStatus::Running
    }

    /// Start polling. Must be called from within a Tokio runtime.
    ///
    /// The run starts with an empty watch set and an empty received set.
    /// Returns the receiving end of this run's notification channel; it
    /// closes once the run is stopped.
    pub fn start(&self) -> Result<mpsc::Receiver<Notification>> {
        let mut active = lock(&self.active);
        if let Some(run) = active.as_ref() {
            if !run.task.is_finished() {
                return Err(ListenerError::AlreadyRunning);
            }
        }

        let sets = Arc::new(RunSets::default());
        let (tx, rx) = mpsc::channel(self.config.queue_capacity.max(1));
        let (shutdown, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(poll_loop(
            Arc::clone(&self.exchange),
            self.config.clone(),
            Arc::clone(&sets),
            tx,
            shutdown_rx,
        ));

        *active = Some(ActiveRun {
            sets,
            shutdown,
            task,
        });
        tracing::info!("cosigner listener started");
        Ok(rx)
    }

    /// Stop polling. Idempotent.
    ///
    /// Waits up to `stop_grace` for an in-flight request to finish, then
    /// aborts the task. No notification is sent after this returns.
    pub async fn stop(&self) {
        let run = lock(&self.active).take();
        let Some(run) = run else {
            return;
        };

        // The receiver is gone if the task already exited.
        let _ = run.shutdown.send(true);

        let mut task = run.task;
        if tokio::time::timeout(self.config.stop_grace, &mut task)
            .await
            .is_err()
        {
            tracing::warn!("listener did not stop within grace period, aborting");
            task.abort();
            let _ = task.await;
        }
        tracing::info!("cosigner listener stopped");
    }

    /// Replace the watch set of the current run.
    ///
    /// Leaves the received set alone: an identifier already delivered stays
    /// delivered even if it leaves and re-enters the watch set.
    pub fn set_watch_set(&self, identifiers: Vec<Identifier>) {
        match lock(&self.active).as_ref() {
            Some(run) => {
                tracing::debug!(count = identifiers.len(), "watch set updated");
                *lock(&run.sets.watch_set) = identifiers;
            }
            None => tracing::debug!("ignoring watch set update, listener is stopped"),
        }
    }

    /// Acknowledge a delivered message.
    ///
    /// Deletes the record from the exchange, then forgets the identifier so
    /// that a later message under it is delivered again. If the delete
    /// fails the identifier stays received, so the same message is not
    /// delivered twice.
    pub async fn clear(&self, identifier: &Identifier) -> Result<()> {
        self.exchange.delete(identifier).await?;

        if let Some(run) = lock(&self.active).as_ref() {
            lock(&run.sets.received).remove(identifier);
        }
        tracing::debug!(identifier = %identifier, "cleared message");
        Ok(())
    }

    /// Whether `identifier` has been delivered in the current run.
    pub fn is_received(&self, identifier: &Identifier) -> bool {
        lock(&self.active)
            .as_ref()
            .map(|run| run.sets.is_received(identifier))
            .unwrap_or(false)
    }
}

impl<E: ExchangeClient + 'static> Drop for Listener<E> {
    fn drop(&mut self) {
        let active = self
            .active
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(run) = active {
            // The task finishes its current request, then exits without
            // sending anything.
            let _ = run.shutdown.send(true);
        }
    }
}

/// Sleep for `duration` unless shutdown is requested first.
///
/// Returns false if the loop should exit.
async fn pause(shutdown: &mut watch::Receiver<bool>, duration: Duration) -> bool {
    if *shutdown.borrow() {
        return false;
    }
    tokio::select! {
        _ = tokio::time::sleep(duration) => !*shutdown.borrow(),
        changed = shutdown.changed() => changed.is_ok() && !*shutdown.borrow(),
    }
}

async fn poll_loop<E: ExchangeClient>(
    exchange: Arc<E>,
    config: ListenerConfig,
    sets: Arc<RunSets>,
    tx: mpsc::Sender<Notification>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let watch_set = sets.watch_snapshot();
        if watch_set.is_empty() {
            if !pause(&mut shutdown, config.idle_backoff).await {
                return;
            }
            continue;
        }

        for identifier in watch_set {
            if *shutdown.borrow() {
                return;
            }
            if sets.is_received(&identifier) {
                continue;
            }

            match exchange.get(&identifier).await {
                Ok(Some(envelope)) => {
                    if *shutdown.borrow() {
                        return;
                    }
                    if !sets.mark_received(identifier) {
                        continue;
                    }
                    tracing::debug!(identifier = %identifier, "received message");

                    let notification = Notification {
                        identifier,
                        envelope,
                    };
                    tokio::select! {
                        sent = tx.send(notification) => {
                            if sent.is_err() {
                                tracing::debug!("notification receiver dropped, exiting");
                                return;
                            }
                        }
                        _ = shutdown.changed() => return,
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        identifier = %identifier,
                        "cannot contact cosigner pool: {}",
                        e
                    );
                    if !pause(&mut shutdown, config.failure_backoff).await {
                        return;
                    }
                }
            }
        }

        if !pause(&mut shutdown, config.poll_interval).await {
            return;
        }
    }
}
