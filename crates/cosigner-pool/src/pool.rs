//! The cosigner pool: directory, listener and dispatch wired together.

use std::sync::Arc;

use cosigner_pool_core::{ContextRef, ContextSnapshot, Directory, PayloadDescriptor};
use cosigner_pool_exchange::ExchangeClient;
use cosigner_pool_listener::{Listener, Notification};
use tokio::sync::{mpsc, Mutex, RwLock};

use crate::config::PoolConfig;
use crate::dispatch::{self, ReceiveOutcome, SendReport};
use crate::error::Result;
use crate::host::{KeyUnlocker, PayloadConsumer};

/// Relays payloads between the local contexts and their cosigners.
///
/// The host calls [`update`](Self::update) whenever a context opens or
/// closes, drives [`receive_next`](Self::receive_next) from whichever task
/// should handle incoming payloads, and calls [`send`](Self::send) to hand a
/// payload to the cosigners that can sign it.
///
/// Directory rebuilds and notification handling never interleave: handling
/// holds the directory for reading until it is done, a rebuild waits for
/// the write lock.
pub struct CosignerPool<E, U, C>
where
    E: ExchangeClient + 'static,
    U: KeyUnlocker,
    C: PayloadConsumer,
{
    exchange: Arc<E>,
    listener: Listener<E>,
    directory: RwLock<Arc<Directory>>,
    notifications: Mutex<Option<mpsc::Receiver<Notification>>>,
    updates: Mutex<()>,
    unlocker: U,
    consumer: C,
}

impl<E, U, C> CosignerPool<E, U, C>
where
    E: ExchangeClient + 'static,
    U: KeyUnlocker,
    C: PayloadConsumer,
{
    pub fn new(exchange: Arc<E>, unlocker: U, consumer: C, config: PoolConfig) -> Self {
        let listener = Listener::new(Arc::clone(&exchange), config.listener);
        Self {
            exchange,
            listener,
            directory: RwLock::new(Arc::new(Directory::empty())),
            notifications: Mutex::new(None),
            updates: Mutex::new(()),
            unlocker,
            consumer,
        }
    }

    pub fn listener(&self) -> &Listener<E> {
        &self.listener
    }

    pub fn exchange(&self) -> &Arc<E> {
        &self.exchange
    }

    /// The current directory snapshot.
    pub async fn directory(&self) -> Arc<Directory> {
        Arc::clone(&*self.directory.read().await)
    }

    /// Rebuild the directory from the active contexts.
    ///
    /// Starts the listener when the first context becomes active, stops it
    /// when none remain, and hands the listener the new watch set.
    pub async fn update(&self, contexts: &[ContextSnapshot]) -> Result<()> {
        let _serial = self.updates.lock().await;

        let directory = Directory::rebuild(contexts);
        let watch_set = directory.watch_set();
        *self.directory.write().await = Arc::new(directory);

        if contexts.is_empty() {
            if self.listener.is_running() {
                tracing::info!("no active contexts, shutting down listener");
            }
            self.listener.stop().await;
            // The channel is closed by now, so no receiver holds this lock.
            self.notifications.lock().await.take();
        } else if !self.listener.is_running() {
            tracing::info!(contexts = contexts.len(), "starting listener");
            let rx = self.listener.start()?;
            *self.notifications.lock().await = Some(rx);
        }

        self.listener.set_watch_set(watch_set);
        Ok(())
    }

    /// Whether to offer sending this payload to a cosigner of `context`.
    pub async fn should_offer_send(
        &self,
        context: &ContextRef,
        descriptor: &PayloadDescriptor,
    ) -> bool {
        self.directory
            .read()
            .await
            .should_offer_send(context, descriptor)
    }

    /// Send a payload to every cosigner that can sign it.
    pub async fn send(&self, payload: &[u8], descriptor: &PayloadDescriptor) -> SendReport {
        let directory = self.directory.read().await;
        dispatch::send(
            &directory,
            self.exchange.as_ref(),
            &self.consumer,
            payload,
            descriptor,
        )
        .await
    }

    /// Wait for the next notification and handle it.
    ///
    /// Returns `None` when the listener is not running, or once it stops.
    pub async fn receive_next(&self) -> Option<ReceiveOutcome> {
        let notification = {
            let mut slot = self.notifications.lock().await;
            slot.as_mut()?.recv().await?
        };
        Some(self.handle(notification).await)
    }

    /// Handle one pending notification, if any, without waiting.
    pub async fn try_receive(&self) -> Option<ReceiveOutcome> {
        let notification = {
            let mut slot = self.notifications.try_lock().ok()?;
            slot.as_mut()?.try_recv().ok()?
        };
        Some(self.handle(notification).await)
    }

    async fn handle(&self, notification: Notification) -> ReceiveOutcome {
        let directory = self.directory.read().await;
        dispatch::receive(
            &directory,
            &self.listener,
            &self.unlocker,
            &self.consumer,
            notification,
        )
        .await
    }

    /// Stop the listener. The directory is left as it is.
    pub async fn shutdown(&self) {
        let _serial = self.updates.lock().await;
        self.listener.stop().await;
        self.notifications.lock().await.take();
    }
}
