//! Fault-injecting exchanges.
//!
//! Both wrap a [`MemoryExchange`] so tests can seed and inspect records
//! directly while the listener sees failures or stalls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use cosigner_pool_core::{Envelope, Identifier};
use cosigner_pool_exchange::{ExchangeClient, ExchangeError, MemoryExchange, Result};
use tokio::sync::{Notify, Semaphore};

/// Exchange that fails a configurable number of requests.
#[derive(Default)]
pub struct FlakyExchange {
    inner: MemoryExchange,
    failing_gets: AtomicUsize,
    failing_deletes: AtomicUsize,
    down: AtomicBool,
    gets: Mutex<HashMap<Identifier, usize>>,
}

impl FlakyExchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// The backing store.
    pub fn inner(&self) -> &MemoryExchange {
        &self.inner
    }

    /// Fail the next `n` gets with [`ExchangeError::Unreachable`].
    pub fn fail_next_gets(&self, n: usize) {
        self.failing_gets.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_deletes(&self, n: usize) {
        self.failing_deletes.store(n, Ordering::SeqCst);
    }

    /// Fail every request until set back to false.
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// Gets issued for `id`, failed ones included.
    pub fn gets_for(&self, id: &Identifier) -> usize {
        self.gets.lock().unwrap().get(id).copied().unwrap_or(0)
    }

    pub fn total_gets(&self) -> usize {
        self.gets.lock().unwrap().values().sum()
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn check(&self, counter: &AtomicUsize) -> Result<()> {
        if self.down.load(Ordering::SeqCst) || Self::take_failure(counter) {
            return Err(ExchangeError::Unreachable("injected failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ExchangeClient for FlakyExchange {
    async fn get(&self, id: &Identifier) -> Result<Option<Envelope>> {
        *self.gets.lock().unwrap().entry(*id).or_default() += 1;
        self.check(&self.failing_gets)?;
        self.inner.get(id).await
    }

    async fn put(&self, id: &Identifier, envelope: &Envelope) -> Result<()> {
        if self.down.load(Ordering::SeqCst) {
            return Err(ExchangeError::Unreachable("injected failure".into()));
        }
        self.inner.put(id, envelope).await
    }

    async fn delete(&self, id: &Identifier) -> Result<()> {
        self.check(&self.failing_deletes)?;
        self.inner.delete(id).await
    }
}

/// Exchange whose gets block until the test releases them.
///
/// Each get signals [`entered`](Self::entered) and then waits for a permit.
pub struct GatedExchange {
    inner: MemoryExchange,
    entered: Notify,
    gate: Semaphore,
}

impl Default for GatedExchange {
    fn default() -> Self {
        Self {
            inner: MemoryExchange::new(),
            entered: Notify::new(),
            gate: Semaphore::new(0),
        }
    }
}

impl GatedExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &MemoryExchange {
        &self.inner
    }

    /// Wait until a get is blocked on the gate.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let `n` blocked or future gets proceed.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }
}

#[async_trait]
impl ExchangeClient for GatedExchange {
    async fn get(&self, id: &Identifier) -> Result<Option<Envelope>> {
        self.entered.notify_one();
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| ExchangeError::Unreachable(e.to_string()))?;
        permit.forget();
        self.inner.get(id).await
    }

    async fn put(&self, id: &Identifier, envelope: &Envelope) -> Result<()> {
        self.inner.put(id, envelope).await
    }

    async fn delete(&self, id: &Identifier) -> Result<()> {
        self.inner.delete(id).await
    }
}
