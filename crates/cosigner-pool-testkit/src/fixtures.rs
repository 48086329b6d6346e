//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cosigner_pool::{KeyUnlocker, Notice, PayloadConsumer, Unlock};
use cosigner_pool_core::{
    ContextRef, ContextSnapshot, Identifier, LocalKeyRef, PublicKey, SecretKey,
};
use cosigner_pool_listener::ListenerConfig;

/// Install a test-friendly tracing subscriber. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Listener timings short enough for tests.
pub fn fast_listener_config() -> ListenerConfig {
    ListenerConfig::default()
        .with_idle_backoff(Duration::from_millis(5))
        .with_poll_interval(Duration::from_millis(10))
        .with_failure_backoff(Duration::from_millis(20))
        .with_stop_grace(Duration::from_millis(500))
}

/// A participant with a deterministic key.
#[derive(Debug, Clone)]
pub struct Cosigner {
    pub secret: SecretKey,
}

impl Cosigner {
    pub fn from_seed(seed: u8) -> Self {
        Self {
            secret: SecretKey::from_bytes([seed; 32]),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        self.secret.public_key()
    }

    pub fn identifier(&self) -> Identifier {
        self.public_key().identifier()
    }

    /// A context snapshot in which this cosigner holds the local key `"local"`.
    pub fn context(&self, name: &str) -> ContextSnapshot {
        ContextSnapshot::new(ContextRef::new(name)).with_local("local", self.public_key())
    }

    /// The key reference for [`context`](Self::context).
    pub fn key_ref(&self, name: &str) -> LocalKeyRef {
        LocalKeyRef {
            context: ContextRef::new(name),
            slot: "local".into(),
        }
    }
}

#[derive(Default)]
struct UnlockerState {
    keys: HashMap<LocalKeyRef, SecretKey>,
    declined: HashSet<LocalKeyRef>,
    requests: Vec<LocalKeyRef>,
}

/// Unlocker answering from a fixed table. Clones share state.
#[derive(Clone, Default)]
pub struct StaticUnlocker {
    state: Arc<Mutex<UnlockerState>>,
}

impl StaticUnlocker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(self, key: LocalKeyRef, secret: SecretKey) -> Self {
        self.state.lock().unwrap().keys.insert(key, secret);
        self
    }

    /// Answer `Declined` for this key, even if a secret is known.
    pub fn decline(&self, key: LocalKeyRef) {
        self.state.lock().unwrap().declined.insert(key);
    }

    pub fn allow(&self, key: &LocalKeyRef) {
        self.state.lock().unwrap().declined.remove(key);
    }

    /// Every key the pool asked for, in order.
    pub fn requests(&self) -> Vec<LocalKeyRef> {
        self.state.lock().unwrap().requests.clone()
    }
}

#[async_trait]
impl KeyUnlocker for StaticUnlocker {
    async fn unlock(&self, key: &LocalKeyRef) -> Unlock {
        let mut state = self.state.lock().unwrap();
        state.requests.push(key.clone());
        if state.declined.contains(key) {
            return Unlock::Declined;
        }
        match state.keys.get(key) {
            Some(secret) => Unlock::Key(secret.clone()),
            None => Unlock::Declined,
        }
    }
}

#[derive(Default)]
struct ConsumerState {
    delivered: Vec<(ContextRef, Vec<u8>)>,
    notices: Vec<(ContextRef, Notice)>,
}

/// Consumer that records everything it is given. Clones share state.
#[derive(Clone, Default)]
pub struct RecordingConsumer {
    state: Arc<Mutex<ConsumerState>>,
}

impl RecordingConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<(ContextRef, Vec<u8>)> {
        self.state.lock().unwrap().delivered.clone()
    }

    pub fn notices(&self) -> Vec<(ContextRef, Notice)> {
        self.state.lock().unwrap().notices.clone()
    }
}

impl PayloadConsumer for RecordingConsumer {
    fn deliver(&self, context: &ContextRef, payload: Vec<u8>) {
        self.state
            .lock()
            .unwrap()
            .delivered
            .push((context.clone(), payload));
    }

    fn notify(&self, context: &ContextRef, notice: Notice) {
        self.state
            .lock()
            .unwrap()
            .notices
            .push((context.clone(), notice));
    }
}
