//! Pool configuration.

use cosigner_pool_listener::ListenerConfig;

/// Configuration for a [`CosignerPool`](crate::CosignerPool).
#[derive(Debug, Clone, Default)]
pub struct PoolConfig {
    /// Listener pacing.
    pub listener: ListenerConfig,
}

impl PoolConfig {
    pub fn with_listener(mut self, listener: ListenerConfig) -> Self {
        self.listener = listener;
        self
    }
}
