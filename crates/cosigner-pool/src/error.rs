//! Error types for the cosigner pool.

use cosigner_pool_core::CoreError;
use cosigner_pool_exchange::ExchangeError;
use cosigner_pool_listener::ListenerError;
use thiserror::Error;

/// Errors that can occur during pool operations.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Key or envelope error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Exchange error.
    #[error("exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    /// Listener error.
    #[error("listener error: {0}")]
    Listener(#[from] ListenerError),
}

/// Result type for pool operations.
pub type Result<T> = std::result::Result<T, PoolError>;
