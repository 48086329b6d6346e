//! Error types for the listener.

use cosigner_pool_exchange::ExchangeError;
use thiserror::Error;

/// Errors that can occur while driving the listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// `start` was called on a running listener.
    #[error("listener is already running")]
    AlreadyRunning,

    /// The exchange rejected or could not serve a request.
    #[error("exchange error: {0}")]
    Exchange(#[from] ExchangeError),
}

/// Result type for listener operations.
pub type Result<T> = std::result::Result<T, ListenerError>;
