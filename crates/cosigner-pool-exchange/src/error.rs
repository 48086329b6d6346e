//! Error types for exchange operations.

use thiserror::Error;

/// Errors returned by an exchange backend.
///
/// A missing record is not an error; `get` reports it as `Ok(None)`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExchangeError {
    /// The service could not be reached (network or transport failure).
    #[error("exchange unreachable: {0}")]
    Unreachable(String),

    /// The service answered but rejected the request.
    #[error("exchange rejected request: {0}")]
    Remote(String),
}

/// Result type for exchange operations.
pub type Result<T> = std::result::Result<T, ExchangeError>;
