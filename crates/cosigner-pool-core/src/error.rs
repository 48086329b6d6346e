//! Error types for the cosigner pool core.

use thiserror::Error;

/// Errors that can occur in key handling and envelope operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Key material is empty, has the wrong length, or is a degenerate point.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The envelope could not be opened with the given key.
    ///
    /// Deliberately carries no detail: a wrong key, a truncated blob and a
    /// tampered ciphertext are indistinguishable to the caller.
    #[error("envelope could not be decrypted")]
    DecryptFailed,

    /// Sealing the payload failed.
    #[error("encryption failed: {0}")]
    EncryptFailed(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
