//! Interfaces the host application implements.
//!
//! The pool never prompts, displays or parses anything itself. It asks the
//! host for secret keys through [`KeyUnlocker`] and hands results back
//! through [`PayloadConsumer`].

use std::fmt;

use async_trait::async_trait;
use cosigner_pool_core::{ContextRef, Identifier, LocalKeyRef, SecretKey};

/// Answer to a request for a local secret key.
#[derive(Debug)]
pub enum Unlock {
    Key(SecretKey),
    /// The user refused, cancelled or entered a wrong password.
    Declined,
}

/// Supplies local secret keys, possibly after an interactive unlock.
#[async_trait]
pub trait KeyUnlocker: Send + Sync {
    async fn unlock(&self, key: &LocalKeyRef) -> Unlock;
}

/// A user-facing outcome of a send or receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Sent { identifier: Identifier },
    SendFailed { identifier: Identifier, reason: String },
    DecryptFailed { identifier: Identifier },
    ClearFailed { identifier: Identifier, reason: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Sent { .. } => write!(
                f,
                "Your transaction was sent to the cosigner pool. \
                 Open your cosigner wallet to retrieve it."
            ),
            Notice::SendFailed { .. } => {
                write!(f, "Failed to send transaction to the cosigner pool.")
            }
            Notice::DecryptFailed { .. } => write!(
                f,
                "A transaction retrieved from the cosigner pool could not be decrypted."
            ),
            Notice::ClearFailed { .. } => write!(
                f,
                "The transaction was retrieved but could not be removed from the cosigner pool."
            ),
        }
    }
}

/// Receives decrypted payloads and user-facing notices.
pub trait PayloadConsumer: Send + Sync {
    /// A payload addressed to one of the context's local keys.
    fn deliver(&self, context: &ContextRef, payload: Vec<u8>);

    fn notify(&self, context: &ContextRef, notice: Notice);
}
