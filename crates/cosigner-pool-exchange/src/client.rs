//! The exchange client trait.

use std::sync::Arc;

use async_trait::async_trait;
use cosigner_pool_core::{Envelope, Identifier};

use crate::error::Result;

/// Client for the remote exchange service.
///
/// Implementations must be thread-safe; the listener polls from a background
/// task while the host sends from its own. No call carries a timeout of its
/// own; callers pace themselves.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Fetch the envelope stored under `id`. `Ok(None)` if there is none.
    async fn get(&self, id: &Identifier) -> Result<Option<Envelope>>;

    /// Store `envelope` under `id`, replacing any previous value.
    async fn put(&self, id: &Identifier, envelope: &Envelope) -> Result<()>;

    /// Remove the record under `id`. Removing a missing record succeeds.
    async fn delete(&self, id: &Identifier) -> Result<()>;
}

#[async_trait]
impl<T: ExchangeClient + ?Sized> ExchangeClient for Arc<T> {
    async fn get(&self, id: &Identifier) -> Result<Option<Envelope>> {
        (**self).get(id).await
    }

    async fn put(&self, id: &Identifier, envelope: &Envelope) -> Result<()> {
        (**self).put(id, envelope).await
    }

    async fn delete(&self, id: &Identifier) -> Result<()> {
        (**self).delete(id).await
    }
}
