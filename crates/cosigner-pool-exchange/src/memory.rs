//! In-memory exchange.
//!
//! Same semantics as the remote service, no persistence. Useful for tests
//! and for hosts that run every participant in one process.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use cosigner_pool_core::{Envelope, Identifier};

use crate::client::ExchangeClient;
use crate::error::Result;

/// In-process exchange backed by a `HashMap`.
#[derive(Default)]
pub struct MemoryExchange {
    records: RwLock<HashMap<Identifier, Envelope>>,
}

impl MemoryExchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a record exists under `id`.
    pub fn contains(&self, id: &Identifier) -> bool {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }
}

#[async_trait]
impl ExchangeClient for MemoryExchange {
    async fn get(&self, id: &Identifier) -> Result<Option<Envelope>> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(id).cloned())
    }

    async fn put(&self, id: &Identifier, envelope: &Envelope) -> Result<()> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        if records.insert(*id, envelope.clone()).is_some() {
            tracing::trace!(identifier = %id, "replaced record");
        }
        Ok(())
    }

    async fn delete(&self, id: &Identifier) -> Result<()> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.remove(id);
        Ok(())
    }
}
