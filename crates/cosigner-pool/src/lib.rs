//! # Cosigner Pool
//!
//! Exchange partially-signed payloads between the participants of a
//! multi-party signing setup through a shared, untrusted key-value store.
//!
//! ## Overview
//!
//! Every cosigner key maps to an identifier (the Blake3 hash of the key).
//! To ask a cosigner for a signature, the payload is sealed to their public
//! key and stored under their identifier. A background listener polls the
//! identifiers of our own keys and hands anything it finds to the receive
//! path, which unlocks the matching secret key and decrypts.
//!
//! ```text
//! contexts open/close --> Directory::rebuild --> Listener watch set
//!                                                     |
//!                         Exchange.get <--------------+
//!                              |
//!                         Notification --> receive --> KeyUnlocker --> open --> PayloadConsumer
//!
//! send --> Directory.recipients_for --> seal --> Exchange.put
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cosigner_pool::exchange::{RpcConfig, RpcExchange};
//! use cosigner_pool::{ContextSnapshot, CosignerPool, KeyUnlocker, PayloadConsumer, PoolConfig};
//!
//! async fn run<U: KeyUnlocker, C: PayloadConsumer>(
//!     endpoint: &str,
//!     unlocker: U,
//!     consumer: C,
//!     contexts: Vec<ContextSnapshot>,
//! ) -> cosigner_pool::Result<()> {
//!     let exchange = Arc::new(RpcExchange::new(RpcConfig::new(endpoint))?);
//!     let pool = CosignerPool::new(exchange, unlocker, consumer, PoolConfig::default());
//!
//!     pool.update(&contexts).await?;
//!     while let Some(outcome) = pool.receive_next().await {
//!         println!("{:?}", outcome);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `cosigner_pool::core` - Identifiers, keys, envelopes, directory
//! - `cosigner_pool::exchange` - Exchange client trait and backends
//! - `cosigner_pool::listener` - The polling listener

pub mod config;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod pool;

// Re-export component crates
pub use cosigner_pool_core as core;
pub use cosigner_pool_exchange as exchange;
pub use cosigner_pool_listener as listener;

pub use config::PoolConfig;
pub use dispatch::{ReceiveOutcome, SendReport};
pub use error::{PoolError, Result};
pub use host::{KeyUnlocker, Notice, PayloadConsumer, Unlock};
pub use pool::CosignerPool;

pub use cosigner_pool_core::{
    ContextRef, ContextSnapshot, Directory, Envelope, Identifier, LocalKeyRef, PayloadDescriptor,
    PublicKey, SecretKey,
};
pub use cosigner_pool_exchange::{ExchangeClient, ExchangeError, MemoryExchange};
pub use cosigner_pool_listener::{ListenerConfig, ListenerStatus};
