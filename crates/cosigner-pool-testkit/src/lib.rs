//! # Cosigner Pool Testkit
//!
//! Testing utilities for the cosigner pool.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: Deterministic cosigner keys, recording host collaborators
//!   and fast listener timings
//! - **Exchanges**: Wrappers around [`MemoryExchange`] that fail, count or
//!   block requests on demand
//! - **Generators**: Proptest strategies for keys and payloads
//!
//! The end-to-end scenarios live in this crate's `tests/` directory.
//!
//! ## Test Fixtures
//!
//! ```rust
//! use cosigner_pool_testkit::fixtures::Cosigner;
//!
//! let alice = Cosigner::from_seed(1);
//! let snapshot = alice.context("wallet-a").with_remote("bob", Cosigner::from_seed(2).public_key());
//! assert_eq!(snapshot.cosigners.len(), 2);
//! ```
//!
//! [`MemoryExchange`]: cosigner_pool_exchange::MemoryExchange

pub mod exchange;
pub mod fixtures;
pub mod generators;

pub use exchange::{FlakyExchange, GatedExchange};
pub use fixtures::{
    fast_listener_config, init_tracing, Cosigner, RecordingConsumer, StaticUnlocker,
};
pub use generators::{descriptor_strategy, payload_strategy, secret_key_strategy};
