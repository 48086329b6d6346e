//! # Cosigner Pool Exchange
//!
//! The remote key-value service that carries envelopes between cosigners.
//!
//! ## Overview
//!
//! The exchange is an opaque store addressed by [`Identifier`]. It offers
//! three operations and nothing else:
//!
//! - `get` returns the envelope stored under an identifier, if any
//! - `put` stores an envelope, replacing whatever was there
//! - `delete` removes it
//!
//! There is no authentication: anyone who knows an identifier can read or
//! overwrite its record. Confidentiality comes from the envelope encryption.
//!
//! ## Implementations
//!
//! - [`MemoryExchange`] - In-process store for tests and embedded use
//! - [`RpcExchange`] - JSON-RPC over HTTP (feature `http-rpc`)
//!
//! [`Identifier`]: cosigner_pool_core::Identifier

pub mod client;
pub mod error;
pub mod memory;
#[cfg(feature = "http-rpc")]
pub mod rpc;

pub use client::ExchangeClient;
pub use error::{ExchangeError, Result};
pub use memory::MemoryExchange;
#[cfg(feature = "http-rpc")]
pub use rpc::{RpcConfig, RpcExchange};
