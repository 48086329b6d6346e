//! # Cosigner Pool Listener
//!
//! Background polling of the exchange for messages addressed to local keys.
//!
//! ## Overview
//!
//! The listener owns two sets for the lifetime of one run:
//!
//! - **watch set**: identifiers to poll, replaced wholesale whenever the
//!   directory is rebuilt
//! - **received set**: identifiers already surfaced in this run; they are
//!   not polled again until explicitly cleared
//!
//! Newly found messages are handed off through a bounded channel returned by
//! [`Listener::start`]. Transport failures never stop the loop; they are
//! logged and followed by a longer pause.
//!
//! ## Lifecycle
//!
//! ```text
//! Stopped --start()--> Running --stop()--> Stopped
//! ```
//!
//! Each `start` begins with an empty received set and a fresh channel.
//! Once `stop` returns no further notification is sent.

pub mod config;
pub mod error;
pub mod listener;

pub use config::ListenerConfig;
pub use error::{ListenerError, Result};
pub use listener::{Listener, ListenerStatus, Notification};
