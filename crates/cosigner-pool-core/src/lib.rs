//! # Cosigner Pool Core
//!
//! Pure primitives for relaying partially-signed payloads between the
//! participants of a multi-party signing setup.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over key material and directory snapshots.
//!
//! ## Key Types
//!
//! - [`Identifier`] - Lookup key for one public key (Blake3 of the key bytes)
//! - [`PublicKey`] / [`SecretKey`] - X25519 key pair halves
//! - [`Envelope`] - Opaque encrypted blob exchanged through the pool
//! - [`Directory`] - Which identifiers are "mine" and which are "theirs"
//!
//! ## Envelope Model
//!
//! Envelopes are sealed to a recipient public key with an ephemeral X25519
//! key agreement and ChaCha20-Poly1305. Only the holder of the matching
//! secret key can open them; every failure to open is reported as the same
//! opaque [`CoreError::DecryptFailed`].

pub mod crypto;
pub mod directory;
pub mod envelope;
pub mod error;
pub mod identifier;
pub mod payload;

pub use crypto::{PublicKey, SecretKey};
pub use directory::{
    ContextRef, ContextSnapshot, CosignerKey, Directory, LocalKeyRef, MineEntry, TheirsEntry,
};
pub use envelope::{open, seal, Envelope, ENVELOPE_VERSION};
pub use error::{CoreError, Result};
pub use identifier::Identifier;
pub use payload::{can_sign, PayloadDescriptor};
