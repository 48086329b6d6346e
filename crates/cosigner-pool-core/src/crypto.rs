//! X25519 key types.
//!
//! Cosigner keys are only ever used for key agreement: the pool encrypts to
//! them, it never signs with them.

use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use x25519_dalek::StaticSecret;

use crate::error::{CoreError, Result};
use crate::identifier::Identifier;

/// Length of an X25519 key in bytes.
pub const KEY_LEN: usize = 32;

/// An X25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PublicKey([u8; KEY_LEN]);

impl PublicKey {
    /// Parse a public key from raw bytes.
    ///
    /// Rejects anything that is not exactly 32 bytes, and the all-zero key.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(CoreError::InvalidKey("empty key material".into()));
        }
        let arr: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            CoreError::InvalidKey(format!("expected {KEY_LEN} bytes, got {}", bytes.len()))
        })?;
        Self::from_bytes(arr)
    }

    /// Create from a fixed-size array.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Result<Self> {
        if bytes == [0u8; KEY_LEN] {
            return Err(CoreError::InvalidKey("all-zero public key".into()));
        }
        Ok(Self(bytes))
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// The pool identifier messages for this key are stored under.
    pub fn identifier(&self) -> Identifier {
        Identifier::derive(self)
    }

    pub(crate) fn to_dalek(self) -> x25519_dalek::PublicKey {
        x25519_dalek::PublicKey::from(self.0)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = CoreError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::from_slice(bytes)
    }
}

/// An X25519 secret key held by a local signing slot.
#[derive(Clone)]
pub struct SecretKey(StaticSecret);

impl SecretKey {
    /// Generate a new random secret.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(StaticSecret::from(bytes))
    }

    /// Create from raw secret bytes.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(StaticSecret::from(bytes))
    }

    /// Derive the matching public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(*x25519_dalek::PublicKey::from(&self.0).as_bytes())
    }

    /// Key agreement with a peer key. `None` if the result is non-contributory.
    pub(crate) fn agree(&self, peer: &PublicKey) -> Option<[u8; KEY_LEN]> {
        let shared = self.0.diffie_hellman(&peer.to_dalek());
        shared.was_contributory().then(|| *shared.as_bytes())
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SecretKey").field(&self.public_key()).finish()
    }
}
