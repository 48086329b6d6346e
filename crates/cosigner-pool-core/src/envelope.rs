//! Envelope codec.
//!
//! A payload is sealed to a recipient public key:
//!
//! 1. Generate an ephemeral X25519 key and agree with the recipient key
//! 2. Derive a ChaCha20-Poly1305 key from the shared secret, the ephemeral
//!    public key and the recipient public key
//! 3. Encrypt under a random nonce and wrap everything in a CBOR map
//!
//! Nothing about the envelope is meaningful to the exchange; it only ever
//! sees the serialized bytes.

use bytes::Bytes;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::{PublicKey, SecretKey, KEY_LEN};
use crate::error::{CoreError, Result};

/// Current envelope format version.
pub const ENVELOPE_VERSION: u8 = 1;

const KDF_CONTEXT: &str = "cosigner-pool v1 envelope key";
const NONCE_LEN: usize = 12;

/// An encrypted blob as stored in the exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct Envelope(Bytes);

impl Envelope {
    /// Wrap bytes fetched from the exchange.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// The serialized envelope.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume into the underlying buffer.
    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Envelope({} bytes)", self.0.len())
    }
}

impl AsRef<[u8]> for Envelope {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// On-the-wire layout of a sealed payload.
#[derive(Serialize, Deserialize)]
struct SealedPayload {
    version: u8,
    ephemeral: Bytes,
    nonce: Bytes,
    ciphertext: Bytes,
}

fn content_key(shared: &[u8; KEY_LEN], ephemeral: &PublicKey, recipient: &PublicKey) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(KDF_CONTEXT);
    hasher.update(shared);
    hasher.update(ephemeral.as_bytes());
    hasher.update(recipient.as_bytes());
    *hasher.finalize().as_bytes()
}

/// Encrypt `payload` so that only the holder of `recipient`'s secret can read it.
pub fn seal(payload: &[u8], recipient: &PublicKey) -> Result<Envelope> {
    let ephemeral = SecretKey::generate();
    let ephemeral_public = ephemeral.public_key();
    let shared = ephemeral
        .agree(recipient)
        .ok_or_else(|| CoreError::InvalidKey("recipient key is a low-order point".into()))?;

    let key = content_key(&shared, &ephemeral_public, recipient);
    let cipher = ChaCha20Poly1305::new(&key.into());

    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), payload)
        .map_err(|e| CoreError::EncryptFailed(e.to_string()))?;

    let sealed = SealedPayload {
        version: ENVELOPE_VERSION,
        ephemeral: Bytes::copy_from_slice(ephemeral_public.as_bytes()),
        nonce: Bytes::copy_from_slice(&nonce),
        ciphertext: Bytes::from(ciphertext),
    };

    let mut buf = Vec::new();
    ciborium::into_writer(&sealed, &mut buf)
        .map_err(|e| CoreError::EncryptFailed(e.to_string()))?;
    Ok(Envelope(Bytes::from(buf)))
}

/// Decrypt an envelope with a local secret key.
///
/// Every failure collapses into [`CoreError::DecryptFailed`].
pub fn open(envelope: &Envelope, secret: &SecretKey) -> Result<Vec<u8>> {
    let sealed: SealedPayload =
        ciborium::from_reader(envelope.as_bytes()).map_err(|_| CoreError::DecryptFailed)?;
    if sealed.version != ENVELOPE_VERSION || sealed.nonce.len() != NONCE_LEN {
        return Err(CoreError::DecryptFailed);
    }

    let ephemeral =
        PublicKey::from_slice(&sealed.ephemeral).map_err(|_| CoreError::DecryptFailed)?;
    let shared = secret.agree(&ephemeral).ok_or(CoreError::DecryptFailed)?;

    let key = content_key(&shared, &ephemeral, &secret.public_key());
    ChaCha20Poly1305::new(&key.into())
        .decrypt(Nonce::from_slice(&sealed.nonce), sealed.ciphertext.as_ref())
        .map_err(|_| CoreError::DecryptFailed)
}
