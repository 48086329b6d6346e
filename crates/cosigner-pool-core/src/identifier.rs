//! Pool identifiers.
//!
//! An identifier is the Blake3 hash of a public key's raw bytes. It is the
//! record key in the exchange and the only correlation token shared between
//! sender and recipient, so it is never stored apart from the key it came
//! from.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::PublicKey;
use crate::error::Result;

/// A 32-byte identifier derived from a cosigner public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier([u8; 32]);

impl Identifier {
    /// Derive the identifier for a public key.
    pub fn derive(key: &PublicKey) -> Self {
        Self(*blake3::hash(key.as_bytes()).as_bytes())
    }

    /// Derive the identifier from raw public key bytes.
    ///
    /// Fails with `InvalidKey` on empty or malformed key material instead of
    /// hashing it into a degenerate identifier.
    pub fn from_key_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::derive(&PublicKey::from_slice(bytes)?))
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> std::result::Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Identifier {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SecretKey;
    use crate::error::CoreError;
    use proptest::prelude::*;

    #[test]
    fn test_identifier_hex_roundtrip() {
        let key = SecretKey::from_bytes([0x42; 32]).public_key();
        let id = key.identifier();
        assert_eq!(Identifier::from_hex(&id.to_hex()).unwrap(), id);
    }

    #[test]
    fn test_identifier_is_hash_of_key_bytes() {
        let key = SecretKey::from_bytes([0x11; 32]).public_key();
        let expected = *blake3::hash(key.as_bytes()).as_bytes();
        assert_eq!(key.identifier().as_bytes(), &expected);
    }

    #[test]
    fn test_invalid_key_material() {
        assert!(matches!(
            Identifier::from_key_bytes(&[]),
            Err(CoreError::InvalidKey(_))
        ));
        assert!(matches!(
            Identifier::from_key_bytes(b"not a key"),
            Err(CoreError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_identifier_display() {
        let id = Identifier([0xab; 32]);
        assert_eq!(format!("{}", id), "abababababababab");
        assert!(format!("{:?}", id).starts_with("Identifier("));
    }

    #[test]
    fn test_from_hex_rejects_short_input() {
        assert!(Identifier::from_hex("abcd").is_err());
    }

    proptest! {
        #[test]
        fn derive_is_deterministic(seed in any::<[u8; 32]>()) {
            let key = SecretKey::from_bytes(seed).public_key();
            let first = Identifier::from_key_bytes(key.as_bytes()).unwrap();
            let second = Identifier::from_key_bytes(key.as_bytes()).unwrap();
            prop_assert_eq!(first, second);
            prop_assert_eq!(first, key.identifier());
        }
    }
}
