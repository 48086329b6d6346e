//! Proptest strategies.

use cosigner_pool_core::{PayloadDescriptor, PublicKey, SecretKey};
use proptest::prelude::*;

/// Arbitrary secret keys.
pub fn secret_key_strategy() -> impl Strategy<Value = SecretKey> {
    any::<[u8; 32]>().prop_map(SecretKey::from_bytes)
}

/// Payloads up to 4 KiB, empty included.
pub fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..4096)
}

/// Descriptors over up to `max` arbitrary candidate keys.
pub fn descriptor_strategy(max: usize) -> impl Strategy<Value = (Vec<PublicKey>, PayloadDescriptor)> {
    prop::collection::vec(secret_key_strategy(), 0..=max).prop_map(|secrets| {
        let keys: Vec<PublicKey> = secrets.iter().map(SecretKey::public_key).collect();
        let descriptor = PayloadDescriptor::new(keys.iter().copied());
        (keys, descriptor)
    })
}
