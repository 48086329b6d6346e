//! What the pool needs to know about a payload it is asked to relay.
//!
//! The payload itself is an opaque byte string. The host extracts the set of
//! public keys embedded in it and a couple of signing-state flags.

use std::collections::BTreeSet;

use crate::crypto::PublicKey;

/// Host-extracted facts about a partially-signed payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayloadDescriptor {
    /// Public keys that may contribute a signature to this payload.
    pub candidate_keys: BTreeSet<PublicKey>,
    /// The payload already carries every signature it needs.
    pub complete: bool,
    /// The local context can add a signature itself.
    pub locally_signable: bool,
}

impl PayloadDescriptor {
    /// Describe an incomplete payload that the local context cannot sign.
    pub fn new(candidate_keys: impl IntoIterator<Item = PublicKey>) -> Self {
        Self {
            candidate_keys: candidate_keys.into_iter().collect(),
            complete: false,
            locally_signable: false,
        }
    }

    pub fn complete(mut self, complete: bool) -> Self {
        self.complete = complete;
        self
    }

    pub fn locally_signable(mut self, signable: bool) -> Self {
        self.locally_signable = signable;
        self
    }
}

/// Whether `recipient` is one of the keys that can sign the payload.
pub fn can_sign(descriptor: &PayloadDescriptor, recipient: &PublicKey) -> bool {
    descriptor.candidate_keys.contains(recipient)
}
