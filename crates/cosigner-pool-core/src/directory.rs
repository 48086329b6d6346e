//! Cosigner directory.
//!
//! The directory maps the cosigner keys of every active context to pool
//! identifiers, split in two:
//!
//! - **mine**: keys whose secret half is held locally. Messages stored under
//!   these identifiers are for us, so the listener watches them.
//! - **theirs**: keys held by other participants. Payloads we want them to
//!   sign are sealed to these keys and stored under their identifiers.
//!
//! A directory is never edited in place. The host takes a snapshot of its
//! active contexts whenever one opens or closes and calls
//! [`Directory::rebuild`]; the result replaces the previous directory as a
//! whole.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::crypto::PublicKey;
use crate::identifier::Identifier;
use crate::payload::{can_sign, PayloadDescriptor};

/// Handle naming one active signing context (for example one wallet).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextRef(String);

impl ContextRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One local key slot within one context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalKeyRef {
    pub context: ContextRef,
    pub slot: String,
}

/// A cosigner key as configured in a context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CosignerKey {
    /// Slot name within the context.
    pub slot: String,
    /// Raw public key bytes, unvalidated.
    pub public_key: Vec<u8>,
    /// The secret half is available to this context.
    pub has_private: bool,
}

/// The cosigner configuration of one active context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSnapshot {
    pub context: ContextRef,
    pub cosigners: Vec<CosignerKey>,
}

impl ContextSnapshot {
    pub fn new(context: ContextRef) -> Self {
        Self {
            context,
            cosigners: Vec::new(),
        }
    }

    /// Add a key whose secret is held locally.
    pub fn with_local(mut self, slot: impl Into<String>, public_key: impl AsRef<[u8]>) -> Self {
        self.cosigners.push(CosignerKey {
            slot: slot.into(),
            public_key: public_key.as_ref().to_vec(),
            has_private: true,
        });
        self
    }

    /// Add a key held by another participant.
    pub fn with_remote(mut self, slot: impl Into<String>, public_key: impl AsRef<[u8]>) -> Self {
        self.cosigners.push(CosignerKey {
            slot: slot.into(),
            public_key: public_key.as_ref().to_vec(),
            has_private: false,
        });
        self
    }
}

/// A key we can decrypt messages for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MineEntry {
    key: LocalKeyRef,
    identifier: Identifier,
}

impl MineEntry {
    pub fn key(&self) -> &LocalKeyRef {
        &self.key
    }

    pub fn identifier(&self) -> Identifier {
        self.identifier
    }

    pub fn context(&self) -> &ContextRef {
        &self.key.context
    }
}

/// A counterpart key we can encrypt messages to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TheirsEntry {
    context: ContextRef,
    public_key: PublicKey,
    identifier: Identifier,
}

impl TheirsEntry {
    pub fn context(&self) -> &ContextRef {
        &self.context
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn identifier(&self) -> Identifier {
        self.identifier
    }
}

/// Snapshot of which identifiers are ours and which are our counterparts'.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    mine: Vec<MineEntry>,
    theirs: Vec<TheirsEntry>,
    skipped: usize,
}

impl Directory {
    /// An empty directory (no active contexts).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a fresh directory from the currently active contexts.
    ///
    /// Keys that fail to parse are logged and skipped; they do not affect
    /// other keys or contexts.
    pub fn rebuild(contexts: &[ContextSnapshot]) -> Self {
        let mut directory = Self::default();

        for snapshot in contexts {
            for cosigner in &snapshot.cosigners {
                let public_key = match PublicKey::from_slice(&cosigner.public_key) {
                    Ok(key) => key,
                    Err(e) => {
                        tracing::warn!(
                            context = %snapshot.context,
                            slot = %cosigner.slot,
                            "skipping cosigner key: {}",
                            e
                        );
                        directory.skipped += 1;
                        continue;
                    }
                };
                let identifier = public_key.identifier();

                if cosigner.has_private {
                    directory.mine.push(MineEntry {
                        key: LocalKeyRef {
                            context: snapshot.context.clone(),
                            slot: cosigner.slot.clone(),
                        },
                        identifier,
                    });
                } else {
                    directory.theirs.push(TheirsEntry {
                        context: snapshot.context.clone(),
                        public_key,
                        identifier,
                    });
                }
            }
        }

        tracing::debug!(
            contexts = contexts.len(),
            mine = directory.mine.len(),
            theirs = directory.theirs.len(),
            "directory rebuilt"
        );
        directory
    }

    pub fn mine(&self) -> &[MineEntry] {
        &self.mine
    }

    pub fn theirs(&self) -> &[TheirsEntry] {
        &self.theirs
    }

    /// Number of keys rejected during the rebuild.
    pub fn skipped_keys(&self) -> usize {
        self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.mine.is_empty() && self.theirs.is_empty()
    }

    /// Identifiers the listener should poll, in snapshot order without repeats.
    pub fn watch_set(&self) -> Vec<Identifier> {
        let mut seen = HashSet::new();
        self.mine
            .iter()
            .map(MineEntry::identifier)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Resolve an incoming message to the local key it was sent to.
    pub fn find_mine(&self, identifier: &Identifier) -> Option<&MineEntry> {
        self.mine.iter().find(|entry| &entry.identifier == identifier)
    }

    /// Counterparts that can sign the payload, one per identifier.
    pub fn recipients_for(&self, descriptor: &PayloadDescriptor) -> Vec<&TheirsEntry> {
        let mut seen = HashSet::new();
        self.theirs
            .iter()
            .filter(|entry| can_sign(descriptor, &entry.public_key))
            .filter(|entry| seen.insert(entry.identifier))
            .collect()
    }

    /// Whether a "send to cosigner" action makes sense for this payload in
    /// this context.
    pub fn should_offer_send(&self, context: &ContextRef, descriptor: &PayloadDescriptor) -> bool {
        if descriptor.complete || descriptor.locally_signable {
            return false;
        }
        self.theirs
            .iter()
            .any(|entry| &entry.context == context && can_sign(descriptor, &entry.public_key))
    }
}
