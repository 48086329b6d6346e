//! Receive and send paths.
//!
//! Both paths run on the caller's task against a directory snapshot the
//! caller keeps stable for the duration of the call.

use cosigner_pool_core::{envelope, ContextRef, Directory, Identifier, PayloadDescriptor};
use cosigner_pool_exchange::ExchangeClient;
use cosigner_pool_listener::{Listener, Notification};

use crate::error::PoolError;
use crate::host::{KeyUnlocker, Notice, PayloadConsumer, Unlock};

/// What happened to one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// Decrypted and handed to the consumer.
    ///
    /// `cleared` is false if the exchange record could not be deleted.
    Delivered {
        context: ContextRef,
        identifier: Identifier,
        cleared: bool,
    },
    /// No local key for this identifier any more; dropped.
    Stale { identifier: Identifier },
    /// The host declined to unlock the key; the message stays pending.
    Declined { identifier: Identifier },
    /// The envelope could not be opened; the message stays pending.
    DecryptFailed { identifier: Identifier },
}

/// Per-recipient results of a send.
#[derive(Debug, Default)]
pub struct SendReport {
    pub sent: Vec<Identifier>,
    pub failed: Vec<(Identifier, PoolError)>,
}

impl SendReport {
    /// No counterpart in the directory could sign the payload.
    pub fn is_empty(&self) -> bool {
        self.sent.is_empty() && self.failed.is_empty()
    }

    pub fn all_sent(&self) -> bool {
        !self.sent.is_empty() && self.failed.is_empty()
    }
}

/// Handle one listener notification.
pub async fn receive<E, U, C>(
    directory: &Directory,
    listener: &Listener<E>,
    unlocker: &U,
    consumer: &C,
    notification: Notification,
) -> ReceiveOutcome
where
    E: ExchangeClient + 'static,
    U: KeyUnlocker + ?Sized,
    C: PayloadConsumer + ?Sized,
{
    let Notification {
        identifier,
        envelope: sealed,
    } = notification;

    let Some(entry) = directory.find_mine(&identifier) else {
        tracing::debug!(identifier = %identifier, "no local key for notification, dropping");
        return ReceiveOutcome::Stale { identifier };
    };
    let context = entry.context().clone();

    let secret = match unlocker.unlock(entry.key()).await {
        Unlock::Key(secret) => secret,
        Unlock::Declined => {
            tracing::debug!(identifier = %identifier, context = %context, "unlock declined");
            return ReceiveOutcome::Declined { identifier };
        }
    };

    let payload = match envelope::open(&sealed, &secret) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(identifier = %identifier, context = %context, "{}", e);
            consumer.notify(&context, Notice::DecryptFailed { identifier });
            return ReceiveOutcome::DecryptFailed { identifier };
        }
    };

    let cleared = match listener.clear(&identifier).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(identifier = %identifier, "failed to clear message: {}", e);
            consumer.notify(
                &context,
                Notice::ClearFailed {
                    identifier,
                    reason: e.to_string(),
                },
            );
            false
        }
    };

    tracing::info!(identifier = %identifier, context = %context, "delivering payload");
    consumer.deliver(&context, payload);
    ReceiveOutcome::Delivered {
        context,
        identifier,
        cleared,
    }
}

/// Seal `payload` to every counterpart that can sign it and upload it.
///
/// A failure for one recipient does not stop the others.
pub async fn send<E, C>(
    directory: &Directory,
    exchange: &E,
    consumer: &C,
    payload: &[u8],
    descriptor: &PayloadDescriptor,
) -> SendReport
where
    E: ExchangeClient + ?Sized,
    C: PayloadConsumer + ?Sized,
{
    let mut report = SendReport::default();

    for entry in directory.recipients_for(descriptor) {
        let identifier = entry.identifier();
        let result = match envelope::seal(payload, entry.public_key()) {
            Ok(sealed) => exchange
                .put(&identifier, &sealed)
                .await
                .map_err(PoolError::from),
            Err(e) => Err(PoolError::from(e)),
        };

        match result {
            Ok(()) => {
                tracing::info!(identifier = %identifier, "payload sent to cosigner pool");
                consumer.notify(entry.context(), Notice::Sent { identifier });
                report.sent.push(identifier);
            }
            Err(e) => {
                tracing::warn!(identifier = %identifier, "failed to send payload: {}", e);
                consumer.notify(
                    entry.context(),
                    Notice::SendFailed {
                        identifier,
                        reason: e.to_string(),
                    },
                );
                report.failed.push((identifier, e));
            }
        }
    }

    if report.is_empty() {
        tracing::debug!("no cosigner in the directory can sign this payload");
    }
    report
}
