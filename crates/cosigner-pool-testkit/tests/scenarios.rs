//! End-to-end scenarios for the cosigner pool.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cosigner_pool::{
    ContextRef, CosignerPool, Directory, ExchangeClient, Identifier, MemoryExchange, Notice,
    PayloadDescriptor, PoolConfig, ReceiveOutcome,
};
use cosigner_pool_core::envelope;
use cosigner_pool_listener::{Listener, Notification};
use cosigner_pool_testkit::{
    fast_listener_config, init_tracing, payload_strategy, secret_key_strategy, Cosigner,
    FlakyExchange, GatedExchange, RecordingConsumer, StaticUnlocker,
};
use proptest::prelude::*;
use tokio::sync::mpsc;

const WAIT: Duration = Duration::from_secs(2);

async fn next(rx: &mut mpsc::Receiver<Notification>) -> Option<Notification> {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for notification")
}

async fn assert_quiet(rx: &mut mpsc::Receiver<Notification>) {
    let res = tokio::time::timeout(Duration::from_millis(150), rx.recv()).await;
    assert!(res.is_err(), "unexpected notification: {:?}", res);
}

async fn seal_for<E: ExchangeClient>(exchange: &E, cosigner: &Cosigner, payload: &[u8]) {
    let sealed = envelope::seal(payload, &cosigner.public_key()).unwrap();
    exchange.put(&cosigner.identifier(), &sealed).await.unwrap();
}

// =============================================================================
// Envelope
// =============================================================================

proptest! {
    #[test]
    fn envelope_opens_only_for_recipient(
        recipient in secret_key_strategy(),
        other in secret_key_strategy(),
        payload in payload_strategy(),
    ) {
        prop_assume!(recipient.public_key() != other.public_key());

        let sealed = envelope::seal(&payload, &recipient.public_key()).unwrap();
        prop_assert_eq!(envelope::open(&sealed, &recipient).unwrap(), payload);
        prop_assert!(envelope::open(&sealed, &other).is_err());
    }
}

// =============================================================================
// Directory
// =============================================================================

#[test]
fn empty_rebuild_has_empty_watch_set() {
    let directory = Directory::rebuild(&[]);
    assert!(directory.is_empty());
    assert!(directory.watch_set().is_empty());
}

#[test]
fn only_remote_cosigners_are_recipients() {
    let alice = Cosigner::from_seed(1);
    let carol = Cosigner::from_seed(3);
    let directory = Directory::rebuild(&[alice
        .context("wallet")
        .with_remote("carol", carol.public_key())]);

    let descriptor = PayloadDescriptor::new([alice.public_key(), carol.public_key()]);
    let recipients: Vec<Identifier> = directory
        .recipients_for(&descriptor)
        .iter()
        .map(|entry| entry.identifier())
        .collect();

    assert_eq!(recipients, vec![carol.identifier()]);
    assert_eq!(directory.watch_set(), vec![alice.identifier()]);
}

// =============================================================================
// Listener
// =============================================================================

#[tokio::test]
async fn duplicate_suppressed_until_cleared() {
    init_tracing();
    let alice = Cosigner::from_seed(1);
    let exchange = Arc::new(MemoryExchange::new());
    let listener = Listener::new(Arc::clone(&exchange), fast_listener_config());

    seal_for(&*exchange, &alice, b"first").await;
    let mut rx = listener.start().unwrap();
    listener.set_watch_set(vec![alice.identifier()]);

    let first = next(&mut rx).await.unwrap();
    assert_eq!(first.identifier, alice.identifier());
    assert_quiet(&mut rx).await;

    listener.clear(&alice.identifier()).await.unwrap();
    assert!(!exchange.contains(&alice.identifier()));

    seal_for(&*exchange, &alice, b"second").await;
    let second = next(&mut rx).await.unwrap();
    assert_eq!(envelope::open(&second.envelope, &alice.secret).unwrap(), b"second");
    assert_quiet(&mut rx).await;

    listener.stop().await;
}

#[tokio::test]
async fn recovers_after_transient_failures() {
    init_tracing();
    let alice = Cosigner::from_seed(1);
    let exchange = Arc::new(FlakyExchange::new());
    let listener = Listener::new(Arc::clone(&exchange), fast_listener_config());

    seal_for(exchange.inner(), &alice, b"psbt").await;
    exchange.fail_next_gets(3);

    let mut rx = listener.start().unwrap();
    listener.set_watch_set(vec![alice.identifier()]);

    let notification = next(&mut rx).await.unwrap();
    assert_eq!(notification.identifier, alice.identifier());
    assert!(exchange.gets_for(&alice.identifier()) >= 4);
    assert!(listener.is_running());
    assert_quiet(&mut rx).await;

    listener.stop().await;
}

#[tokio::test]
async fn stop_during_request_suppresses_notification() {
    init_tracing();
    let alice = Cosigner::from_seed(1);
    let exchange = Arc::new(GatedExchange::new());
    let listener = Listener::new(
        Arc::clone(&exchange),
        fast_listener_config().with_stop_grace(Duration::from_millis(50)),
    );

    seal_for(exchange.inner(), &alice, b"psbt").await;
    let mut rx = listener.start().unwrap();
    listener.set_watch_set(vec![alice.identifier()]);

    tokio::time::timeout(WAIT, exchange.entered()).await.unwrap();
    listener.stop().await;
    exchange.release(1);

    assert!(next(&mut rx).await.is_none());
    assert!(!listener.is_received(&alice.identifier()));

    // A new run starts with an empty received set, so the same record is
    // delivered again.
    let mut rx = listener.start().unwrap();
    listener.set_watch_set(vec![alice.identifier()]);
    exchange.release(16);

    let again = next(&mut rx).await.unwrap();
    assert_eq!(again.identifier, alice.identifier());

    exchange.release(1024);
    listener.stop().await;
}

#[tokio::test]
async fn stop_waits_for_request_in_flight() {
    init_tracing();
    let alice = Cosigner::from_seed(1);
    let exchange = Arc::new(GatedExchange::new());
    let listener = Listener::new(
        Arc::clone(&exchange),
        fast_listener_config().with_stop_grace(Duration::from_secs(1)),
    );

    seal_for(exchange.inner(), &alice, b"psbt").await;
    let mut rx = listener.start().unwrap();
    listener.set_watch_set(vec![alice.identifier()]);
    tokio::time::timeout(WAIT, exchange.entered()).await.unwrap();

    // The get completes inside the grace window; the loop sees the shutdown
    // and exits instead of delivering what it just fetched.
    let started = Instant::now();
    tokio::join!(listener.stop(), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        exchange.release(1);
    });
    assert!(started.elapsed() < Duration::from_millis(800));

    assert!(next(&mut rx).await.is_none());
    assert!(!listener.is_running());
    exchange.release(1024);
}

#[tokio::test]
async fn dropped_listener_delivers_nothing() {
    init_tracing();
    let alice = Cosigner::from_seed(1);
    let exchange = Arc::new(GatedExchange::new());
    let listener = Listener::new(Arc::clone(&exchange), fast_listener_config());

    seal_for(exchange.inner(), &alice, b"psbt").await;
    let mut rx = listener.start().unwrap();
    listener.set_watch_set(vec![alice.identifier()]);
    tokio::time::timeout(WAIT, exchange.entered()).await.unwrap();

    drop(listener);
    exchange.release(1024);

    assert!(next(&mut rx).await.is_none());
}

// =============================================================================
// Pool
// =============================================================================

type TestPool<E> = CosignerPool<E, StaticUnlocker, RecordingConsumer>;

fn pool<E: ExchangeClient + 'static>(
    exchange: Arc<E>,
    unlocker: StaticUnlocker,
) -> (TestPool<E>, RecordingConsumer) {
    let consumer = RecordingConsumer::new();
    let pool = CosignerPool::new(
        exchange,
        unlocker,
        consumer.clone(),
        PoolConfig::default().with_listener(fast_listener_config()),
    );
    (pool, consumer)
}

async fn receive(pool: &TestPool<impl ExchangeClient + 'static>) -> ReceiveOutcome {
    tokio::time::timeout(WAIT, pool.receive_next())
        .await
        .expect("timed out waiting for payload")
        .expect("listener stopped")
}

#[tokio::test]
async fn payload_travels_between_cosigners() {
    init_tracing();
    let alice = Cosigner::from_seed(1);
    let bob = Cosigner::from_seed(2);
    let exchange = Arc::new(MemoryExchange::new());

    let (alice_pool, alice_seen) = pool(Arc::clone(&exchange), StaticUnlocker::new());
    alice_pool
        .update(&[alice.context("shared").with_remote("bob", bob.public_key())])
        .await
        .unwrap();

    let (bob_pool, bob_seen) = pool(
        Arc::clone(&exchange),
        StaticUnlocker::new().with_key(bob.key_ref("shared"), bob.secret.clone()),
    );
    bob_pool
        .update(&[bob.context("shared").with_remote("alice", alice.public_key())])
        .await
        .unwrap();

    let descriptor = PayloadDescriptor::new([alice.public_key(), bob.public_key()]);
    let shared = ContextRef::new("shared");
    assert!(alice_pool.should_offer_send(&shared, &descriptor).await);
    assert!(!alice_pool
        .should_offer_send(&shared, &descriptor.clone().complete(true))
        .await);

    let report = alice_pool.send(b"partially signed", &descriptor).await;
    assert_eq!(report.sent, vec![bob.identifier()]);
    assert_eq!(
        alice_seen.notices(),
        vec![(shared.clone(), Notice::Sent { identifier: bob.identifier() })]
    );

    let outcome = receive(&bob_pool).await;
    assert_eq!(
        outcome,
        ReceiveOutcome::Delivered {
            context: shared.clone(),
            identifier: bob.identifier(),
            cleared: true,
        }
    );
    assert_eq!(bob_seen.delivered(), vec![(shared, b"partially signed".to_vec())]);
    assert!(exchange.is_empty());

    alice_pool.shutdown().await;
    bob_pool.shutdown().await;
}

#[tokio::test]
async fn remote_identifiers_are_never_polled() {
    init_tracing();
    let alice = Cosigner::from_seed(1);
    let bob = Cosigner::from_seed(2);
    let carol = Cosigner::from_seed(3);
    let exchange = Arc::new(FlakyExchange::new());

    let (pool, _seen) = pool(Arc::clone(&exchange), StaticUnlocker::new());
    pool.update(&[
        alice.context("a").with_remote("carol", carol.public_key()),
        bob.context("b").with_remote("carol", carol.public_key()),
    ])
    .await
    .unwrap();

    let directory = pool.directory().await;
    assert_eq!(directory.watch_set(), vec![alice.identifier(), bob.identifier()]);
    assert!(directory
        .theirs()
        .iter()
        .all(|entry| entry.identifier() == carol.identifier()));

    // Both contexts share carol; she gets a single copy.
    let report = pool
        .send(b"psbt", &PayloadDescriptor::new([bob.public_key(), carol.public_key()]))
        .await;
    assert_eq!(report.sent, vec![carol.identifier()]);
    assert!(exchange.inner().contains(&carol.identifier()));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(exchange.gets_for(&alice.identifier()) > 0);
    assert!(exchange.gets_for(&bob.identifier()) > 0);
    assert_eq!(exchange.gets_for(&carol.identifier()), 0);

    pool.shutdown().await;
}

#[tokio::test]
async fn listener_follows_active_contexts() {
    init_tracing();
    let alice = Cosigner::from_seed(1);
    let (pool, _seen) = pool(Arc::new(MemoryExchange::new()), StaticUnlocker::new());

    pool.update(&[]).await.unwrap();
    assert!(!pool.listener().is_running());

    pool.update(&[alice.context("a")]).await.unwrap();
    assert!(pool.listener().is_running());
    assert_eq!(pool.directory().await.watch_set(), vec![alice.identifier()]);

    pool.update(&[]).await.unwrap();
    assert!(!pool.listener().is_running());
    assert!(pool.directory().await.is_empty());
    assert!(pool.receive_next().await.is_none());
}

#[tokio::test]
async fn declined_unlock_leaves_message_pending() {
    init_tracing();
    let alice = Cosigner::from_seed(1);
    let exchange = Arc::new(MemoryExchange::new());
    let (pool, seen) = pool(Arc::clone(&exchange), StaticUnlocker::new());

    seal_for(&*exchange, &alice, b"psbt").await;
    pool.update(&[alice.context("a")]).await.unwrap();

    assert_eq!(
        receive(&pool).await,
        ReceiveOutcome::Declined { identifier: alice.identifier() }
    );
    assert!(exchange.contains(&alice.identifier()));
    assert!(seen.delivered().is_empty());
    assert!(seen.notices().is_empty());

    pool.shutdown().await;
}

#[tokio::test]
async fn undecryptable_message_is_reported() {
    init_tracing();
    let alice = Cosigner::from_seed(1);
    let exchange = Arc::new(MemoryExchange::new());
    let (pool, seen) = pool(
        Arc::clone(&exchange),
        StaticUnlocker::new().with_key(alice.key_ref("a"), alice.secret.clone()),
    );

    // Sealed to someone else, stored under alice's identifier.
    let sealed = envelope::seal(b"psbt", &Cosigner::from_seed(9).public_key()).unwrap();
    exchange.put(&alice.identifier(), &sealed).await.unwrap();
    pool.update(&[alice.context("a")]).await.unwrap();

    assert_eq!(
        receive(&pool).await,
        ReceiveOutcome::DecryptFailed { identifier: alice.identifier() }
    );
    assert!(exchange.contains(&alice.identifier()));
    assert_eq!(
        seen.notices(),
        vec![(
            ContextRef::new("a"),
            Notice::DecryptFailed { identifier: alice.identifier() }
        )]
    );

    pool.shutdown().await;
}

#[tokio::test]
async fn failed_clear_still_delivers() {
    init_tracing();
    let alice = Cosigner::from_seed(1);
    let exchange = Arc::new(FlakyExchange::new());
    let (pool, seen) = pool(
        Arc::clone(&exchange),
        StaticUnlocker::new().with_key(alice.key_ref("a"), alice.secret.clone()),
    );

    seal_for(exchange.inner(), &alice, b"psbt").await;
    exchange.fail_next_deletes(1);
    pool.update(&[alice.context("a")]).await.unwrap();

    assert_eq!(
        receive(&pool).await,
        ReceiveOutcome::Delivered {
            context: ContextRef::new("a"),
            identifier: alice.identifier(),
            cleared: false,
        }
    );
    assert_eq!(seen.delivered().len(), 1);
    assert!(matches!(
        seen.notices().as_slice(),
        [(_, Notice::ClearFailed { .. })]
    ));

    // Still marked received, so the record left behind is not delivered twice.
    assert!(pool.listener().is_received(&alice.identifier()));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(pool.try_receive().await.is_none());

    pool.shutdown().await;
}

#[tokio::test]
async fn send_failure_is_reported_per_recipient() {
    init_tracing();
    let alice = Cosigner::from_seed(1);
    let bob = Cosigner::from_seed(2);
    let exchange = Arc::new(FlakyExchange::new());
    let (pool, seen) = pool(Arc::clone(&exchange), StaticUnlocker::new());

    pool.update(&[alice.context("a").with_remote("bob", bob.public_key())])
        .await
        .unwrap();
    exchange.set_down(true);

    let report = pool
        .send(b"psbt", &PayloadDescriptor::new([bob.public_key()]))
        .await;
    assert!(report.sent.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert!(matches!(
        seen.notices().as_slice(),
        [(_, Notice::SendFailed { .. })]
    ));

    exchange.set_down(false);
    pool.shutdown().await;
}
