//! End-to-end saga tests: placement, confirmation worker, ledger and bus
//! wired over one SQLite database.

use std::sync::Arc;
use std::time::Duration;

use betsettle::adapter::outbound::memory::MemoryOddsCache;
use betsettle::adapter::outbound::sqlite::{
    SqliteBetStore, SqliteConsumer, SqliteEventLog, SqliteLedger,
};
use betsettle::application::{BetPlacement, ConfirmationWorker, Outcome, RetryPolicy, WorkerSettings};
use betsettle::domain::{
    BetConfirmed, BetId, BetPlaced, BetRequest, BetStatus, ExternalRef, ReservationStatus, Topics,
    UserId,
};
use betsettle::error::{Error, LedgerError};
use betsettle::port::outbound::{
    BetStore, EventConsumer, EventPublisher, LedgerAudit, OddsKey, Supplier, WalletGateway,
};
use betsettle::testkit::bets::FlakyBetStore;
use betsettle::testkit::bus::FlakyPublisher;
use betsettle::testkit::db::TempDb;
use betsettle::testkit::supplier::{Reply, ScriptedSupplier};
use betsettle::testkit::wallet::RecordingWallet;
use rust_decimal_macros::dec;
use tokio::sync::watch;

const PARTITIONS: u32 = 4;
const GROUP: &str = "bet-confirmation-worker";

struct Saga {
    db: TempDb,
    ledger: Arc<SqliteLedger>,
    wallet: Arc<RecordingWallet>,
    bets: Arc<SqliteBetStore>,
    store: Arc<FlakyBetStore>,
    log: Arc<SqliteEventLog>,
    publisher: Arc<FlakyPublisher>,
    odds: Arc<MemoryOddsCache>,
    placement: BetPlacement,
}

impl Saga {
    fn new(name: &str) -> Self {
        let db = TempDb::create(name);
        let ledger = Arc::new(SqliteLedger::new(db.pool().clone()));
        let wallet = Arc::new(RecordingWallet::new(ledger.clone()));
        let bets = Arc::new(SqliteBetStore::new(db.pool().clone()));
        let store = Arc::new(FlakyBetStore::new(bets.clone()));
        let log = Arc::new(SqliteEventLog::new(db.pool().clone(), PARTITIONS));
        let publisher = Arc::new(FlakyPublisher::new(log.clone()));
        let odds = Arc::new(MemoryOddsCache::new());
        let placement = BetPlacement::new(
            bets.clone(),
            wallet.clone(),
            publisher.clone(),
            odds.clone(),
            Topics::default(),
        );
        Self {
            db,
            ledger,
            wallet,
            bets,
            store,
            log,
            publisher,
            odds,
            placement,
        }
    }

    fn consumer(&self) -> Arc<SqliteConsumer> {
        Arc::new(SqliteConsumer::new(
            self.db.pool().clone(),
            GROUP,
            Topics::default().bet_placed,
            PARTITIONS,
        ))
    }

    fn worker(&self, consumer: Arc<SqliteConsumer>, supplier: Arc<dyn Supplier>) -> ConfirmationWorker {
        ConfirmationWorker::new(
            consumer,
            self.publisher.clone(),
            self.store.clone(),
            self.wallet.clone(),
            supplier,
            fast_settings(),
        )
    }

    async fn fund(&self, user: &str, amount: i64) {
        self.ledger
            .deposit(&UserId::new(user), amount, &ExternalRef::from("seed"))
            .await
            .expect("deposit");
    }

    async fn balance(&self, user: &str) -> i64 {
        self.ledger
            .get_or_create_wallet(&UserId::new(user))
            .await
            .expect("wallet")
            .balance_cents
    }

    async fn bet_status(&self, bet_id: &BetId) -> BetStatus {
        self.bets
            .get(bet_id)
            .await
            .expect("read bet")
            .expect("bet exists")
            .status
    }

    async fn confirmed_events(&self) -> Vec<BetConfirmed> {
        self.log
            .messages(&Topics::default().bet_confirmed)
            .await
            .expect("read topic")
            .iter()
            .map(|m| serde_json::from_str(&m.payload).expect("decode bet_confirmed"))
            .collect()
    }
}

fn fast_settings() -> WorkerSettings {
    WorkerSettings {
        retry: RetryPolicy {
            max_retries: 3,
            backoff_step: Duration::from_millis(5),
            call_timeout: Duration::from_millis(200),
        },
        poll_interval: Duration::from_millis(10),
        error_backoff: Duration::from_millis(10),
        topics: Topics::default(),
    }
}

fn request(user: &str, stake: i64) -> BetRequest {
    BetRequest {
        user_id: user.into(),
        event_id: "evt-1".into(),
        market: "match_winner".into(),
        selection: "home".into(),
        stake_cents: stake,
        odd_value: dec!(2.0),
    }
}

/// Fetch, handle and commit until the topic is drained.
async fn drain(worker: &ConfirmationWorker, consumer: &SqliteConsumer) -> Vec<Outcome> {
    let mut outcomes = Vec::new();
    while let Some(message) = consumer.fetch().await.expect("fetch") {
        outcomes.push(worker.handle(&message).await.expect("handle"));
        consumer.commit(&message).await.expect("commit");
    }
    outcomes
}

#[tokio::test]
async fn scenario_a_rejection_refunds_the_stake() {
    let saga = Saga::new("scenario-a");
    saga.fund("alice", 1000).await;

    let placed = saga.placement.place(request("alice", 500)).await.unwrap();
    assert_eq!(placed.status, BetStatus::PendingConfirmation);
    assert_eq!(saga.balance("alice").await, 500);
    assert_eq!(saga.bet_status(&placed.bet_id).await, BetStatus::PendingConfirmation);

    let consumer = saga.consumer();
    let worker = saga.worker(consumer.clone(), Arc::new(ScriptedSupplier::rejecting("no_market")));
    let outcomes = drain(&worker, &consumer).await;

    assert_eq!(outcomes, vec![Outcome::Settled(BetStatus::Rejected)]);
    assert_eq!(saga.balance("alice").await, 1000);
    assert_eq!(saga.bet_status(&placed.bet_id).await, BetStatus::Rejected);
    assert_eq!(saga.wallet.refunds(), 1);

    let reservation = saga
        .ledger
        .reservation(&UserId::new("alice"), &placed.bet_id.reservation_ref())
        .await
        .unwrap()
        .expect("reservation");
    assert_eq!(reservation.status, ReservationStatus::Refunded);

    let history = saga.bets.transitions(&placed.bet_id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].new_status, BetStatus::Rejected);
    assert_eq!(history[0].reason.as_deref(), Some("no_market"));

    let events = saga.confirmed_events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, BetStatus::Rejected);
    assert_eq!(events[0].reason.as_deref(), Some("no_market"));
}

#[tokio::test]
async fn scenario_b_confirmation_consumes_the_stake() {
    let saga = Saga::new("scenario-b");
    saga.fund("bob", 1000).await;

    let placed = saga.placement.place(request("bob", 500)).await.unwrap();
    assert_eq!(saga.balance("bob").await, 500);

    let consumer = saga.consumer();
    let worker = saga.worker(consumer.clone(), Arc::new(ScriptedSupplier::confirming()));
    drain(&worker, &consumer).await;

    assert_eq!(saga.balance("bob").await, 500);
    assert_eq!(saga.bet_status(&placed.bet_id).await, BetStatus::Confirmed);
    assert_eq!(saga.wallet.refunds(), 0);
    assert_eq!(saga.wallet.commits(), 1);

    let reservation = saga
        .ledger
        .reservation(&UserId::new("bob"), &placed.bet_id.reservation_ref())
        .await
        .unwrap()
        .expect("reservation");
    assert_eq!(reservation.status, ReservationStatus::Committed);

    let events = saga.confirmed_events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, BetStatus::Confirmed);
    assert_eq!(
        events[0].provider_ref.as_deref(),
        Some(format!("TEST-{}", placed.bet_id).as_str())
    );
}

#[tokio::test]
async fn scenario_c_insufficient_funds_leaves_orphaned_bet() {
    let saga = Saga::new("scenario-c");
    saga.fund("carol", 200).await;

    let err = saga.placement.place(request("carol", 500)).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Ledger(LedgerError::InsufficientFunds { requested: 500 })
    ));
    assert_eq!(saga.balance("carol").await, 200);

    // The bet row survives the failed reservation.
    let pending = saga.bets.pending(10).await.unwrap();
    assert_eq!(pending.len(), 1);
    let orphan = &pending[0];
    assert_eq!(orphan.status, BetStatus::PendingConfirmation);
    let reservation = saga
        .ledger
        .reservation(&UserId::new("carol"), &orphan.id.reservation_ref())
        .await
        .unwrap();
    assert!(reservation.is_none());

    let placed = saga.log.messages(&Topics::default().bet_placed).await.unwrap();
    assert!(placed.is_empty());
}

#[tokio::test]
async fn scenario_d_exhausted_retries_dead_letter_the_message() {
    let saga = Saga::new("scenario-d");
    saga.fund("dave", 1000).await;
    let placed = saga.placement.place(request("dave", 300)).await.unwrap();

    let supplier = Arc::new(ScriptedSupplier::failing());
    let consumer = saga.consumer();
    let worker = saga.worker(consumer.clone(), supplier.clone());
    let outcomes = drain(&worker, &consumer).await;

    assert_eq!(outcomes, vec![Outcome::DeadLettered]);
    assert_eq!(supplier.calls(), 4);
    assert_eq!(saga.bet_status(&placed.bet_id).await, BetStatus::PendingConfirmation);
    assert_eq!(saga.balance("dave").await, 700);

    let dlq = saga.log.messages(&Topics::default().bet_placed_dlq).await.unwrap();
    assert_eq!(dlq.len(), 1);
    assert_eq!(dlq[0].key, placed.bet_id.as_str());
    let original: BetPlaced = serde_json::from_str(&dlq[0].payload).unwrap();
    assert_eq!(original.bet_id, placed.bet_id);

    assert!(saga.confirmed_events().await.is_empty());
}

#[tokio::test]
async fn supplier_timeouts_count_as_failed_attempts() {
    let saga = Saga::new("supplier-hang");
    saga.fund("erin", 1000).await;
    saga.placement.place(request("erin", 100)).await.unwrap();

    let supplier = Arc::new(ScriptedSupplier::new(
        vec![Reply::Hang(Duration::from_secs(5)), Reply::Fail],
        Reply::confirmed(),
    ));
    let consumer = saga.consumer();
    let worker = saga.worker(consumer.clone(), supplier.clone());
    let outcomes = drain(&worker, &consumer).await;

    assert_eq!(outcomes, vec![Outcome::Settled(BetStatus::Confirmed)]);
    assert_eq!(supplier.calls(), 3);
}

#[tokio::test]
async fn unknown_supplier_status_fails_closed() {
    let saga = Saga::new("garbage-status");
    saga.fund("frank", 1000).await;
    let placed = saga.placement.place(request("frank", 400)).await.unwrap();

    let consumer = saga.consumer();
    let worker = saga.worker(
        consumer.clone(),
        Arc::new(ScriptedSupplier::always(Reply::Status("MAYBE".into()))),
    );
    drain(&worker, &consumer).await;

    assert_eq!(saga.bet_status(&placed.bet_id).await, BetStatus::Rejected);
    assert_eq!(saga.balance("frank").await, 1000);
}

#[tokio::test]
async fn redelivered_rejection_refunds_exactly_once() {
    let saga = Saga::new("redelivery");
    saga.fund("gina", 1000).await;
    let placed = saga.placement.place(request("gina", 500)).await.unwrap();

    let supplier = Arc::new(ScriptedSupplier::rejecting("late"));
    let consumer = saga.consumer();
    let worker = saga.worker(consumer.clone(), supplier.clone());

    // Handle without committing, then receive the same message again.
    let first = consumer.fetch().await.unwrap().expect("message");
    assert_eq!(
        worker.handle(&first).await.unwrap(),
        Outcome::Settled(BetStatus::Rejected)
    );
    let again = consumer.fetch().await.unwrap().expect("redelivered");
    assert_eq!(again.offset, first.offset);
    assert_eq!(
        worker.handle(&again).await.unwrap(),
        Outcome::Replayed(BetStatus::Rejected)
    );
    consumer.commit(&again).await.unwrap();

    assert_eq!(supplier.calls(), 1);
    assert_eq!(saga.wallet.refunds(), 2);
    assert_eq!(saga.balance("gina").await, 1000);
    assert_eq!(saga.bets.transitions(&placed.bet_id).await.unwrap().len(), 1);

    // The replayed announcement keeps the recorded reason.
    let events = saga.confirmed_events().await;
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.status == BetStatus::Rejected));
    assert!(events.iter().all(|e| e.reason.as_deref() == Some("late")));
    assert!(consumer.fetch().await.unwrap().is_none());
}

#[tokio::test]
async fn failed_refund_is_logged_and_the_stake_stays_reserved() {
    let saga = Saga::new("refund-gap");
    saga.fund("hana", 1000).await;
    let placed = saga.placement.place(request("hana", 600)).await.unwrap();
    saga.wallet.fail_refunds(true);

    let consumer = saga.consumer();
    let worker = saga.worker(consumer.clone(), Arc::new(ScriptedSupplier::rejecting("closed")));
    let outcomes = drain(&worker, &consumer).await;

    assert_eq!(outcomes, vec![Outcome::Settled(BetStatus::Rejected)]);
    assert_eq!(saga.bet_status(&placed.bet_id).await, BetStatus::Rejected);
    assert_eq!(saga.balance("hana").await, 400);
    assert_eq!(saga.confirmed_events().await.len(), 1);
}

#[tokio::test]
async fn outcome_goes_to_dead_letter_topic_when_publish_fails() {
    let saga = Saga::new("confirmed-dlq");
    saga.fund("ivan", 1000).await;
    let placed = saga.placement.place(request("ivan", 100)).await.unwrap();
    saga.publisher.break_topic(&Topics::default().bet_confirmed);

    let consumer = saga.consumer();
    let worker = saga.worker(consumer.clone(), Arc::new(ScriptedSupplier::confirming()));
    drain(&worker, &consumer).await;

    assert!(saga.confirmed_events().await.is_empty());
    let dlq = saga
        .log
        .messages(&Topics::default().bet_confirmed_dlq)
        .await
        .unwrap();
    assert_eq!(dlq.len(), 1);
    let outcome: BetConfirmed = serde_json::from_str(&dlq[0].payload).unwrap();
    assert_eq!(outcome.bet_id, placed.bet_id);
    assert_eq!(outcome.status, BetStatus::Confirmed);
}

#[tokio::test]
async fn message_stays_uncommitted_when_no_topic_accepts_the_outcome() {
    let saga = Saga::new("publish-outage");
    saga.fund("jane", 1000).await;
    saga.placement.place(request("jane", 100)).await.unwrap();
    let topics = Topics::default();
    saga.publisher.break_topic(&topics.bet_confirmed);
    saga.publisher.break_topic(&topics.bet_confirmed_dlq);

    let consumer = saga.consumer();
    let worker = saga.worker(consumer.clone(), Arc::new(ScriptedSupplier::confirming()));
    let message = consumer.fetch().await.unwrap().expect("message");
    assert!(worker.handle(&message).await.is_err());

    // After the outage the redelivered message replays from stored state.
    saga.publisher.heal();
    let outcomes = drain(&worker, &consumer).await;
    assert_eq!(outcomes, vec![Outcome::Replayed(BetStatus::Confirmed)]);
    assert_eq!(saga.confirmed_events().await.len(), 1);
}

#[tokio::test]
async fn undecodable_and_unknown_bets_are_skipped() {
    let saga = Saga::new("poison");
    let topic = Topics::default().bet_placed;
    saga.log.publish(&topic, "junk", "{not json").await.unwrap();

    let ghost = serde_json::json!({
        "betId": "ghost",
        "userId": "nobody",
        "eventId": "evt-1",
        "market": "match_winner",
        "selection": "home",
        "stakeCents": 100,
        "oddValue": 2.0,
        "reservedRef": "ghost",
        "tsUnixMs": 0
    });
    saga.log
        .publish(&topic, "ghost", &ghost.to_string())
        .await
        .unwrap();

    let supplier = Arc::new(ScriptedSupplier::confirming());
    let consumer = saga.consumer();
    let worker = saga.worker(consumer.clone(), supplier.clone());
    let outcomes = drain(&worker, &consumer).await;

    assert_eq!(outcomes, vec![Outcome::Skipped, Outcome::Skipped]);
    assert_eq!(supplier.calls(), 0);
}

#[tokio::test]
async fn stale_odd_is_refused_before_anything_is_written() {
    let saga = Saga::new("stale-odd");
    saga.fund("kim", 1000).await;
    saga.odds
        .put(OddsKey::new("evt-1", "match_winner", "home"), dec!(2.5));

    let err = saga.placement.place(request("kim", 100)).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Placement(betsettle::error::PlacementError::OddChanged { .. })
    ));
    assert_eq!(saga.balance("kim").await, 1000);
    assert!(saga.bets.pending(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn running_worker_settles_and_stops_on_shutdown() {
    let saga = Saga::new("run-loop");
    saga.fund("lee", 1000).await;
    let placed = saga.placement.place(request("lee", 250)).await.unwrap();

    let consumer = saga.consumer();
    let worker = Arc::new(saga.worker(consumer.clone(), Arc::new(ScriptedSupplier::confirming())));
    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn({
        let worker = worker.clone();
        async move { worker.run(rx).await }
    });

    let mut status = BetStatus::PendingConfirmation;
    for _ in 0..200 {
        status = saga.bet_status(&placed.bet_id).await;
        if status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(status, BetStatus::Confirmed);

    tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("worker stops")
        .expect("join")
        .expect("run");
    assert!(consumer.fetch().await.unwrap().is_none());
}

#[tokio::test]
async fn failed_status_update_is_redelivered_and_settles_next_pass() {
    let saga = Saga::new("status-update-fails");
    saga.fund("alice", 1000).await;
    let placed = saga.placement.place(request("alice", 400)).await.unwrap();

    let consumer = saga.consumer();
    let supplier = Arc::new(ScriptedSupplier::rejecting("no_market"));
    let worker = saga.worker(consumer.clone(), supplier.clone());

    saga.store.fail_transitions(true);
    let first = consumer.fetch().await.unwrap().expect("bet_placed");
    assert!(worker.handle(&first).await.is_err());

    assert_eq!(saga.bet_status(&placed.bet_id).await, BetStatus::PendingConfirmation);
    assert_eq!(saga.balance("alice").await, 600);
    assert_eq!(saga.wallet.refunds(), 0);
    assert!(saga.confirmed_events().await.is_empty());

    saga.store.fail_transitions(false);
    let again = consumer.fetch().await.unwrap().expect("redelivered");
    assert_eq!((again.partition, again.offset), (first.partition, first.offset));
    assert_eq!(
        worker.handle(&again).await.unwrap(),
        Outcome::Settled(BetStatus::Rejected)
    );
    consumer.commit(&again).await.unwrap();

    assert_eq!(saga.store.transition_calls(), 2);
    assert_eq!(supplier.calls(), 2);
    assert_eq!(saga.balance("alice").await, 1000);
    assert_eq!(saga.bet_status(&placed.bet_id).await, BetStatus::Rejected);
    assert_eq!(saga.confirmed_events().await.len(), 1);
    assert!(consumer.fetch().await.unwrap().is_none());
}

#[tokio::test]
async fn failed_audit_row_does_not_block_settlement() {
    let saga = Saga::new("audit-fails");
    saga.fund("alice", 1000).await;
    let placed = saga.placement.place(request("alice", 250)).await.unwrap();

    let consumer = saga.consumer();
    let worker = saga.worker(consumer.clone(), Arc::new(ScriptedSupplier::rejecting("void")));
    saga.store.fail_audit(true);
    let outcomes = drain(&worker, &consumer).await;

    assert_eq!(outcomes, vec![Outcome::Settled(BetStatus::Rejected)]);
    assert_eq!(saga.bet_status(&placed.bet_id).await, BetStatus::Rejected);
    assert_eq!(saga.wallet.refunds(), 1);
    assert_eq!(saga.balance("alice").await, 1000);
    assert!(saga.bets.transitions(&placed.bet_id).await.unwrap().is_empty());

    let events = saga.confirmed_events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].bet_id, placed.bet_id);
    assert_eq!(events[0].status, BetStatus::Rejected);
}
