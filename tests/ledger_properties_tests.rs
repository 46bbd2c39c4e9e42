//! Wallet ledger properties under repetition and concurrency.

use std::sync::Arc;

use betsettle::adapter::outbound::sqlite::SqliteLedger;
use betsettle::domain::{ExternalRef, OperationType, ReservationStatus, UserId};
use betsettle::error::{Error, LedgerError};
use betsettle::port::outbound::{LedgerAudit, WalletGateway};
use betsettle::testkit::db::TempDb;
use tokio_test::{assert_err, assert_ok};

fn ledger(db: &TempDb) -> Arc<SqliteLedger> {
    Arc::new(SqliteLedger::new(db.pool().clone()))
}

async fn funded(ledger: &SqliteLedger, user: &UserId, amount: i64) {
    assert_ok!(ledger.deposit(user, amount, &ExternalRef::from("seed")).await);
}

#[tokio::test]
async fn reserve_with_same_ref_returns_same_reservation() {
    let db = TempDb::create("ledger-idempotent");
    let ledger = ledger(&db);
    let user = UserId::new("alice");
    funded(&ledger, &user, 1000).await;

    let bet = ExternalRef::from("bet-1");
    let first = assert_ok!(ledger.reserve(&user, 300, &bet).await);
    let second = assert_ok!(ledger.reserve(&user, 300, &bet).await);

    assert_eq!(first, second);
    let wallet = assert_ok!(ledger.get_or_create_wallet(&user).await);
    assert_eq!(wallet.balance_cents, 700);

    let reserves = assert_ok!(ledger.entries(&user).await)
        .into_iter()
        .filter(|e| e.operation == OperationType::Reserve)
        .count();
    assert_eq!(reserves, 1);
}

#[tokio::test]
async fn concurrent_reserves_with_one_ref_debit_once() {
    let db = TempDb::create("ledger-same-ref");
    let ledger = ledger(&db);
    let user = UserId::new("bob");
    funded(&ledger, &user, 1000).await;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let ledger = ledger.clone();
        let user = user.clone();
        tasks.push(tokio::spawn(async move {
            ledger.reserve(&user, 250, &ExternalRef::from("bet-shared")).await
        }));
    }

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap().expect("reserve"));
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);

    let wallet = assert_ok!(ledger.get_or_create_wallet(&user).await);
    assert_eq!(wallet.balance_cents, 750);
}

#[tokio::test]
async fn concurrent_reserves_never_overdraw() {
    let db = TempDb::create("ledger-overdraw");
    let ledger = ledger(&db);
    let user = UserId::new("carol");
    funded(&ledger, &user, 1000).await;

    let mut tasks = Vec::new();
    for i in 0..16 {
        let ledger = ledger.clone();
        let user = user.clone();
        tasks.push(tokio::spawn(async move {
            ledger
                .reserve(&user, 150, &ExternalRef::from(format!("bet-{i}").as_str()))
                .await
        }));
    }

    let mut accepted = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(Error::Ledger(LedgerError::InsufficientFunds { requested })) => {
                assert_eq!(requested, 150);
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(accepted, 6);
    let wallet = assert_ok!(ledger.get_or_create_wallet(&user).await);
    assert_eq!(wallet.balance_cents, 100);
    assert!(wallet.balance_cents >= 0);
}

#[tokio::test]
async fn settling_twice_is_a_successful_no_op() {
    let db = TempDb::create("ledger-terminal");
    let ledger = ledger(&db);
    let user = UserId::new("dave");
    funded(&ledger, &user, 1000).await;

    let kept = ExternalRef::from("bet-kept");
    let returned = ExternalRef::from("bet-returned");
    assert_ok!(ledger.reserve(&user, 400, &kept).await);
    assert_ok!(ledger.reserve(&user, 100, &returned).await);

    assert_ok!(ledger.commit(&user, &kept).await);
    assert_ok!(ledger.commit(&user, &kept).await);
    assert_ok!(ledger.refund(&user, &kept).await);

    assert_ok!(ledger.refund(&user, &returned).await);
    assert_ok!(ledger.refund(&user, &returned).await);
    assert_ok!(ledger.commit(&user, &returned).await);

    let wallet = assert_ok!(ledger.get_or_create_wallet(&user).await);
    assert_eq!(wallet.balance_cents, 600);

    let kept_status = assert_ok!(ledger.reservation(&user, &kept).await).map(|r| r.status);
    let returned_status = assert_ok!(ledger.reservation(&user, &returned).await).map(|r| r.status);
    assert_eq!(kept_status, Some(ReservationStatus::Committed));
    assert_eq!(returned_status, Some(ReservationStatus::Refunded));

    let operations: Vec<OperationType> = assert_ok!(ledger.entries(&user).await)
        .into_iter()
        .map(|e| e.operation)
        .collect();
    assert_eq!(
        operations,
        vec![
            OperationType::Credit,
            OperationType::Reserve,
            OperationType::Reserve,
            OperationType::Debit,
            OperationType::Refund,
        ]
    );
}

#[tokio::test]
async fn repeated_refunds_restore_exactly_the_reserved_amount() {
    let db = TempDb::create("ledger-refund-once");
    let ledger = ledger(&db);
    let user = UserId::new("erin");
    funded(&ledger, &user, 1000).await;

    let bet = ExternalRef::from("bet-9");
    assert_ok!(ledger.reserve(&user, 500, &bet).await);

    let mut tasks = Vec::new();
    for _ in 0..6 {
        let ledger = ledger.clone();
        let user = user.clone();
        let bet = bet.clone();
        tasks.push(tokio::spawn(async move { ledger.refund(&user, &bet).await }));
    }
    for task in tasks {
        assert_ok!(task.await.unwrap());
    }

    let wallet = assert_ok!(ledger.get_or_create_wallet(&user).await);
    assert_eq!(wallet.balance_cents, 1000);
}

#[tokio::test]
async fn settling_an_unknown_ref_is_not_found() {
    let db = TempDb::create("ledger-unknown");
    let ledger = ledger(&db);
    let user = UserId::new("frank");
    funded(&ledger, &user, 100).await;

    let err = assert_err!(ledger.refund(&user, &ExternalRef::from("nope")).await);
    assert!(matches!(err, Error::Ledger(LedgerError::NotFound { .. })));

    let stranger = UserId::new("nobody");
    let err = assert_err!(ledger.commit(&stranger, &ExternalRef::from("nope")).await);
    assert!(matches!(err, Error::Ledger(LedgerError::NotFound { .. })));
}
