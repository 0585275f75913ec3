//! Ledger tests against a real SQLite file, including concurrent transfers.

use std::collections::HashMap;

use tempfile::TempDir;

use cookie_bot::db::init_pool;
use cookie_bot::ledger::{Ledger, LedgerError, OverdraftPolicy, Rejection};

const ALICE: u64 = 240_000_000_000_000_001;
const BOB: u64 = 240_000_000_000_000_002;
const CAROL: u64 = 240_000_000_000_000_003;

async fn file_ledger(policy: OverdraftPolicy) -> (TempDir, Ledger) {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite:{}", dir.path().join("cookies.db").display());
    let pool = init_pool(&url).await.unwrap();
    (dir, Ledger::new(pool, policy))
}

async fn seed(ledger: &Ledger, balances: &[(u64, i64)]) {
    for &(user_id, balance) in balances {
        ledger.ensure_account(user_id).await.unwrap();
        ledger.set_balance(user_id, balance).await.unwrap();
    }
}

fn total(balances: &HashMap<u64, i64>) -> i64 {
    balances.values().sum()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_debits_never_overdraw() {
    let (_dir, ledger) = file_ledger(OverdraftPolicy::Reject).await;
    seed(&ledger, &[(ALICE, 100)]).await;

    // Ten transfers of 15 from a balance of 100: at most six can succeed.
    let handles: Vec<_> = (0..10)
        .map(|i| {
            let ledger = ledger.clone();
            let recipient = if i % 2 == 0 { BOB } else { CAROL };
            tokio::spawn(async move { ledger.transfer(ALICE, recipient, 15).await })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(LedgerError::Rejected(Rejection::InsufficientBalance { amount: 15, .. })) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(accepted, 6);

    let balances = ledger.get_all_balances().await.unwrap();
    assert_eq!(balances[&ALICE], 100 - 15 * accepted);
    assert_eq!(balances[&BOB] + balances[&CAROL], 15 * accepted);
    assert_eq!(total(&balances), 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_transfers_lose_no_updates() {
    let (_dir, ledger) = file_ledger(OverdraftPolicy::Allow).await;

    let handles: Vec<_> = (1..=20)
        .map(|amount| {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                let (sender, recipient) = if amount % 3 == 0 { (BOB, ALICE) } else { (ALICE, BOB) };
                ledger.transfer(sender, recipient, amount).await.map(|_| (sender, amount))
            })
        })
        .collect();

    let mut expected_alice = 0;
    for handle in handles {
        let (sender, amount) = handle.await.unwrap().unwrap();
        if sender == ALICE {
            expected_alice -= amount;
        } else {
            expected_alice += amount;
        }
    }

    let balances = ledger.get_all_balances().await.unwrap();
    assert_eq!(balances[&ALICE], expected_alice);
    assert_eq!(balances[&BOB], -expected_alice);
    assert_eq!(total(&balances), 0);
}

#[tokio::test]
async fn balances_survive_reopening_the_database() {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite:{}", dir.path().join("cookies.db").display());

    {
        let ledger = Ledger::new(init_pool(&url).await.unwrap(), OverdraftPolicy::Reject);
        seed(&ledger, &[(ALICE, 40)]).await;
        ledger.transfer(ALICE, BOB, 25).await.unwrap();
        ledger.close().await;
    }

    let ledger = Ledger::new(init_pool(&url).await.unwrap(), OverdraftPolicy::Reject);
    assert_eq!(ledger.balance(ALICE).await.unwrap(), 15);
    assert_eq!(ledger.balance(BOB).await.unwrap(), 25);
}

#[tokio::test]
async fn rejected_transfers_keep_totals_intact() {
    let (_dir, ledger) = file_ledger(OverdraftPolicy::Reject).await;
    seed(&ledger, &[(ALICE, 50), (BOB, 10), (CAROL, 100)]).await;
    let before = ledger.get_all_balances().await.unwrap();

    for (sender, recipient, amount) in [(ALICE, BOB, 0), (BOB, BOB, 5), (BOB, ALICE, 11)] {
        assert!(matches!(
            ledger.transfer(sender, recipient, amount).await,
            Err(LedgerError::Rejected(_))
        ));
    }

    assert_eq!(ledger.get_all_balances().await.unwrap(), before);

    let board: Vec<(u64, i64)> = ledger
        .leaderboard()
        .await
        .unwrap()
        .into_iter()
        .map(|account| (account.user_id, account.balance))
        .collect();
    assert_eq!(board, vec![(BOB, 10), (ALICE, 50), (CAROL, 100)]);
}

#[tokio::test]
async fn closed_ledger_reports_storage_errors() {
    let (_dir, ledger) = file_ledger(OverdraftPolicy::Reject).await;
    ledger.close().await;

    assert!(matches!(
        ledger.balance(ALICE).await,
        Err(LedgerError::Database(_))
    ));
}
