//! Transfer engine properties against the in-process store
//!
//! Conservation, atomicity, deadlock freedom, entry pairing, concurrent
//! uniqueness and not-found propagation.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use simple_bank::ledger::{
    Account, FailPoint, LedgerError, MemoryStore, TransferEngine, TransferProgress, TransferState,
    TransferTxParams, transfer_tx, transfer_tx_tracked,
};
use tokio::task::JoinSet;

const HANG_GUARD: Duration = Duration::from_secs(10);

fn two_accounts(balance: i64) -> (MemoryStore, Account, Account) {
    let store = MemoryStore::new();
    let a = store.create_account("alice", "USD", balance).unwrap();
    let b = store.create_account("bob", "USD", balance).unwrap();
    (store, a, b)
}

fn total_balance(store: &MemoryStore, ids: &[i64]) -> i64 {
    ids.iter()
        .map(|id| store.get_account(*id).unwrap().balance)
        .sum()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn conservation_holds_across_mixed_transfers() {
    let store = MemoryStore::new();
    let accounts: Vec<Account> = ["alice", "bob", "carol"]
        .iter()
        .map(|owner| store.create_account(owner, "USD", 1_000).unwrap())
        .collect();
    let ids: Vec<i64> = accounts.iter().map(|a| a.id).collect();
    let before = total_balance(&store, &ids);

    let mut tasks = JoinSet::new();
    for i in 0..30usize {
        let store = store.clone();
        let from = ids[i % 3];
        let to = ids[(i + 1 + i / 3) % 3];
        let amount = (i as i64 % 7) + 1;
        tasks.spawn(async move { transfer_tx(&store, TransferTxParams::new(from, to, amount)).await });
    }

    let results = tokio::time::timeout(HANG_GUARD, tasks.join_all())
        .await
        .expect("transfers must not hang");
    for result in results {
        result.unwrap();
    }

    assert_eq!(total_balance(&store, &ids), before);

    // Every balance equals its opening balance plus the sum of its entries
    for account in &accounts {
        let entry_sum: i64 = store.entries_for(account.id).iter().map(|e| e.amount).sum();
        assert_eq!(store.get_account(account.id).unwrap().balance, 1_000 + entry_sum);
    }
}

#[tokio::test]
async fn failure_after_entries_leaves_no_trace() {
    for point in [
        FailPoint::CreateTransfer,
        FailPoint::CreateEntry,
        FailPoint::ApplyBalanceDelta,
    ] {
        let (store, a, b) = two_accounts(500);
        store.fail_at(point);
        let progress = TransferProgress::new();

        let err = transfer_tx_tracked(&store, TransferTxParams::new(a.id, b.id, 50), &progress)
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::Storage(_)), "{point:?}: {err:?}");
        assert_eq!(progress.current(), TransferState::RolledBack);
        assert!(store.transfers().is_empty(), "{point:?}");
        assert!(store.entries().is_empty(), "{point:?}");
        assert_eq!(store.get_account(a.id).unwrap().balance, 500);
        assert_eq!(store.get_account(b.id).unwrap().balance, 500);
    }
}

#[tokio::test]
async fn commit_failure_leaves_no_trace() {
    let (store, a, b) = two_accounts(500);
    store.fail_next_commit();

    let err = transfer_tx(&store, TransferTxParams::new(a.id, b.id, 50))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "STORAGE_ERROR");
    assert!(store.transfers().is_empty());
    assert_eq!(store.get_account(a.id).unwrap().balance, 500);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn opposite_direction_transfers_do_not_deadlock() {
    let (store, a, b) = two_accounts(1_000);
    let n = 10;
    let amount = 10;

    let handles = (0..n).map(|i| {
        let store = store.clone();
        let params = if i % 2 == 1 {
            TransferTxParams::new(b.id, a.id, amount)
        } else {
            TransferTxParams::new(a.id, b.id, amount)
        };
        tokio::spawn(async move { transfer_tx(&store, params).await })
    });

    let joined = tokio::time::timeout(HANG_GUARD, join_all(handles))
        .await
        .expect("transfers must not hang");
    for result in joined {
        result.unwrap().unwrap();
    }

    assert_eq!(store.get_account(a.id).unwrap().balance, 1_000);
    assert_eq!(store.get_account(b.id).unwrap().balance, 1_000);
    assert_eq!(store.transfers().len(), n);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_transfer_has_a_balancing_entry_pair() {
    let (store, a, b) = two_accounts(1_000);
    let engine = TransferEngine::new(Arc::new(store.clone()));

    let mut tasks = JoinSet::new();
    for i in 0..8 {
        let engine = engine.clone();
        let params = if i % 3 == 0 {
            TransferTxParams::new(b.id, a.id, 5 + i)
        } else {
            TransferTxParams::new(a.id, b.id, 5 + i)
        };
        tasks.spawn(async move { engine.transfer(params).await });
    }

    let results = tokio::time::timeout(HANG_GUARD, tasks.join_all())
        .await
        .expect("transfers must not hang");

    for result in results {
        let result = result.unwrap();
        let transfer = store.get_transfer(result.transfer.id).unwrap();

        assert_eq!(result.from_entry.account_id, transfer.from_account_id);
        assert_eq!(result.from_entry.amount, -transfer.amount);
        assert_eq!(result.to_entry.account_id, transfer.to_account_id);
        assert_eq!(result.to_entry.amount, transfer.amount);
        assert_eq!(result.from_entry.amount + result.to_entry.amount, 0);
    }

    assert_eq!(store.entries().len(), 2 * store.transfers().len());
    assert_eq!(store.entries().iter().map(|e| e.amount).sum::<i64>(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_transfers_get_distinct_ids_and_no_lost_updates() {
    let (store, a, b) = two_accounts(1_000);
    let n = 5;
    let amount = 10;

    let params = TransferTxParams::new(a.id, b.id, amount);
    let handles = (0..n).map(|_| {
        let store = store.clone();
        tokio::spawn(async move { transfer_tx(&store, params).await })
    });
    let joined = tokio::time::timeout(HANG_GUARD, join_all(handles))
        .await
        .expect("transfers must not hang");

    let mut transfer_ids = HashSet::new();
    let mut entry_ids = HashSet::new();
    let mut seen_k = HashSet::new();
    for result in joined {
        let result = result.unwrap().unwrap();
        assert!(transfer_ids.insert(result.transfer.id));
        assert!(entry_ids.insert(result.from_entry.id));
        assert!(entry_ids.insert(result.to_entry.id));

        // Each commit saw the balance after exactly k earlier transfers
        let diff1 = a.balance - result.from_account.balance;
        let diff2 = result.to_account.balance - b.balance;
        assert_eq!(diff1, diff2);
        assert_eq!(diff1 % amount, 0);
        let k = diff1 / amount;
        assert!((1..=n).contains(&k));
        assert!(seen_k.insert(k));
    }

    assert_eq!(transfer_ids.len(), 5);
    assert_eq!(entry_ids.len(), 10);
    assert_eq!(store.get_account(a.id).unwrap().balance, a.balance - n * amount);
    assert_eq!(store.get_account(b.id).unwrap().balance, b.balance + n * amount);
}

#[tokio::test]
async fn missing_account_propagates_not_found() {
    let (store, a, _) = two_accounts(500);
    let missing = 9_999;

    for params in [
        TransferTxParams::new(a.id, missing, 10),
        TransferTxParams::new(missing, a.id, 10),
    ] {
        let err = transfer_tx(&store, params).await.unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound(id) if id == missing));
        assert!(err.is_not_found());
    }

    assert!(store.transfers().is_empty());
    assert!(store.entries().is_empty());
    assert_eq!(store.get_account(a.id).unwrap().balance, 500);
}

#[tokio::test]
async fn rollback_failure_is_reported_with_both_causes() {
    let (store, a, b) = two_accounts(500);
    store.fail_at(FailPoint::ApplyBalanceDelta);
    store.fail_next_rollback();

    let err = transfer_tx(&store, TransferTxParams::new(a.id, b.id, 10))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "ROLLBACK_FAILED");
    let msg = err.to_string();
    assert!(msg.starts_with("tx err: "), "{msg}");
    assert!(msg.contains(", rb err: "), "{msg}");
}
