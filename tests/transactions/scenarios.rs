//! Documented Scenarios
//!
//! End-to-end behaviour the protocol promises:
//! - Sequential commits are visible to later transactions
//! - A lagging transaction aborts once the ring wraps past its snapshot
//! - Bank transfers conserve the total balance

use crate::common::*;
use ringstm::{ConflictReason, TransactionStatus};
use std::sync::Barrier;
use std::thread;

#[test]
fn test_sequential_commits_latest_value_wins() {
    let stm = stm_with_capacity(8);
    let x = ringstm::TCell::new(0);

    assert_eq!(commit_write(&stm, &x, 100), 1);
    assert_eq!(commit_write(&stm, &x, 200), 2);

    let mut tx = stm.context();
    tx.begin();
    assert_eq!(tx.read(&x).unwrap(), 200);
    assert_eq!(tx.commit().unwrap(), None);
}

#[test]
fn test_lagging_transaction_aborts_on_rollover() {
    let stm = stm_with_capacity(8);
    let x = ringstm::TCell::new(42);
    let busy = ringstm::TCell::new(0);

    for i in 0..5 {
        commit_write(&stm, &busy, i);
    }

    let began = Barrier::new(2);
    let overtaken = Barrier::new(2);
    thread::scope(|s| {
        s.spawn(|| {
            let mut tx = stm.context();
            tx.begin();
            assert_eq!(tx.snapshot_version(), 5);
            began.wait();
            overtaken.wait();

            let err = tx.read(&x).unwrap_err();
            assert_eq!(
                err.conflict_reason(),
                Some(ConflictReason::Rollover { snapshot: 5 })
            );
            assert_eq!(tx.status(), TransactionStatus::Aborted);
        });
        s.spawn(|| {
            began.wait();
            for i in 0..8 {
                commit_write(&stm, &busy, 100 + i);
            }
            overtaken.wait();
        });
    });

    assert_eq!(stm.current_version(), 13);
    assert_eq!(stm.metrics().rollover_aborts, 1);
}

#[test]
fn test_lagging_transaction_recovers_after_restart() {
    let stm = stm_with_capacity(8);
    let x = ringstm::TCell::new(42);
    let busy = ringstm::TCell::new(0);

    let mut tx = stm.context();
    tx.begin();
    for i in 0..20 {
        commit_write(&stm, &busy, i);
    }
    assert!(tx.read(&x).unwrap_err().is_retryable());

    tx.begin();
    assert_eq!(tx.snapshot_version(), 20);
    assert_eq!(tx.read(&x).unwrap(), 42);
}

fn transfer_all<'a>(
    stm: &'a ringstm::Stm,
    accounts: &'a [ringstm::TCell],
    threads: usize,
    disjoint: bool,
) {
    let per_thread = accounts.len() / threads;
    thread::scope(|s| {
        for id in 0..threads {
            s.spawn(move || {
                let (base, span) = if disjoint {
                    (id * per_thread, per_thread)
                } else {
                    (0, accounts.len())
                };
                let mut tx = stm.context();
                for round in 0..300usize {
                    let from = base + (round * 7 + id) % span;
                    let to = base + (round * 13 + id * 3 + 1) % span;
                    tx.run(|tx| {
                        let balance = tx.read(&accounts[from])?;
                        if balance >= 50 {
                            tx.write(&accounts[from], balance - 50);
                            let other = tx.read(&accounts[to])?;
                            tx.write(&accounts[to], other + 50);
                        }
                        Ok(())
                    })
                    .unwrap();
                }
            });
        }
    });
}

#[test]
fn test_transfers_conserve_total_shared_accounts() {
    let stm = stm_with_capacity(64);
    let accounts = cells(16, 1000);
    transfer_all(&stm, &accounts, 4, false);

    let total: i64 = accounts.iter().map(|c| c.load_untracked()).sum();
    assert_eq!(total, 16 * 1000);
}

#[test]
fn test_transfers_conserve_total_disjoint_accounts() {
    let stm = stm_with_capacity(64);
    let accounts = cells(64, 1000);
    transfer_all(&stm, &accounts, 4, true);

    let total: i64 = accounts.iter().map(|c| c.load_untracked()).sum();
    assert_eq!(total, 64 * 1000);
}
