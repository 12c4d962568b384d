//! Concurrency Tests
//!
//! Tests for isolation between threads:
//! - No lost updates on a contended counter
//! - Readers never observe a half-applied commit
//! - Conflicting transactions cannot both commit
//! - Read-only transactions leave the clock alone

use crate::common::*;
use ringstm::{ConflictReason, TCell};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Barrier;
use std::thread;

#[test]
fn test_contended_counter_has_no_lost_updates() {
    const THREADS: usize = 4;
    const INCREMENTS: usize = 500;

    let stm = stm_with_capacity(32);
    let counter = TCell::new(0);
    let barrier = Barrier::new(THREADS);

    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                barrier.wait();
                let mut tx = stm.context();
                for _ in 0..INCREMENTS {
                    tx.run(|tx| {
                        let v = tx.read(&counter)?;
                        tx.write(&counter, v + 1);
                        Ok(())
                    })
                    .unwrap();
                }
                assert_eq!(tx.commits(), INCREMENTS as u64);
            });
        }
    });

    assert_eq!(counter.load_untracked(), (THREADS * INCREMENTS) as i64);
    assert_eq!(stm.current_version(), (THREADS * INCREMENTS) as u64);
    assert_eq!(stm.metrics().commits, (THREADS * INCREMENTS) as u64);
}

#[test]
fn test_readers_see_consistent_pairs() {
    const TOTAL: i64 = 1_000;

    let stm = stm_with_capacity(16);
    let x = TCell::new(TOTAL);
    let y = TCell::new(0);
    let done = AtomicBool::new(false);

    thread::scope(|s| {
        s.spawn(|| {
            let mut tx = stm.context();
            for i in 0..2_000i64 {
                tx.run(|tx| {
                    let a = tx.read(&x)?;
                    let b = tx.read(&y)?;
                    let delta = if i % 2 == 0 { 7 } else { -7 };
                    tx.write(&x, a - delta);
                    tx.write(&y, b + delta);
                    Ok(())
                })
                .unwrap();
            }
            done.store(true, Ordering::SeqCst);
        });

        for _ in 0..2 {
            s.spawn(|| {
                let mut tx = stm.context();
                while !done.load(Ordering::SeqCst) {
                    let (a, b) = tx
                        .run(|tx| Ok((tx.read(&x)?, tx.read(&y)?)))
                        .unwrap();
                    assert_eq!(a + b, TOTAL, "observed a torn commit: {} + {}", a, b);
                }
            });
        }
    });

    assert_eq!(x.load_untracked() + y.load_untracked(), TOTAL);
}

#[test]
fn test_conflicting_transactions_do_not_both_commit() {
    let stm = stm_with_capacity(8);
    let x = TCell::new(10);

    let mut t1 = stm.context();
    let mut t2 = stm.context();
    t1.begin();
    t2.begin();

    let a = t1.read(&x).unwrap();
    let b = t2.read(&x).unwrap();
    t1.write(&x, a + 1);
    t2.write(&x, b + 1);

    assert_eq!(t1.commit().unwrap(), Some(1));
    let err = t2.commit().unwrap_err();
    assert_eq!(
        err.conflict_reason(),
        Some(ConflictReason::ReadSetOverlap { version: 1 })
    );

    // The loser restarts and sees the winner's write.
    t2.begin();
    let b = t2.read(&x).unwrap();
    assert_eq!(b, 11);
    t2.write(&x, b + 1);
    assert_eq!(t2.commit().unwrap(), Some(2));
    assert_eq!(x.load_untracked(), 12);
}

#[test]
fn test_blind_writes_both_commit_in_clock_order() {
    let stm = stm_with_capacity(8);
    let x = TCell::new(0);

    let mut t1 = stm.context();
    let mut t2 = stm.context();
    t1.begin();
    t2.begin();
    t1.write(&x, 1);
    t2.write(&x, 2);

    assert_eq!(t2.commit().unwrap(), Some(1));
    assert_eq!(t1.commit().unwrap(), Some(2));
    assert_eq!(x.load_untracked(), 1);
}

#[test]
fn test_concurrent_read_only_transactions_never_advance_clock() {
    let stm = stm_with_capacity(8);
    let accounts = cells(8, 5);
    commit_write(&stm, &accounts[0], 6);

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                let mut tx = stm.context();
                for _ in 0..200 {
                    let sum = tx
                        .run(|tx| {
                            let mut sum = 0;
                            for c in &accounts {
                                sum += tx.read(c)?;
                            }
                            Ok(sum)
                        })
                        .unwrap();
                    assert_eq!(sum, 41);
                }
            });
        }
    });

    assert_eq!(stm.current_version(), 1);
    assert_eq!(stm.metrics().read_only_commits, 800);
}
