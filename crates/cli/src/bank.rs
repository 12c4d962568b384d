//! Bank-transfer workload
//!
//! Every thread repeatedly runs a transaction of ten transfers: for a random
//! pair of accounts, if the source holds at least 50 it moves 50 to the
//! destination. Money is never created or destroyed, so the sum over all
//! accounts after the run must equal the sum before it.

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ringstm_concurrency::{Stm, StmMetrics, TCell};
use ringstm_core::StmConfig;
use std::sync::Barrier;
use std::thread;
use std::time::{Duration, Instant};

/// Largest accepted account count
pub const MAX_ACCOUNTS: usize = 1_000_000;

/// Transfers per transaction
pub const TRANSFERS_PER_TX: usize = 10;

/// Amount moved by one transfer
pub const TRANSFER_AMOUNT: i64 = 50;

/// How long each worker keeps going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workload {
    /// Run until the duration has passed
    Timed(Duration),
    /// Commit exactly this many transactions
    Transactions(u64),
}

/// Workload parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankOptions {
    /// Worker threads
    pub threads: usize,
    /// Number of accounts
    pub accounts: usize,
    /// Partition accounts between threads
    pub disjoint: bool,
    /// Run length
    pub workload: Workload,
    /// Starting balance of every account
    pub initial_balance: i64,
}

impl BankOptions {
    /// Check the parameters before any thread starts
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            bail!("need at least one thread");
        }
        if self.accounts == 0 || self.accounts > MAX_ACCOUNTS {
            bail!("total accounts out of range");
        }
        if self.disjoint && self.accounts < self.threads {
            bail!(
                "disjoint mode needs at least one account per thread ({} accounts, {} threads)",
                self.accounts,
                self.threads
            );
        }
        Ok(())
    }

    /// Account range `[start, start + len)` used by thread `id`
    pub fn range_for(&self, id: usize) -> (usize, usize) {
        if self.disjoint {
            let per_thread = self.accounts / self.threads;
            (id * per_thread, per_thread)
        } else {
            (0, self.accounts)
        }
    }
}

/// Per-thread outcome
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadReport {
    /// Thread index
    pub id: usize,
    /// Committed transactions
    pub commits: u64,
    /// Aborted attempts
    pub aborts: u64,
    /// Commits per second
    pub throughput: u64,
}

/// Outcome of a whole run
#[derive(Debug, Clone)]
pub struct BankReport {
    /// One entry per thread, by id
    pub threads: Vec<ThreadReport>,
    /// Wall time from barrier release to last join
    pub elapsed: Duration,
    /// Sum of balances before the run
    pub start_total: i64,
    /// Sum of balances after the run
    pub final_total: i64,
    /// Version clock at the end
    pub clock: u64,
    /// STM counters at the end
    pub metrics: StmMetrics,
}

impl BankReport {
    /// Summed per-thread throughput
    pub fn throughput(&self) -> u64 {
        self.threads.iter().map(|t| t.throughput).sum()
    }

    /// True if no money was created or lost
    pub fn is_conserved(&self) -> bool {
        self.start_total == self.final_total
    }
}

/// Run the workload on a fresh STM built from `stm_config`
pub fn run(options: &BankOptions, stm_config: StmConfig) -> Result<BankReport> {
    options.validate()?;
    let stm = Stm::new(stm_config)?;
    let accounts: Vec<TCell> = (0..options.accounts)
        .map(|_| TCell::new(options.initial_balance))
        .collect();
    let start_total = total(&accounts);

    tracing::info!(
        threads = options.threads,
        accounts = options.accounts,
        disjoint = options.disjoint,
        start_total,
        "starting bank workload"
    );

    let barrier = Barrier::new(options.threads);
    let started = Instant::now();
    let threads = thread::scope(|scope| {
        let handles: Vec<_> = (0..options.threads)
            .map(|id| {
                let stm = &stm;
                let accounts = &accounts;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    worker(stm, accounts, options, id)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(report) => report,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect::<Result<Vec<_>>>()
    })?;
    let elapsed = started.elapsed();

    let report = BankReport {
        threads,
        elapsed,
        start_total,
        final_total: total(&accounts),
        clock: stm.current_version(),
        metrics: stm.metrics(),
    };
    tracing::info!(
        final_total = report.final_total,
        clock = report.clock,
        commits = report.metrics.commits,
        aborts = report.metrics.aborts,
        "bank workload finished"
    );
    Ok(report)
}

fn worker<'a>(
    stm: &'a Stm,
    accounts: &'a [TCell],
    options: &BankOptions,
    id: usize,
) -> Result<ThreadReport> {
    let (first, len) = options.range_for(id);
    let mut rng = StdRng::seed_from_u64(id as u64);
    let mut tx = stm.context();
    let started = Instant::now();

    let mut pairs = [(0usize, 0usize); TRANSFERS_PER_TX];
    let mut done = 0u64;
    loop {
        match options.workload {
            Workload::Timed(limit) if started.elapsed() >= limit => break,
            Workload::Transactions(n) if done >= n => break,
            _ => {}
        }
        for pair in pairs.iter_mut() {
            *pair = (first + rng.gen_range(0..len), first + rng.gen_range(0..len));
        }
        tx.run(|tx| {
            for &(from, to) in &pairs {
                let balance = tx.read(&accounts[from])?;
                if balance >= TRANSFER_AMOUNT {
                    tx.write(&accounts[from], balance - TRANSFER_AMOUNT);
                    let other = tx.read(&accounts[to])?;
                    tx.write(&accounts[to], other + TRANSFER_AMOUNT);
                }
            }
            Ok(())
        })?;
        done += 1;
    }

    let secs = started.elapsed().as_secs_f64().max(1e-9);
    let report = ThreadReport {
        id,
        commits: tx.commits(),
        aborts: tx.aborts(),
        throughput: (tx.commits() as f64 / secs) as u64,
    };
    tracing::debug!(id, commits = report.commits, aborts = report.aborts, "worker done");
    Ok(report)
}

fn total(accounts: &[TCell]) -> i64 {
    accounts.iter().map(TCell::load_untracked).sum()
}
