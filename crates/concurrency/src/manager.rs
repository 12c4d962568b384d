//! Shared STM state and the retry driver
//!
//! [`Stm`] owns everything transactions coordinate through:
//! 1. The version clock (global commit order)
//! 2. The ring of commit slots (conflict history)
//! 3. Commit/abort counters (observability only)
//!
//! There is no process-wide singleton. Each `Stm` is an independent memory
//! domain; tests routinely run several side by side. Cells may be used with
//! only one `Stm` for their whole lifetime.
//!
//! ## Usage
//!
//! ```ignore
//! let stm = Stm::new(StmConfig::default())?;
//! let from = TCell::new(100);
//! let to = TCell::new(0);
//!
//! stm.atomically(|tx| {
//!     let balance = tx.read(&from)?;
//!     tx.write(&from, balance - 10);
//!     let other = tx.read(&to)?;
//!     tx.write(&to, other + 10);
//!     Ok(())
//! })?;
//! ```

use crate::clock::VersionClock;
use crate::ring::Ring;
use crate::transaction::TransactionContext;
use ringstm_core::{Result, StmConfig};
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-local transactional memory domain
///
/// Shared by reference (usually behind an `Arc`) among all threads that run
/// transactions over the same cells. Nothing in here takes a lock.
#[derive(Debug)]
pub struct Stm {
    config: StmConfig,
    pub(crate) clock: VersionClock,
    pub(crate) ring: Ring,
    pub(crate) counters: Counters,
}

impl Stm {
    /// Create an STM domain
    ///
    /// # Errors
    ///
    /// `Error::InvalidConfig` if the ring capacity is not a power of two or
    /// the signature width is not a multiple of 64.
    pub fn new(config: StmConfig) -> Result<Self> {
        config.validate()?;
        tracing::debug!(
            ring_capacity = config.ring_capacity,
            signature_bits = config.signature_bits,
            spin_limit = ?config.spin_limit,
            "created STM"
        );
        Ok(Self::with_validated(config))
    }

    fn with_validated(config: StmConfig) -> Self {
        Self {
            clock: VersionClock::new(0),
            ring: Ring::new(config.ring_capacity, config.signature_bits),
            counters: Counters::default(),
            config,
        }
    }

    /// Configuration this domain was built with
    pub fn config(&self) -> &StmConfig {
        &self.config
    }

    /// Current value of the version clock
    pub fn current_version(&self) -> u64 {
        self.clock.now()
    }

    /// Number of ring slots
    pub fn ring_capacity(&self) -> u64 {
        self.ring.capacity()
    }

    /// Create a transaction context for the calling thread
    ///
    /// Contexts are meant to be reused: each `begin` resets the previous
    /// attempt but keeps the buffers' allocations.
    pub fn context(&self) -> TransactionContext<'_> {
        TransactionContext::new(self)
    }

    /// Run `f` as a transaction, restarting it until it commits
    ///
    /// `f` may run many times and must not have side effects outside the
    /// transaction. Non-conflict errors returned by `f` stop the loop and are
    /// returned as is.
    pub fn atomically<'a, T, F>(&'a self, f: F) -> Result<T>
    where
        F: FnMut(&mut TransactionContext<'a>) -> Result<T>,
    {
        self.context().run(f)
    }

    /// Snapshot of the commit/abort counters
    pub fn metrics(&self) -> StmMetrics {
        let commits = self.counters.commits.load(Ordering::Relaxed);
        let read_only_commits = self.counters.read_only_commits.load(Ordering::Relaxed);
        let aborts = self.counters.aborts.load(Ordering::Relaxed);
        let attempts = commits + read_only_commits + aborts;
        StmMetrics {
            commits,
            read_only_commits,
            aborts,
            rollover_aborts: self.counters.rollover_aborts.load(Ordering::Relaxed),
            cas_retries: self.counters.cas_retries.load(Ordering::Relaxed),
            commit_rate: if attempts == 0 {
                1.0
            } else {
                (commits + read_only_commits) as f64 / attempts as f64
            },
        }
    }
}

impl Default for Stm {
    fn default() -> Self {
        Self::with_validated(StmConfig::default())
    }
}

/// Relaxed event counters
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) commits: AtomicU64,
    pub(crate) read_only_commits: AtomicU64,
    pub(crate) aborts: AtomicU64,
    pub(crate) rollover_aborts: AtomicU64,
    pub(crate) cas_retries: AtomicU64,
}

impl Counters {
    #[inline]
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// STM metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct StmMetrics {
    /// Commits that advanced the clock
    pub commits: u64,
    /// Read-only commits (clock untouched)
    pub read_only_commits: u64,
    /// Aborted attempts, all reasons
    pub aborts: u64,
    /// Aborts caused by ring rollover
    pub rollover_aborts: u64,
    /// Lost clock CAS races inside commit
    pub cas_retries: u64,
    /// Commit success rate (0.0 - 1.0)
    pub commit_rate: f64,
}
