//! Transaction context
//!
//! A [`TransactionContext`] is the per-thread state of one transaction attempt:
//! read and write signatures, the buffered write set, and the snapshot version
//! (RV) the attempt has validated up to.
//!
//! ## State machine
//!
//! ```text
//!           begin()              commit() ok
//!   Idle ───────────► Active ───────────────► Committed
//!                       │  ▲                      │
//!          conflict /   │  │ begin()              │ begin()
//!          abort()      ▼  │                      │
//!                     Aborted ◄───────────────────┘ (next attempt)
//! ```
//!
//! Writes are buffered (deferred update): shared memory changes only during
//! the write-back of a successful commit. Every read is followed by an
//! incremental validation against the ring, so an attempt never keeps running
//! on a value some newer commit has already invalidated.

use crate::cell::TCell;
use crate::manager::{Counters, Stm};
use crate::ring::UNPUBLISHED;
use crate::spin::{spin_until, Backoff, Poll};
use ringstm_core::{ConflictReason, Error, Result, Signature};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::atomic::{fence, Ordering};

/// Lifecycle state of a context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Created, never begun
    Idle,
    /// Between `begin` and `commit`/abort
    Active,
    /// Last attempt committed
    Committed,
    /// Last attempt aborted
    Aborted,
}

impl TransactionStatus {
    /// Short name for error messages
    pub fn name(&self) -> &'static str {
        match self {
            TransactionStatus::Idle => "Idle",
            TransactionStatus::Active => "Active",
            TransactionStatus::Committed => "Committed",
            TransactionStatus::Aborted => "Aborted",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-thread transaction state
///
/// Created by [`Stm::context`] and reused across attempts. Not `Sync`: one
/// thread drives it, other threads only see its effects after commit.
pub struct TransactionContext<'a> {
    stm: &'a Stm,
    read_signature: Signature,
    write_signature: Signature,
    /// Keyed by cell address
    write_buffer: FxHashMap<usize, (&'a TCell, i64)>,
    snapshot_version: u64,
    status: TransactionStatus,
    commits: u64,
    aborts: u64,
}

impl<'a> TransactionContext<'a> {
    pub(crate) fn new(stm: &'a Stm) -> Self {
        let bits = stm.config().signature_bits;
        Self {
            stm,
            read_signature: Signature::new(bits),
            write_signature: Signature::new(bits),
            write_buffer: FxHashMap::default(),
            snapshot_version: 0,
            status: TransactionStatus::Idle,
            commits: 0,
            aborts: 0,
        }
    }

    /// Current lifecycle state
    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    /// Highest version this attempt has validated against (RV)
    pub fn snapshot_version(&self) -> u64 {
        self.snapshot_version
    }

    /// Number of buffered writes in the current attempt
    pub fn write_set_len(&self) -> usize {
        self.write_buffer.len()
    }

    /// Attempts committed through this context
    pub fn commits(&self) -> u64 {
        self.commits
    }

    /// Attempts aborted through this context
    pub fn aborts(&self) -> u64 {
        self.aborts
    }

    /// Start a new attempt
    ///
    /// Discards whatever the previous attempt buffered and picks the newest
    /// version whose slot is published and completed as the snapshot.
    pub fn begin(&mut self) {
        self.read_signature.clear();
        self.write_signature.clear();
        self.write_buffer.clear();
        self.snapshot_version = self.acquire_snapshot();
        self.status = TransactionStatus::Active;
    }

    /// Read `cell` within the attempt
    ///
    /// Returns the attempt's own buffered value if it wrote `cell`, otherwise
    /// the shared value, validated against every commit since the snapshot.
    ///
    /// # Errors
    ///
    /// `Error::Conflict` if validation fails; the attempt is aborted and no
    /// value is produced.
    pub fn read(&mut self, cell: &TCell) -> Result<i64> {
        self.ensure_active()?;
        let addr = cell.addr();

        if self.write_signature.contains(addr) {
            // The signature may be a false positive; only the buffer is authoritative.
            if let Some(&(_, value)) = self.write_buffer.get(&addr) {
                return Ok(value);
            }
        }

        let value = cell.load_speculative();
        self.read_signature.insert(addr);
        self.validate()?;
        Ok(value)
    }

    /// Buffer a write of `value` to `cell`
    ///
    /// Nothing is visible to other threads until commit. Never aborts.
    pub fn write(&mut self, cell: &'a TCell, value: i64) {
        debug_assert_eq!(
            self.status,
            TransactionStatus::Active,
            "write outside an active transaction"
        );
        let addr = cell.addr();
        self.write_buffer.insert(addr, (cell, value));
        self.write_signature.insert(addr);
    }

    /// Check the read set against every commit since the snapshot
    ///
    /// On success the snapshot advances to the clock value observed at entry,
    /// so the snapshot never moves backwards within an attempt.
    ///
    /// # Validation Sequence
    ///
    /// ```text
    /// 1. end = clock; end == RV -> done
    /// 2. end - RV >= capacity -> rollover abort
    /// 3. wait for slot(end) to be published
    /// 4. for i in end..=RV+1: slot(i).signature ∩ read signature -> abort
    /// 5. wait for slot(end) write-back to complete
    /// 6. slot(RV) overwritten meanwhile -> rollover abort
    /// 7. RV = end
    /// ```
    pub fn validate(&mut self) -> Result<()> {
        self.ensure_active()?;
        let stm = self.stm;
        let ring = &stm.ring;
        let start = self.snapshot_version;
        let end = stm.clock.now();
        if end == start {
            return Ok(());
        }

        if end - start >= ring.capacity() {
            return Err(self.fail(ConflictReason::Rollover { snapshot: start }));
        }

        if let Err(reason) = self.await_published(end) {
            return Err(self.fail(reason));
        }

        let conflict = (start + 1..=end)
            .rev()
            .find(|&v| ring.slot_at(v).signature().intersects(&self.read_signature));
        if let Some(version) = conflict {
            return Err(self.fail(ConflictReason::ReadSetOverlap { version }));
        }

        let slot = ring.slot_at(end);
        let waited = spin_until(stm.config().spin_limit, "slot completion", || {
            if slot.version() != end {
                Poll::Abort(ConflictReason::Rollover { snapshot: start })
            } else if slot.is_completed_at(end) {
                Poll::Ready
            } else {
                Poll::Pending
            }
        });
        if let Err(reason) = waited {
            return Err(self.fail(reason));
        }

        // Orders the relaxed signature loads above before the re-check.
        fence(Ordering::Acquire);
        if ring.slot_at(start).version() != start {
            return Err(self.fail(ConflictReason::Rollover { snapshot: start }));
        }

        self.snapshot_version = end;
        Ok(())
    }

    /// Commit the attempt
    ///
    /// Returns `Ok(None)` for a read-only attempt (the clock is not touched)
    /// and `Ok(Some(version))` with the claimed version otherwise.
    ///
    /// # Commit Sequence
    ///
    /// ```text
    /// loop:
    ///   1. cv = clock
    ///   2. wait for slot(cv) to be published
    ///   3. validate()                       (abort ends the commit)
    ///   4. CAS(clock, cv, cv + 1) or retry
    /// 5. publish slot(cv + 1): Writing, signature, version
    /// 6. write back the buffered values
    /// 7. slot(cv + 1) = Completed
    /// ```
    pub fn commit(&mut self) -> Result<Option<u64>> {
        self.ensure_active()?;
        let stm = self.stm;

        if self.write_buffer.is_empty() {
            self.status = TransactionStatus::Committed;
            self.commits += 1;
            Counters::bump(&stm.counters.read_only_commits);
            return Ok(None);
        }

        let version = loop {
            let commit_version = stm.clock.now();
            if let Err(reason) = self.await_published(commit_version) {
                return Err(self.fail(reason));
            }
            self.validate()?;
            if stm.clock.try_advance(commit_version) {
                break commit_version + 1;
            }
            Counters::bump(&stm.counters.cas_retries);
        };

        // Slot `version` is ours alone until we complete it.
        let slot = stm.ring.slot_at(version);
        slot.publish(version, &self.write_signature);

        fence(Ordering::SeqCst);
        for (cell, value) in self.write_buffer.values() {
            cell.store_write_back(*value);
        }
        fence(Ordering::SeqCst);

        slot.complete();

        self.status = TransactionStatus::Committed;
        self.commits += 1;
        Counters::bump(&stm.counters.commits);
        tracing::trace!(version, writes = self.write_buffer.len(), "committed");
        Ok(Some(version))
    }

    /// Abort the attempt on request of the transaction body
    ///
    /// Returns the conflict error to hand back to the retry driver:
    ///
    /// ```ignore
    /// if balance < amount {
    ///     return Err(tx.abort());
    /// }
    /// ```
    pub fn abort(&mut self) -> Error {
        self.fail(ConflictReason::Explicit)
    }

    /// Run `f` as a transaction on this context until it commits
    ///
    /// Each iteration begins a fresh attempt, runs `f`, then commits. Conflicts
    /// from `f` or from commit restart the loop; any other error ends it.
    pub fn run<T, F>(&mut self, mut f: F) -> Result<T>
    where
        F: FnMut(&mut Self) -> Result<T>,
    {
        loop {
            self.begin();
            let outcome = f(self).and_then(|value| self.commit().map(|_| value));
            match outcome {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let reason = e.conflict_reason();
                    // Errors raised by the body itself leave the attempt Active.
                    self.fail(reason.unwrap_or(ConflictReason::Explicit));
                    if reason.is_none() {
                        return Err(e);
                    }
                }
            }
        }
    }

    fn ensure_active(&self) -> Result<()> {
        if self.status == TransactionStatus::Active {
            Ok(())
        } else {
            Err(Error::NotActive {
                status: self.status.name(),
            })
        }
    }

    /// Mark the attempt aborted (once) and build the conflict error
    fn fail(&mut self, reason: ConflictReason) -> Error {
        if self.status == TransactionStatus::Active {
            self.status = TransactionStatus::Aborted;
            self.aborts += 1;
            let counters = &self.stm.counters;
            Counters::bump(&counters.aborts);
            if matches!(reason, ConflictReason::Rollover { .. }) {
                Counters::bump(&counters.rollover_aborts);
            }
            tracing::trace!(%reason, snapshot = self.snapshot_version, "aborted");
        }
        Error::Conflict(reason)
    }

    /// Wait until slot `version` holds `version`
    ///
    /// A slot already showing a newer version means the ring wrapped past it.
    fn await_published(&self, version: u64) -> std::result::Result<(), ConflictReason> {
        let slot = self.stm.ring.slot_at(version);
        let snapshot = self.snapshot_version;
        spin_until(self.stm.config().spin_limit, "slot publication", || {
            let stored = slot.version();
            if stored == version {
                Poll::Ready
            } else if stored != UNPUBLISHED && stored > version {
                Poll::Abort(ConflictReason::Rollover { snapshot })
            } else {
                Poll::Pending
            }
        })
    }

    /// Newest version whose slot is published and completed
    ///
    /// Walks down from the clock. Completion is ordered (a commit cannot claim
    /// `v + 1` before `v` completed), so at most the two newest slots are
    /// skipped. If every candidate in the ring window has been overwritten the
    /// clock ran ahead of us; start over from the new clock value.
    ///
    /// `begin` cannot abort, so `spin_limit` only raises a warning here; the
    /// walk keeps retrying until some commit completes.
    fn acquire_snapshot(&self) -> u64 {
        let ring = &self.stm.ring;
        let limit = self.stm.config().spin_limit;
        let mut backoff = Backoff::new();
        let mut rounds = 0u64;
        loop {
            let now = self.stm.clock.now();
            let floor = now.saturating_sub(ring.capacity() - 1);
            let mut candidate = now;
            loop {
                if ring.slot_at(candidate).is_completed_at(candidate) {
                    return candidate;
                }
                if candidate == floor {
                    break;
                }
                candidate -= 1;
            }
            rounds += 1;
            if Some(rounds) == limit {
                tracing::warn!(
                    waiting_for = "snapshot",
                    iterations = rounds,
                    "spin limit exceeded"
                );
            }
            backoff.spin();
        }
    }
}

impl fmt::Debug for TransactionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionContext")
            .field("status", &self.status)
            .field("snapshot_version", &self.snapshot_version)
            .field("writes", &self.write_buffer.len())
            .field("commits", &self.commits)
            .field("aborts", &self.aborts)
            .finish()
    }
}
