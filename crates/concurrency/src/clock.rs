//! Global version clock
//!
//! A single counter that totally orders commits. It only ever moves by a
//! successful compare-and-swap from `v` to `v + 1`; whoever wins that swap owns
//! ring slot `v + 1`.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic commit counter shared by all transactions of one `Stm`
#[derive(Debug, Default)]
pub struct VersionClock {
    value: AtomicU64,
}

impl VersionClock {
    /// Create a clock starting at `initial`
    pub fn new(initial: u64) -> Self {
        Self {
            value: AtomicU64::new(initial),
        }
    }

    /// Current version
    #[inline]
    pub fn now(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }

    /// Claim `current + 1`
    ///
    /// Returns false if another committer moved the clock first.
    #[inline]
    pub fn try_advance(&self, current: u64) -> bool {
        self.value
            .compare_exchange(current, current + 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}
