//! Transactable memory words
//!
//! A [`TCell`] is the unit the STM protects. Its address is its identity in
//! read/write signatures. Application code reaches the value only through a
//! transaction; the raw load and store used by the protocol are crate-private.

use std::fmt;
use std::sync::atomic::{fence, AtomicI64, Ordering};

/// Shared memory word under transactional control
#[derive(Default)]
pub struct TCell {
    value: AtomicI64,
}

impl TCell {
    /// Create a cell holding `value`
    pub const fn new(value: i64) -> Self {
        Self {
            value: AtomicI64::new(value),
        }
    }

    /// Address used as the signature key
    #[inline]
    pub fn addr(&self) -> usize {
        self as *const TCell as usize
    }

    /// Read the value outside any transaction
    ///
    /// Only meaningful while no commit is writing back, e.g. after all worker
    /// threads have been joined.
    pub fn load_untracked(&self) -> i64 {
        self.value.load(Ordering::SeqCst)
    }

    /// Speculative read, fenced on both sides
    #[inline]
    pub(crate) fn load_speculative(&self) -> i64 {
        fence(Ordering::SeqCst);
        let value = self.value.load(Ordering::Relaxed);
        fence(Ordering::SeqCst);
        value
    }

    /// Write-back store; the caller fences the whole write-back block
    #[inline]
    pub(crate) fn store_write_back(&self, value: i64) {
        self.value.store(value, Ordering::Relaxed);
    }
}

impl fmt::Debug for TCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TCell")
            .field("addr", &format_args!("{:#x}", self.addr()))
            .field("value", &self.value.load(Ordering::Relaxed))
            .finish()
    }
}
