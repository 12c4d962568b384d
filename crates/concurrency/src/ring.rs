//! Ring of commit records
//!
//! Slot `v & (capacity - 1)` describes the commit that produced version `v`:
//! its write signature and whether its write-back has finished. Slots are
//! reused forever, so a slot read for version `v` may already describe
//! `v + capacity`; readers compare the stored version to detect that.
//!
//! ## Publication order
//!
//! ```text
//! winner of CAS(clock, v-1, v):
//!   status    = Writing
//!   -- release fence --
//!   signature = write set          (relaxed word stores)
//!   -- release fence --
//!   version   = v                  (release)
//!   ... write-back ...
//!   status    = Completed          (release)
//! ```
//!
//! A reader that loads `version == v` with acquire ordering sees the signature
//! and status for `v` fully formed.

use ringstm_core::{SharedSignature, Signature};
use std::sync::atomic::{fence, AtomicU64, AtomicU8, Ordering};

/// Version held by a slot that has never been published
pub const UNPUBLISHED: u64 = u64::MAX;

/// Progress of the commit recorded in a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SlotStatus {
    /// Write-back finished; the commit's effects are visible
    Completed = 0,
    /// Slot claimed, write-back in progress
    Writing = 1,
}

impl SlotStatus {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => SlotStatus::Completed,
            _ => SlotStatus::Writing,
        }
    }
}

/// One ring cell
#[derive(Debug)]
pub struct Slot {
    version: AtomicU64,
    status: AtomicU8,
    signature: SharedSignature,
}

impl Slot {
    fn new(version: u64, signature_bits: usize) -> Self {
        Self {
            version: AtomicU64::new(version),
            status: AtomicU8::new(SlotStatus::Completed as u8),
            signature: SharedSignature::new(signature_bits),
        }
    }

    /// Version this slot currently describes
    #[inline]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Current status
    #[inline]
    pub fn status(&self) -> SlotStatus {
        SlotStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// True once the version is `version` and its write-back has finished
    #[inline]
    pub fn is_completed_at(&self, version: u64) -> bool {
        self.version() == version && self.status() == SlotStatus::Completed
    }

    /// Write signature of the commit recorded here
    #[inline]
    pub fn signature(&self) -> &SharedSignature {
        &self.signature
    }

    /// Record the commit at `version`
    ///
    /// Only the thread that advanced the clock to `version` may call this.
    pub fn publish(&self, version: u64, write_signature: &Signature) {
        self.status
            .store(SlotStatus::Writing as u8, Ordering::Relaxed);
        // A reader that observes any of the new signature words, then issues
        // an acquire fence, also observes every version store that happened
        // before this publish.
        fence(Ordering::Release);
        self.signature.store_from(write_signature);
        fence(Ordering::Release);
        self.version.store(version, Ordering::Release);
    }

    /// Mark the write-back finished
    pub fn complete(&self) {
        self.status
            .store(SlotStatus::Completed as u8, Ordering::Release);
    }
}

/// Fixed-size circular array of slots
#[derive(Debug)]
pub struct Ring {
    slots: Box<[Slot]>,
    mask: u64,
}

impl Ring {
    /// Create a ring with `capacity` slots
    ///
    /// Slot 0 starts out as the completed genesis commit at version 0; every
    /// other slot is [`UNPUBLISHED`]. `capacity` must be a power of two.
    pub fn new(capacity: usize, signature_bits: usize) -> Self {
        debug_assert!(capacity.is_power_of_two());
        let slots = (0..capacity)
            .map(|i| Slot::new(if i == 0 { 0 } else { UNPUBLISHED }, signature_bits))
            .collect();
        Self {
            slots,
            mask: capacity as u64 - 1,
        }
    }

    /// Number of slots
    #[inline]
    pub fn capacity(&self) -> u64 {
        self.mask + 1
    }

    /// Slot currently stored at `version mod capacity`
    #[inline]
    pub fn slot_at(&self, version: u64) -> &Slot {
        &self.slots[(version & self.mask) as usize]
    }
}
