//! Address signatures
//!
//! A [`Signature`] is a fixed-width bit vector used as a probabilistic set of
//! addresses. Membership tests may report false positives but never false
//! negatives, which is all conflict detection needs: a spurious hit costs an
//! extra abort, a miss would break isolation.
//!
//! [`SharedSignature`] is the same bit vector stored as atomic words. It lives
//! in a ring slot, where one committing thread writes it while any number of
//! validating threads read it.

use rustc_hash::FxHasher;
use std::hash::Hasher;
use std::sync::atomic::{AtomicU64, Ordering};

const WORD_BITS: usize = u64::BITS as usize;

#[inline]
fn bit_for(addr: usize, bits: usize) -> usize {
    let mut hasher = FxHasher::default();
    hasher.write_usize(addr);
    let h = hasher.finish();
    // Aligned addresses leave the low product bits zero; fold the high half in.
    ((h ^ (h >> 32)) % bits as u64) as usize
}

/// Thread-local bit-vector set of addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    words: Box<[u64]>,
}

impl Signature {
    /// Create an empty signature of `bits` width
    ///
    /// `bits` is rounded up to a whole number of 64-bit words.
    pub fn new(bits: usize) -> Self {
        let words = bits.max(1).div_ceil(WORD_BITS);
        Self {
            words: vec![0u64; words].into_boxed_slice(),
        }
    }

    /// Width in bits
    pub fn bits(&self) -> usize {
        self.words.len() * WORD_BITS
    }

    /// Add an address
    #[inline]
    pub fn insert(&mut self, addr: usize) {
        let bit = bit_for(addr, self.bits());
        self.words[bit / WORD_BITS] |= 1 << (bit % WORD_BITS);
    }

    /// Test membership; may return a false positive, never a false negative
    #[inline]
    pub fn contains(&self, addr: usize) -> bool {
        let bit = bit_for(addr, self.bits());
        self.words[bit / WORD_BITS] & (1 << (bit % WORD_BITS)) != 0
    }

    /// True if any bit is set in both signatures
    pub fn intersects(&self, other: &Signature) -> bool {
        debug_assert_eq!(self.words.len(), other.words.len());
        self.words
            .iter()
            .zip(other.words.iter())
            .fold(0u64, |acc, (a, b)| acc | (a & b))
            != 0
    }

    /// Remove every address
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Overwrite with the contents of `other`
    pub fn copy_from(&mut self, other: &Signature) {
        self.words.copy_from_slice(&other.words);
    }

    /// True if no address has been added since the last clear
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    pub(crate) fn words(&self) -> &[u64] {
        &self.words
    }
}

/// Signature stored in shared memory
///
/// Word-level atomics make concurrent publish/read race-free; consistency of a
/// whole signature is established by the slot's version protocol, not here.
#[derive(Debug)]
pub struct SharedSignature {
    words: Box<[AtomicU64]>,
}

impl SharedSignature {
    /// Create an empty shared signature of `bits` width
    pub fn new(bits: usize) -> Self {
        let words = bits.max(1).div_ceil(WORD_BITS);
        Self {
            words: (0..words).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    /// Width in bits
    pub fn bits(&self) -> usize {
        self.words.len() * WORD_BITS
    }

    /// Overwrite with the contents of `sig`
    ///
    /// Stores are relaxed; the publisher orders them with a release fence
    /// before making the owning slot's version visible.
    pub fn store_from(&self, sig: &Signature) {
        debug_assert_eq!(self.words.len(), sig.words().len());
        for (dst, src) in self.words.iter().zip(sig.words()) {
            dst.store(*src, Ordering::Relaxed);
        }
    }

    /// True if any bit is set here and in `sig`
    pub fn intersects(&self, sig: &Signature) -> bool {
        debug_assert_eq!(self.words.len(), sig.words().len());
        self.words
            .iter()
            .zip(sig.words())
            .fold(0u64, |acc, (a, b)| acc | (a.load(Ordering::Relaxed) & b))
            != 0
    }
}
