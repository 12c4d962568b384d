//! # RingSTM
//!
//! Software transactional memory over a bounded ring of commit signatures.
//!
//! Threads run blocks of reads and writes against shared [`TCell`]s as atomic,
//! isolated transactions. Writes are buffered until commit; every read is
//! validated against the write signatures of commits that happened since the
//! transaction's snapshot. A commit claims the next clock version, publishes
//! its signature into the ring slot for that version, then writes back.
//!
//! ## Quick Start
//!
//! ```ignore
//! use ringstm::prelude::*;
//!
//! let stm = Stm::new(StmConfig::new().ring_capacity(1024))?;
//! let a = TCell::new(100);
//! let b = TCell::new(0);
//!
//! stm.atomically(|tx| {
//!     let x = tx.read(&a)?;
//!     tx.write(&a, x - 10);
//!     let y = tx.read(&b)?;
//!     tx.write(&b, y + 10);
//!     Ok(())
//! })?;
//! ```
//!
//! ## Driving attempts by hand
//!
//! [`TransactionContext`] exposes the raw protocol (`begin`, `read`, `write`,
//! `commit`). Any [`Error::Conflict`] means "call `begin` and try again".
//!
//! ## Crates
//!
//! - `ringstm-core` - signatures, configuration, errors
//! - `ringstm-concurrency` - clock, ring, transaction context
//! - `ringstm-cli` - the `ringstm-bank` workload driver

#![warn(missing_docs)]

pub mod prelude;

// Re-export main entry points
pub use ringstm_concurrency::{
    Ring, Slot, SlotStatus, Stm, StmMetrics, TCell, TransactionContext, TransactionStatus,
    VersionClock,
};
pub use ringstm_core::{
    ConflictReason, Error, Result, SharedSignature, Signature, StmConfig, DEFAULT_RING_CAPACITY,
    DEFAULT_SIGNATURE_BITS,
};
