//! Concurrency layer for RingSTM
//!
//! This crate implements the RingSTM protocol:
//! - VersionClock: global commit order
//! - Ring: bounded history of commit signatures
//! - TransactionContext: buffered writes, incremental validation, commit
//! - Stm: shared domain plus the retry driver
//!
//! Coordination is lock-free: atomics, fences and bounded busy-waits only.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cell;
pub mod clock;
pub mod manager;
pub mod ring;
mod spin;
pub mod transaction;

pub use cell::TCell;
pub use clock::VersionClock;
pub use manager::{Stm, StmMetrics};
pub use ring::{Ring, Slot, SlotStatus, UNPUBLISHED};
pub use transaction::{TransactionContext, TransactionStatus};
