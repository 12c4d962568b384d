//! Convenient imports for RingSTM.
//!
//! ```ignore
//! use ringstm::prelude::*;
//!
//! let stm = Stm::new(StmConfig::default())?;
//! let cell = TCell::new(0);
//! stm.atomically(|tx| {
//!     let v = tx.read(&cell)?;
//!     tx.write(&cell, v + 1);
//!     Ok(())
//! })?;
//! ```

// Main entry point
pub use ringstm_concurrency::{Stm, TCell, TransactionContext};

// Error handling
pub use ringstm_core::{ConflictReason, Error, Result};

// Configuration
pub use ringstm_core::StmConfig;
