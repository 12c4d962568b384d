//! Core types for RingSTM
//!
//! This crate defines the pieces shared by every layer:
//! - [`Signature`] / [`SharedSignature`]: probabilistic address sets
//! - [`StmConfig`]: ring capacity, signature width, spin limit
//! - [`Error`] / [`ConflictReason`]: the abort signal and API errors

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod signature;

pub use config::{StmConfig, DEFAULT_RING_CAPACITY, DEFAULT_SIGNATURE_BITS};
pub use error::{ConflictReason, Error, Result};
pub use signature::{SharedSignature, Signature};
