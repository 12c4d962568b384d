//! RingSTM Integration Tests
//!
//! Tests for the transaction protocol through the public API:
//! - Documented scenarios (sequential commits, rollover, conservation)
//! - Isolation under real thread contention
//! - Property tests over random operation sequences

mod common;

mod concurrency;
mod properties;
mod scenarios;
