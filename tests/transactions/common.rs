//! Shared helpers for integration tests

use ringstm::{Stm, StmConfig, TCell};

/// Signature wide enough that distinct test cells practically never collide
pub const WIDE_BITS: usize = 1 << 16;

/// STM with a bounded spin so a protocol bug fails instead of hanging
pub fn stm_with_capacity(capacity: usize) -> Stm {
    Stm::new(
        StmConfig::new()
            .ring_capacity(capacity)
            .signature_bits(WIDE_BITS)
            .spin_limit(100_000_000),
    )
    .unwrap()
}

/// Commit a single blind write in a fresh transaction
pub fn commit_write(stm: &Stm, cell: &TCell, value: i64) -> u64 {
    let mut tx = stm.context();
    tx.begin();
    tx.write(cell, value);
    tx.commit().unwrap().expect("write transaction claims a version")
}

pub fn cells(n: usize, value: i64) -> Vec<TCell> {
    (0..n).map(|_| TCell::new(value)).collect()
}
