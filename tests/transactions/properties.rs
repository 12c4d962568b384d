//! Property Tests
//!
//! Random operation sequences checked against the protocol's guarantees:
//! - Read-your-writes, even with a narrow (collision-heavy) signature
//! - No false negatives: a conflicting commit always aborts the reader
//! - The snapshot never moves backwards within an attempt
//! - Read-only transactions never advance the clock

use crate::common::*;
use proptest::prelude::*;
use ringstm::{ConflictReason, Stm, StmConfig};
use std::collections::HashMap;

#[derive(Debug, Clone)]
enum Op {
    Read(usize),
    Write(usize, i64),
}

fn op_strategy(cells: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..cells).prop_map(Op::Read),
        (0..cells, any::<i64>()).prop_map(|(i, v)| Op::Write(i, v)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn read_your_writes_with_narrow_signature(
        ops in prop::collection::vec(op_strategy(32), 1..100),
    ) {
        // 64-bit signatures make write-signature false positives common.
        let stm = Stm::new(StmConfig::new().ring_capacity(8).signature_bits(64)).unwrap();
        let shared = cells(32, -1);
        let mut model: HashMap<usize, i64> = HashMap::new();

        let mut tx = stm.context();
        tx.begin();
        for op in &ops {
            match *op {
                Op::Write(i, v) => {
                    tx.write(&shared[i], v);
                    model.insert(i, v);
                }
                Op::Read(i) => {
                    let expected = model.get(&i).copied().unwrap_or(-1);
                    prop_assert_eq!(tx.read(&shared[i]).unwrap(), expected);
                }
            }
        }
        tx.commit().unwrap();
        for (i, v) in model {
            prop_assert_eq!(shared[i].load_untracked(), v);
        }
    }

    #[test]
    fn conflicting_commit_is_never_missed(
        reads in prop::collection::vec(0usize..64, 1..16),
        pick in any::<prop::sample::Index>(),
        bits in prop::sample::select(vec![64usize, 256, 1024]),
        unrelated in 0usize..4,
    ) {
        let stm = Stm::new(StmConfig::new().ring_capacity(16).signature_bits(bits)).unwrap();
        let shared = cells(64, 0);

        let mut reader = stm.context();
        reader.begin();
        for &i in &reads {
            reader.read(&shared[i]).unwrap();
        }

        // Some unrelated blind commits, then one that hits the read set.
        for _ in 0..unrelated {
            let mut tx = stm.context();
            tx.begin();
            tx.write(&shared[63], 1);
            tx.commit().unwrap();
        }
        let victim = reads[pick.index(reads.len())];
        let conflict_version = commit_write(&stm, &shared[victim], 99);

        let err = reader.validate().unwrap_err();
        match err.conflict_reason() {
            Some(ConflictReason::ReadSetOverlap { version }) => {
                prop_assert!(version >= 1 && version <= conflict_version);
            }
            other => prop_assert!(false, "unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn snapshot_is_monotone(
        steps in prop::collection::vec((0usize..16, any::<bool>()), 1..60),
    ) {
        let stm = stm_with_capacity(64);
        let reader_cells = cells(16, 0);
        let writer_cells = cells(16, 0);

        let mut reader = stm.context();
        reader.begin();
        let mut last = reader.snapshot_version();
        for (i, other_commits) in steps {
            if other_commits {
                commit_write(&stm, &writer_cells[i], i as i64);
            }
            match reader.read(&reader_cells[i]) {
                Ok(_) => {
                    prop_assert!(reader.snapshot_version() >= last);
                    last = reader.snapshot_version();
                }
                Err(e) => {
                    // Only possible once 64 commits outran the snapshot.
                    prop_assert!(e.is_retryable());
                    reader.begin();
                    prop_assert!(reader.snapshot_version() >= last);
                    last = reader.snapshot_version();
                }
            }
        }
    }

    #[test]
    fn read_only_commit_leaves_clock(
        prior in 0u64..10,
        reads in prop::collection::vec(0usize..8, 0..20),
    ) {
        let stm = stm_with_capacity(16);
        let shared = cells(8, 3);
        for _ in 0..prior {
            commit_write(&stm, &shared[0], 3);
        }
        let before = stm.current_version();

        let mut tx = stm.context();
        tx.begin();
        for i in reads {
            prop_assert_eq!(tx.read(&shared[i]).unwrap(), 3);
        }
        prop_assert_eq!(tx.commit().unwrap(), None);
        prop_assert_eq!(stm.current_version(), before);
    }
}
