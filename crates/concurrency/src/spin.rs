//! Bounded busy-waiting
//!
//! The protocol never blocks. A thread that must wait for another thread's
//! slot publication spins with an exponential pause backoff and yields its time
//! slice once the backoff saturates. An optional iteration limit turns a wait
//! that never finishes into an abort.

use ringstm_core::ConflictReason;

/// Pause count doubles up to this cap: 0 -> 1 -> 3 -> 7 -> 15 -> 15
const BACKOFF_CAP: u32 = 15;

/// Exponential spin backoff
#[derive(Debug, Default)]
pub(crate) struct Backoff {
    count: u32,
}

impl Backoff {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Spin `count + 1` pause instructions, then grow the count
    pub(crate) fn spin(&mut self) {
        for _ in 0..=self.count {
            std::hint::spin_loop();
        }
        if self.count == BACKOFF_CAP {
            std::thread::yield_now();
        }
        self.count = ((self.count << 1) | 1) & BACKOFF_CAP;
    }
}

/// Outcome of one poll of a wait condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Poll {
    /// Condition holds, stop waiting
    Ready,
    /// Keep spinning
    Pending,
    /// Condition can never hold; abort with this reason
    Abort(ConflictReason),
}

/// Spin until `poll` is ready, aborts, or `limit` iterations pass
pub(crate) fn spin_until<F>(
    limit: Option<u64>,
    what: &'static str,
    mut poll: F,
) -> Result<(), ConflictReason>
where
    F: FnMut() -> Poll,
{
    let mut backoff = Backoff::new();
    let mut iterations = 0u64;
    loop {
        match poll() {
            Poll::Ready => return Ok(()),
            Poll::Abort(reason) => return Err(reason),
            Poll::Pending => {}
        }
        iterations += 1;
        if let Some(limit) = limit {
            if iterations >= limit {
                tracing::warn!(waiting_for = what, iterations, "spin limit exceeded");
                return Err(ConflictReason::SpinLimit);
            }
        }
        backoff.spin();
    }
}
