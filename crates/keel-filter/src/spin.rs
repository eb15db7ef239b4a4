//! Bounded spin-then-yield waiting.

use std::hint;
use std::thread;

/// Spins before the first yield.
const SPIN_LIMIT: u32 = 64;

/// Wait strategy for one contended wait.
///
/// Busy-spins with [`hint::spin_loop`] for the first [`SPIN_LIMIT`]
/// rounds, then yields the time slice each round so a preempted lock
/// holder on an oversubscribed host gets to run.
pub(crate) struct Spin {
    rounds: u32,
}

impl Spin {
    pub fn new() -> Self {
        Self { rounds: 0 }
    }

    pub fn wait(&mut self) {
        if self.rounds < SPIN_LIMIT {
            self.rounds += 1;
            hint::spin_loop();
        } else {
            thread::yield_now();
        }
    }

    #[cfg(test)]
    fn is_yielding(&self) -> bool {
        self.rounds >= SPIN_LIMIT
    }
}
