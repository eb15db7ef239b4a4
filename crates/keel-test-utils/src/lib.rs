//! Test utilities and mock types for Keel development.
//!
//! Provides instrumented [`RawMemory`] providers ([`CountingMemory`],
//! [`FailingMemory`], [`BudgetMemory`]) and byte-pattern fixtures for
//! exercising pools and queues.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::atomic::{AtomicUsize, Ordering};

use keel_core::{HeapMemory, RawMemory, RawMemoryError};

pub use fixtures::{frame, pattern};

/// Heap-backed provider that counts every region it hands out and takes back.
///
/// Pass it by reference (`&CountingMemory`) so the test keeps a handle for
/// assertions after the pool or queue under test is dropped.
#[derive(Debug, Default)]
pub struct CountingMemory {
    allocations: AtomicUsize,
    releases: AtomicUsize,
    outstanding: AtomicUsize,
}

impl CountingMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `allocate` calls.
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }

    /// Number of `release` calls.
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Bytes handed out and not yet returned.
    pub fn outstanding_bytes(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }
}

impl RawMemory for CountingMemory {
    fn allocate(&self, len: usize) -> Result<Box<[u8]>, RawMemoryError> {
        let region = HeapMemory.allocate(len)?;
        self.allocations.fetch_add(1, Ordering::SeqCst);
        self.outstanding.fetch_add(len, Ordering::SeqCst);
        Ok(region)
    }

    fn release(&self, region: Box<[u8]>) {
        self.releases.fetch_add(1, Ordering::SeqCst);
        self.outstanding.fetch_sub(region.len(), Ordering::SeqCst);
    }
}

/// Provider that refuses every request.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailingMemory;

impl RawMemory for FailingMemory {
    fn allocate(&self, len: usize) -> Result<Box<[u8]>, RawMemoryError> {
        Err(RawMemoryError::Exhausted { requested: len })
    }
}

/// Heap-backed provider with a hard ceiling on outstanding bytes.
#[derive(Debug)]
pub struct BudgetMemory {
    budget: usize,
    outstanding: AtomicUsize,
}

impl BudgetMemory {
    pub fn new(budget: usize) -> Self {
        Self {
            budget,
            outstanding: AtomicUsize::new(0),
        }
    }

    /// Bytes still available under the ceiling.
    pub fn available(&self) -> usize {
        self.budget - self.outstanding.load(Ordering::SeqCst)
    }
}

impl RawMemory for BudgetMemory {
    fn allocate(&self, len: usize) -> Result<Box<[u8]>, RawMemoryError> {
        let reserved = self
            .outstanding
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                current
                    .checked_add(len)
                    .filter(|&total| total <= self.budget)
            });
        if let Err(current) = reserved {
            return Err(RawMemoryError::BudgetExceeded {
                requested: len,
                available: self.budget - current,
            });
        }
        HeapMemory.allocate(len).inspect_err(|_| {
            self.outstanding.fetch_sub(len, Ordering::SeqCst);
        })
    }

    fn release(&self, region: Box<[u8]>) {
        self.outstanding.fetch_sub(region.len(), Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counting_tracks_outstanding() {
        let memory = CountingMemory::new();
        let a = memory.allocate(100).unwrap();
        let b = memory.allocate(50).unwrap();
        assert_eq!(memory.outstanding_bytes(), 150);
        memory.release(a);
        memory.release(b);
        assert_eq!(memory.allocations(), 2);
        assert_eq!(memory.releases(), 2);
        assert_eq!(memory.outstanding_bytes(), 0);
    }

    #[test]
    fn budget_rejects_past_ceiling() {
        let memory = BudgetMemory::new(128);
        let a = memory.allocate(100).unwrap();
        assert_eq!(
            memory.allocate(64).unwrap_err(),
            RawMemoryError::BudgetExceeded {
                requested: 64,
                available: 28,
            }
        );
        memory.release(a);
        assert_eq!(memory.available(), 128);
        assert!(memory.allocate(128).is_ok());
    }

    #[test]
    fn failing_always_fails() {
        assert_eq!(
            FailingMemory.allocate(8).unwrap_err(),
            RawMemoryError::Exhausted { requested: 8 }
        );
    }
}
