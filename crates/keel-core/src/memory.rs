//! Raw-memory providers.
//!
//! A [`RawMemory`] provider hands out fixed-size byte regions and takes
//! them back. Pools and queues call it once at construction to obtain
//! their arena and once at teardown to return it; it is never on a hot
//! path.

use std::sync::Arc;

use crate::error::RawMemoryError;

/// A source of contiguous, zero-initialised byte regions.
///
/// Implementations must be shareable across threads: a provider may back
/// several pools and queues that live on different threads.
pub trait RawMemory: Send + Sync {
    /// Obtain a region of exactly `len` bytes.
    ///
    /// Returns an error if `len == 0` or the provider cannot satisfy the
    /// request. Must not panic or abort on exhaustion.
    fn allocate(&self, len: usize) -> Result<Box<[u8]>, RawMemoryError>;

    /// Return a region previously obtained from [`allocate`](Self::allocate).
    ///
    /// The default implementation simply drops the region.
    fn release(&self, region: Box<[u8]>) {
        drop(region);
    }
}

/// Provider backed by the global heap.
///
/// Uses fallible reservation so that an oversized request surfaces as
/// [`RawMemoryError::Exhausted`] instead of aborting the process.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeapMemory;

impl RawMemory for HeapMemory {
    fn allocate(&self, len: usize) -> Result<Box<[u8]>, RawMemoryError> {
        if len == 0 {
            return Err(RawMemoryError::ZeroLength);
        }
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(len)
            .map_err(|_| RawMemoryError::Exhausted { requested: len })?;
        bytes.resize(len, 0);
        Ok(bytes.into_boxed_slice())
    }
}

impl<M: RawMemory + ?Sized> RawMemory for &M {
    fn allocate(&self, len: usize) -> Result<Box<[u8]>, RawMemoryError> {
        (**self).allocate(len)
    }

    fn release(&self, region: Box<[u8]>) {
        (**self).release(region)
    }
}

impl<M: RawMemory + ?Sized> RawMemory for Arc<M> {
    fn allocate(&self, len: usize) -> Result<Box<[u8]>, RawMemoryError> {
        (**self).allocate(len)
    }

    fn release(&self, region: Box<[u8]>) {
        (**self).release(region)
    }
}

impl<M: RawMemory + ?Sized> RawMemory for Box<M> {
    fn allocate(&self, len: usize) -> Result<Box<[u8]>, RawMemoryError> {
        (**self).allocate(len)
    }

    fn release(&self, region: Box<[u8]>) {
        (**self).release(region)
    }
}

// Compile-time assertion: providers can be shared as trait objects.
const _: fn() = || {
    fn assert<T: Send + Sync + ?Sized>() {}
    assert::<dyn RawMemory>();
    assert::<HeapMemory>();
};
