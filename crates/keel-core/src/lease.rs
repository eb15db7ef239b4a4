//! Address-keyed ownership tracking for provider-backed regions.
//!
//! A [`LeaseRegistry`] allocates byte regions through a [`RawMemory`]
//! provider and keeps the owning `Arc<Lease>` in a map keyed by the
//! region's address. Callers hold `Weak` handles: a lease stays alive
//! while it is registered (or while a caller has upgraded its handle) and
//! returns its bytes to the provider when the last strong reference drops.
//!
//! Releasing a lease that is already gone is a no-op. This makes a
//! repeated release harmless, but it also means `release` cannot be used
//! to detect double-free bugs; the returned `bool` is the only signal.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use indexmap::IndexMap;

use crate::error::RawMemoryError;
use crate::memory::{HeapMemory, RawMemory};

/// A provider-backed byte region owned by a [`LeaseRegistry`].
pub struct Lease {
    addr: usize,
    len: usize,
    bytes: Mutex<Box<[u8]>>,
    memory: Arc<dyn RawMemory>,
}

impl Lease {
    /// Address of the first byte of the region.
    pub fn addr(&self) -> usize {
        self.addr
    }

    /// Length of the region in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the region is empty. Registries never hand out empty leases.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Run `f` with shared access to the region's bytes.
    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        f(&bytes)
    }

    /// Run `f` with exclusive access to the region's bytes.
    pub fn with_bytes_mut<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> R {
        let mut bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut bytes)
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        let region = std::mem::take(self.bytes.get_mut().unwrap_or_else(PoisonError::into_inner));
        self.memory.release(region);
    }
}

impl std::fmt::Debug for Lease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lease")
            .field("addr", &format_args!("{:#x}", self.addr))
            .field("len", &self.len)
            .finish()
    }
}

/// Maps region addresses to the leases that own them.
pub struct LeaseRegistry {
    leases: Mutex<IndexMap<usize, Arc<Lease>>>,
    memory: Arc<dyn RawMemory>,
}

impl LeaseRegistry {
    /// Create an empty registry that allocates through `memory`.
    pub fn new(memory: impl RawMemory + 'static) -> Self {
        Self {
            leases: Mutex::new(IndexMap::new()),
            memory: Arc::new(memory),
        }
    }

    /// Allocate a `len`-byte region and register it.
    ///
    /// The returned handle is weak: the registry holds the owning
    /// reference until [`release`](Self::release) is called.
    pub fn acquire(&self, len: usize) -> Result<Weak<Lease>, RawMemoryError> {
        let region = self.memory.allocate(len)?;
        let addr = region.as_ptr() as usize;
        let lease = Arc::new(Lease {
            addr,
            len: region.len(),
            bytes: Mutex::new(region),
            memory: Arc::clone(&self.memory),
        });
        let handle = Arc::downgrade(&lease);
        self.lock().insert(addr, lease);
        Ok(handle)
    }

    /// Unregister the lease behind `handle`.
    ///
    /// Returns `true` if a live, registered lease was removed. A handle
    /// whose lease has already been released (or dropped) is ignored and
    /// `false` is returned. The region's bytes go back to the provider
    /// once no caller holds an upgraded reference.
    pub fn release(&self, handle: &Weak<Lease>) -> bool {
        let Some(lease) = handle.upgrade() else {
            tracing::trace!("release of a lease that is no longer live ignored");
            return false;
        };
        // A live lease still owns its region, so no other lease can be
        // registered at the same address.
        self.lock().swap_remove(&lease.addr).is_some()
    }

    /// Look up the live lease registered at `addr`.
    pub fn get(&self, addr: usize) -> Option<Weak<Lease>> {
        self.lock().get(&addr).map(Arc::downgrade)
    }

    /// Number of registered leases.
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, IndexMap<usize, Arc<Lease>>> {
        self.leases.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for LeaseRegistry {
    fn default() -> Self {
        Self::new(HeapMemory)
    }
}
