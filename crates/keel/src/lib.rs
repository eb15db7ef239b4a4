//! Keel: low-level memory and concurrency primitives for constrained hosts.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Keel sub-crates. For most users, adding `keel` as a single dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use keel::prelude::*;
//!
//! // A pool carved out of a 4 KiB heap arena.
//! let pool = MemoryPool::new(4096).unwrap();
//! let block = pool.allocate(100, 64).unwrap();
//! assert!(block.is_aligned_to(64));
//! pool.write(block, 0, b"hello").unwrap();
//! pool.release(block);
//!
//! // A queue of length-prefixed frames.
//! let queue = FrameQueue::with_capacity(256).unwrap();
//! queue.enqueue(b"first").unwrap();
//! queue.enqueue(b"second").unwrap();
//! assert_eq!(queue.dequeue_vec().unwrap(), b"first");
//!
//! // Two contenders sharing a critical section.
//! let lock = FilterLock::<2>::new();
//! drop(lock.lock(1));
//!
//! // Background work with failure reporting.
//! let mut dispatcher = Dispatcher::spawn(DispatcherConfig::default(), |failure| {
//!     eprintln!("{failure}");
//! })
//! .unwrap();
//! dispatcher.submit(|| Ok(())).unwrap();
//! assert_eq!(dispatcher.shutdown().completed, 1);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`core`] | `keel-core` | Raw-memory providers, lease registry |
//! | [`pool`] | `keel-pool` | First-fit block-splitting memory pool |
//! | [`ring`] | `keel-ring` | Framed ring buffer and its config |
//! | [`filter`] | `keel-filter` | N-contender filter lock |
//! | [`dispatch`] | `keel-dispatch` | Background task dispatcher |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Raw-memory providers and lease tracking (`keel-core`).
///
/// Implement [`core::RawMemory`] to control where pool and queue arenas
/// come from; [`core::LeaseRegistry`] tracks provider-backed regions by
/// address.
pub use keel_core as core;

/// Block-splitting memory pool (`keel-pool`).
///
/// [`pool::MemoryPool`] plus its handle, statistics and block snapshots.
pub use keel_pool as pool;

/// Framed ring buffer (`keel-ring`).
pub use keel_ring as ring;

/// N-contender filter lock (`keel-filter`).
pub use keel_filter as filter;

/// Background task dispatcher (`keel-dispatch`).
///
/// [`dispatch::Dispatcher`] runs closures in order on one named worker
/// thread and reports failures through a handler.
pub use keel_dispatch as dispatch;

/// Common imports for typical Keel usage.
///
/// ```rust
/// use keel::prelude::*;
/// ```
pub mod prelude {
    // Memory providers and leases
    pub use keel_core::{HeapMemory, Lease, LeaseRegistry, RawMemory, RawMemoryError};

    // Pool
    pub use keel_pool::{MemoryPool, PoolError, PoolPtr, PoolStats};

    // Ring
    pub use keel_ring::{FrameQueue, LengthPrefix, QueueConfig, QueueError};

    // Filter lock
    pub use keel_filter::{FilterGuard, FilterLock};

    // Dispatch
    pub use keel_dispatch::{
        DispatchError, Dispatcher, DispatcherConfig, FailureKind, TaskError, TaskFailure, TaskId,
    };
}
