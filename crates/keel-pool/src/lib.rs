//! First-fit, block-splitting memory pool over a fixed byte arena.
//!
//! The arena is managed as a singly-linked list of variable-size blocks.
//! Every block starts with a [`HEADER_SIZE`]-byte metadata record encoded
//! directly into the arena; the list is threaded through those records by
//! arena offset, so the whole crate works on bounds-checked slices.
//!
//! ```text
//! offset 0
//! ├── header │ payload (used) ──next──┐
//! ├── header │ payload (free) <───────┘ ──next──┐
//! └── header │ payload (used) <─────────────────┘  next = none
//! ```
//!
//! # Invariants
//!
//! - `Σ(block.size + HEADER_SIZE) == capacity` at all times.
//! - No two adjacent blocks are both free once a release has returned.
//! - The list is never empty and never cyclic.
//!
//! Allocation, release and payload access all serialise on a single
//! per-pool mutex. Distinct pools never share an arena.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod block;
pub mod error;
pub mod pool;
pub mod ptr;

pub use block::{BlockInfo, HEADER_SIZE};
pub use error::PoolError;
pub use pool::{MemoryPool, PoolStats};
pub use ptr::PoolPtr;
