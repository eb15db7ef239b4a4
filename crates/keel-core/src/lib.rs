//! Core types and traits shared by the Keel primitives.
//!
//! This is the leaf crate of the workspace. It defines the raw-memory
//! provider abstraction that pools and queues use to obtain their arenas,
//! and the [`LeaseRegistry`] that maps provider-backed regions to their
//! owners by address.
//!
//! Nothing here is process-global: providers and registries are plain
//! values, constructed by the caller and passed to whatever needs them.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod lease;
pub mod memory;

pub use error::RawMemoryError;
pub use lease::{Lease, LeaseRegistry};
pub use memory::{HeapMemory, RawMemory};
