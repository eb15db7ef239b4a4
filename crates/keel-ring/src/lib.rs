//! Wrap-around FIFO of length-prefixed byte frames.
//!
//! A [`FrameQueue`] owns one fixed-capacity arena obtained from a
//! [`RawMemory`](keel_core::RawMemory) provider. Each frame is a
//! little-endian length prefix followed by the payload; both are written
//! in logical order and may wrap physically past the end of the arena.
//!
//! ```text
//!            rear                front
//!              v                   v
//! [ ..payload | free ............. | len | payload ... ]
//!   ^ wrapped tail of the oldest frame
//! ```
//!
//! Invariant: `free + Σ(prefix + payload) == capacity`, and frames come
//! out in the order they went in. Every operation takes the queue's one
//! lock for its full duration.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod frame;
pub mod queue;

pub use config::{ConfigError, QueueConfig};
pub use error::QueueError;
pub use frame::LengthPrefix;
pub use queue::{FrameQueue, QueueCursors};
