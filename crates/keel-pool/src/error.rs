//! Pool-specific error types.

use std::error::Error;
use std::fmt;

use keel_core::RawMemoryError;

/// Errors that can occur during pool construction and operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PoolError {
    /// The arena cannot hold even one block header plus a payload byte.
    ArenaTooSmall {
        /// Arena capacity in bytes.
        capacity: usize,
        /// Smallest capacity the pool accepts.
        minimum: usize,
    },
    /// The memory provider could not supply the arena.
    ArenaUnavailable(RawMemoryError),
    /// A zero-byte allocation was requested.
    ZeroSize,
    /// The requested alignment is neither zero nor a power of two.
    InvalidAlignment {
        /// The rejected alignment.
        alignment: usize,
    },
    /// No free block can hold the request.
    OutOfMemory {
        /// Payload bytes needed, including alignment slack.
        requested: usize,
        /// Size of the largest free block at the time of the request.
        largest_free: usize,
    },
    /// The address does not belong to a live allocation of this pool.
    InvalidPointer {
        /// The rejected address.
        addr: usize,
    },
    /// A payload access would run past the end of its block.
    OutOfBounds {
        /// Offset from the allocation's address.
        offset: usize,
        /// Length of the access.
        len: usize,
        /// Bytes addressable from the allocation's address.
        available: usize,
    },
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArenaTooSmall { capacity, minimum } => {
                write!(
                    f,
                    "arena too small: {capacity} bytes, need at least {minimum}"
                )
            }
            Self::ArenaUnavailable(e) => write!(f, "arena unavailable: {e}"),
            Self::ZeroSize => write!(f, "zero-size allocation requested"),
            Self::InvalidAlignment { alignment } => {
                write!(f, "alignment {alignment} is not a power of two")
            }
            Self::OutOfMemory {
                requested,
                largest_free,
            } => {
                write!(
                    f,
                    "out of memory: requested {requested} bytes, largest free block {largest_free} bytes"
                )
            }
            Self::InvalidPointer { addr } => {
                write!(f, "address {addr:#x} is not a live allocation")
            }
            Self::OutOfBounds {
                offset,
                len,
                available,
            } => {
                write!(
                    f,
                    "access of {len} bytes at offset {offset} exceeds {available} addressable bytes"
                )
            }
        }
    }
}

impl Error for PoolError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ArenaUnavailable(e) => Some(e),
            _ => None,
        }
    }
}
