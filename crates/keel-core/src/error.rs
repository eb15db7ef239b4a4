//! Error types for raw-memory providers.

use std::error::Error;
use std::fmt;

/// Errors reported by a [`RawMemory`](crate::RawMemory) provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawMemoryError {
    /// A zero-length region was requested.
    ZeroLength,
    /// The provider could not supply a region of the requested size.
    Exhausted {
        /// Number of bytes requested.
        requested: usize,
    },
    /// The provider enforces a ceiling and the request would exceed it.
    BudgetExceeded {
        /// Number of bytes requested.
        requested: usize,
        /// Bytes still available under the ceiling.
        available: usize,
    },
}

impl fmt::Display for RawMemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroLength => write!(f, "zero-length region requested"),
            Self::Exhausted { requested } => {
                write!(f, "memory exhausted: could not provide {requested} bytes")
            }
            Self::BudgetExceeded {
                requested,
                available,
            } => {
                write!(
                    f,
                    "memory budget exceeded: requested {requested} bytes, {available} bytes available"
                )
            }
        }
    }
}

impl Error for RawMemoryError {}
