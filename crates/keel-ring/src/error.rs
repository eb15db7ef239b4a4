//! Queue error types.

use std::error::Error;
use std::fmt;

use keel_core::RawMemoryError;

use crate::config::ConfigError;

/// Errors returned by [`FrameQueue`](crate::FrameQueue) operations.
///
/// Every variant other than the construction failures leaves the queue
/// exactly as it was before the call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueueError {
    /// The queue has no arena: it was never initialised or was destroyed.
    Uninitialized,
    /// `init` was called with a capacity of zero.
    ZeroCapacity,
    /// The memory provider could not supply the arena.
    ArenaUnavailable(RawMemoryError),
    /// The queue configuration was rejected.
    Config(ConfigError),
    /// The frame does not fit in the remaining free bytes.
    InsufficientSpace {
        /// Bytes the frame needs, prefix included.
        needed: usize,
        /// Bytes currently free.
        free: usize,
    },
    /// The item length cannot be represented by the queue's length prefix.
    ItemTooLarge {
        /// Length of the rejected item.
        len: usize,
        /// Largest length the prefix can record.
        max: usize,
    },
    /// The caller's buffer is shorter than the frame at the front.
    BufferTooSmall {
        /// Payload length of the front frame.
        required: usize,
        /// Length of the buffer supplied.
        provided: usize,
    },
    /// The queue holds no frames.
    Empty,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "queue is not initialised"),
            Self::ZeroCapacity => write!(f, "queue capacity must be at least 1"),
            Self::ArenaUnavailable(e) => write!(f, "arena unavailable: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::InsufficientSpace { needed, free } => {
                write!(f, "frame needs {needed} bytes, {free} free")
            }
            Self::ItemTooLarge { len, max } => {
                write!(f, "item of {len} bytes exceeds prefix limit of {max}")
            }
            Self::BufferTooSmall { required, provided } => {
                write!(
                    f,
                    "buffer of {provided} bytes cannot hold {required}-byte frame"
                )
            }
            Self::Empty => write!(f, "queue is empty"),
        }
    }
}

impl Error for QueueError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ArenaUnavailable(e) => Some(e),
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for QueueError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
