//! Queue configuration.

use std::error::Error;
use std::fmt;

use crate::frame::LengthPrefix;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`QueueConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Capacity is zero.
    ZeroCapacity,
    /// Capacity cannot hold even one prefix plus one payload byte.
    CapacityBelowFrame {
        /// The configured capacity.
        capacity: usize,
        /// Smallest capacity that can hold a one-byte frame.
        minimum: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroCapacity => write!(f, "capacity must be at least 1"),
            Self::CapacityBelowFrame { capacity, minimum } => {
                write!(
                    f,
                    "capacity {capacity} cannot hold a frame, minimum is {minimum}"
                )
            }
        }
    }
}

impl Error for ConfigError {}

// ── QueueConfig ────────────────────────────────────────────────────

/// Construction parameters for a [`FrameQueue`](crate::FrameQueue).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueConfig {
    /// Arena size in bytes. Default: [`QueueConfig::DEFAULT_CAPACITY`].
    pub capacity: usize,
    /// Width of each frame's length prefix. Default: [`LengthPrefix::U32`].
    pub prefix: LengthPrefix,
}

impl QueueConfig {
    /// Default arena size.
    pub const DEFAULT_CAPACITY: usize = 4096;

    /// Config with the given capacity and the default prefix.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Check that the capacity can hold at least one non-empty frame.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        let minimum = self.prefix.width() + 1;
        if self.capacity < minimum {
            return Err(ConfigError::CapacityBelowFrame {
                capacity: self.capacity,
                minimum,
            });
        }
        Ok(())
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
            prefix: LengthPrefix::default(),
        }
    }
}
