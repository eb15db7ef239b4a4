//! Dispatcher error types.

use std::error::Error;
use std::fmt;

use crate::config::ConfigError;

/// Errors returned by [`Dispatcher`](crate::Dispatcher) construction and
/// submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchError {
    /// The configuration was rejected.
    Config(ConfigError),
    /// The OS refused to start the worker thread.
    SpawnFailed {
        /// The OS error message.
        reason: String,
    },
    /// The bounded queue is full; the task was not accepted.
    QueueFull {
        /// The configured bound.
        bound: usize,
    },
    /// The dispatcher has been shut down.
    ShutDown,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::SpawnFailed { reason } => write!(f, "worker spawn failed: {reason}"),
            Self::QueueFull { bound } => write!(f, "task queue full ({bound} queued)"),
            Self::ShutDown => write!(f, "dispatcher is shut down"),
        }
    }
}

impl Error for DispatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for DispatchError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
