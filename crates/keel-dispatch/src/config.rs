//! Dispatcher configuration.

use std::error::Error;
use std::fmt;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`DispatcherConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The worker thread name is empty.
    EmptyThreadName,
    /// The worker thread name contains a NUL byte.
    ThreadNameContainsNul,
    /// A bounded queue was requested with room for zero tasks.
    ZeroQueueBound,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyThreadName => write!(f, "thread_name must not be empty"),
            Self::ThreadNameContainsNul => write!(f, "thread_name must not contain NUL"),
            Self::ZeroQueueBound => write!(f, "queue_bound must be at least 1"),
        }
    }
}

impl Error for ConfigError {}

// ── DispatcherConfig ───────────────────────────────────────────────

/// Construction parameters for a [`Dispatcher`](crate::Dispatcher).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Name given to the worker thread. Default: `"keel-dispatch"`.
    pub thread_name: String,
    /// Maximum number of queued tasks, or `None` for an unbounded queue.
    /// Default: `None`.
    pub queue_bound: Option<usize>,
}

impl DispatcherConfig {
    /// Default worker thread name.
    pub const DEFAULT_THREAD_NAME: &'static str = "keel-dispatch";

    /// Check the thread name and queue bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thread_name.is_empty() {
            return Err(ConfigError::EmptyThreadName);
        }
        if self.thread_name.contains('\0') {
            return Err(ConfigError::ThreadNameContainsNul);
        }
        if self.queue_bound == Some(0) {
            return Err(ConfigError::ZeroQueueBound);
        }
        Ok(())
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            thread_name: Self::DEFAULT_THREAD_NAME.to_owned(),
            queue_bound: None,
        }
    }
}
