//! Task identity and failure reports.

use std::fmt;

/// Error type a task returns to signal failure.
///
/// Any `std::error::Error + Send + Sync` converts into it with `?`, as do
/// `String` and `&str`.
pub type TaskError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Submission-order identifier assigned by
/// [`Dispatcher::submit`](crate::Dispatcher::submit).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// How a task failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// The task returned `Err`; carries the error's display text.
    Error(String),
    /// The task panicked; carries the panic message when it was a string.
    Panicked(String),
}

/// A failed task, as delivered to the dispatcher's failure handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskFailure {
    /// The failing task.
    pub task_id: TaskId,
    /// What went wrong.
    pub kind: FailureKind,
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FailureKind::Error(msg) => write!(f, "{} failed: {msg}", self.task_id),
            FailureKind::Panicked(msg) => write!(f, "{} panicked: {msg}", self.task_id),
        }
    }
}
