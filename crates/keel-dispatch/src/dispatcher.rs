//! The [`Dispatcher`] service.

use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Sender, TrySendError};

use crate::config::DispatcherConfig;
use crate::error::DispatchError;
use crate::task::{TaskError, TaskFailure, TaskId};
use crate::worker::{self, Job, WorkerStats};

/// Outcome of [`Dispatcher::shutdown`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Tasks accepted into the queue over the dispatcher's lifetime.
    /// Rejected submissions are not counted.
    pub submitted: u64,
    /// Tasks that returned `Ok`.
    pub completed: u64,
    /// Tasks that returned `Err` or panicked.
    pub failed: u64,
    /// Whether the worker thread was joined cleanly.
    pub worker_joined: bool,
    /// Milliseconds spent draining the queue and joining the worker.
    pub drain_ms: u64,
}

/// Runs submitted tasks one at a time, in submission order, on a
/// dedicated worker thread.
///
/// Submission never blocks: with an unbounded queue it always succeeds
/// while the dispatcher is running; with a bounded queue a full queue
/// rejects the task with [`DispatchError::QueueFull`].
///
/// Dropping the dispatcher performs the same drain-and-join as
/// [`shutdown`](Self::shutdown); tasks already queued still run.
pub struct Dispatcher {
    jobs: Option<Sender<Job>>,
    worker: Option<JoinHandle<WorkerStats>>,
    /// Tasks accepted so far; also the id of the next accepted task.
    accepted: Mutex<u64>,
    queue_bound: Option<usize>,
    thread_name: String,
    report: Option<ShutdownReport>,
}

// Compile-time assertion: a dispatcher can be shared by submitting threads.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Dispatcher>();
};

impl Dispatcher {
    /// Validate `config` and start the worker thread.
    ///
    /// `on_failure` runs on the worker thread for every task that returns
    /// `Err` or panics. A panic inside `on_failure` itself is caught and
    /// logged.
    pub fn spawn<F>(config: DispatcherConfig, on_failure: F) -> Result<Self, DispatchError>
    where
        F: Fn(TaskFailure) + Send + 'static,
    {
        config.validate()?;
        let (tx, rx) = match config.queue_bound {
            Some(bound) => crossbeam_channel::bounded(bound),
            None => crossbeam_channel::unbounded(),
        };
        let handler: worker::FailureHandler = Box::new(on_failure);
        let handle = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || worker::run(rx, handler))
            .map_err(|e| DispatchError::SpawnFailed {
                reason: e.to_string(),
            })?;
        tracing::debug!(
            thread = %config.thread_name,
            queue_bound = ?config.queue_bound,
            "dispatcher started"
        );
        Ok(Self {
            jobs: Some(tx),
            worker: Some(handle),
            accepted: Mutex::new(0),
            queue_bound: config.queue_bound,
            thread_name: config.thread_name,
            report: None,
        })
    }

    /// Queue `task` for execution and return its id.
    ///
    /// Ids are consecutive in queue order. A rejected task does not
    /// consume an id.
    pub fn submit<F>(&self, task: F) -> Result<TaskId, DispatchError>
    where
        F: FnOnce() -> Result<(), TaskError> + Send + 'static,
    {
        let jobs = self.jobs.as_ref().ok_or(DispatchError::ShutDown)?;
        // Held across the non-blocking send so ids match queue order.
        let mut accepted = self.accepted.lock().unwrap_or_else(PoisonError::into_inner);
        let id = TaskId(*accepted);
        let job = Job {
            id,
            task: Box::new(task),
        };
        jobs.try_send(job).map_err(|e| match e {
            TrySendError::Full(_) => DispatchError::QueueFull {
                bound: self.queue_bound.unwrap_or(0),
            },
            TrySendError::Disconnected(_) => DispatchError::ShutDown,
        })?;
        *accepted += 1;
        Ok(id)
    }

    /// Tasks waiting in the queue (not counting one that is running).
    pub fn queued(&self) -> usize {
        self.jobs.as_ref().map_or(0, Sender::len)
    }

    /// Whether [`shutdown`](Self::shutdown) has run.
    pub fn is_shut_down(&self) -> bool {
        self.jobs.is_none()
    }

    /// Name of the worker thread.
    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    /// Stop accepting tasks, run everything already queued, and join the
    /// worker.
    ///
    /// Idempotent: later calls return the first call's report.
    pub fn shutdown(&mut self) -> ShutdownReport {
        if let Some(report) = self.report {
            return report;
        }
        let start = Instant::now();
        self.jobs.take();

        let mut report = ShutdownReport {
            submitted: *self.accepted.get_mut().unwrap_or_else(PoisonError::into_inner),
            ..ShutdownReport::default()
        };
        if let Some(handle) = self.worker.take() {
            match handle.join() {
                Ok(stats) => {
                    report.completed = stats.completed;
                    report.failed = stats.failed;
                    report.worker_joined = true;
                }
                Err(_) => tracing::error!(thread = %self.thread_name, "dispatcher worker panicked"),
            }
        }
        report.drain_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::debug!(
            thread = %self.thread_name,
            completed = report.completed,
            failed = report.failed,
            drain_ms = report.drain_ms,
            "dispatcher stopped"
        );
        self.report = Some(report);
        report
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("thread_name", &self.thread_name)
            .field("queue_bound", &self.queue_bound)
            .field("queued", &self.queued())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}
