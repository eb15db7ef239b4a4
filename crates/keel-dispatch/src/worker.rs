//! The worker thread's run loop.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crossbeam_channel::Receiver;

use crate::task::{FailureKind, TaskError, TaskFailure, TaskId};

pub(crate) type Task = Box<dyn FnOnce() -> Result<(), TaskError> + Send + 'static>;
pub(crate) type FailureHandler = Box<dyn Fn(TaskFailure) + Send + 'static>;

/// A queued unit of work.
pub(crate) struct Job {
    pub id: TaskId,
    pub task: Task,
}

/// Tally returned when the worker exits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct WorkerStats {
    pub completed: u64,
    pub failed: u64,
}

/// Run jobs in arrival order until every sender is gone and the channel
/// is drained.
pub(crate) fn run(jobs: Receiver<Job>, on_failure: FailureHandler) -> WorkerStats {
    let mut stats = WorkerStats::default();
    for Job { id, task } in jobs.iter() {
        let kind = match panic::catch_unwind(AssertUnwindSafe(task)) {
            Ok(Ok(())) => {
                stats.completed += 1;
                continue;
            }
            Ok(Err(e)) => FailureKind::Error(e.to_string()),
            Err(payload) => FailureKind::Panicked(panic_message(payload.as_ref())),
        };
        stats.failed += 1;
        match &kind {
            FailureKind::Error(msg) => tracing::warn!(task_id = id.0, error = %msg, "task failed"),
            FailureKind::Panicked(msg) => {
                tracing::warn!(task_id = id.0, panic = %msg, "task panicked")
            }
        }
        let failure = TaskFailure { task_id: id, kind };
        if panic::catch_unwind(AssertUnwindSafe(|| on_failure(failure))).is_err() {
            tracing::error!(task_id = id.0, "failure handler panicked");
        }
    }
    stats
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn collecting() -> (FailureHandler, Arc<Mutex<Vec<TaskFailure>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler: FailureHandler = Box::new(move |f| sink.lock().unwrap().push(f));
        (handler, seen)
    }

    fn job(id: u64, task: impl FnOnce() -> Result<(), TaskError> + Send + 'static) -> Job {
        Job {
            id: TaskId(id),
            task: Box::new(task),
        }
    }

    #[test]
    fn drains_queue_after_senders_drop() {
        let (tx, rx) = crossbeam_channel::unbounded();
        for i in 0..5 {
            tx.send(job(i, || Ok(()))).unwrap();
        }
        drop(tx);
        let (handler, seen) = collecting();
        let stats = run(rx, handler);
        assert_eq!(stats, WorkerStats { completed: 5, failed: 0 });
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn reports_errors_and_panics() {
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send(job(0, || Err("bad input".into()))).unwrap();
        tx.send(job(1, || panic!("exploded"))).unwrap();
        tx.send(job(2, || std::panic::panic_any(42u8))).unwrap();
        tx.send(job(3, || Ok(()))).unwrap();
        drop(tx);
        let (handler, seen) = collecting();
        let stats = run(rx, handler);
        assert_eq!(stats, WorkerStats { completed: 1, failed: 3 });
        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                TaskFailure {
                    task_id: TaskId(0),
                    kind: FailureKind::Error("bad input".into()),
                },
                TaskFailure {
                    task_id: TaskId(1),
                    kind: FailureKind::Panicked("exploded".into()),
                },
                TaskFailure {
                    task_id: TaskId(2),
                    kind: FailureKind::Panicked("non-string panic payload".into()),
                },
            ]
        );
    }

    #[test]
    fn handler_panic_does_not_stop_worker() {
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send(job(0, || Err("first".into()))).unwrap();
        tx.send(job(1, || Ok(()))).unwrap();
        drop(tx);
        let stats = run(rx, Box::new(|_| panic!("handler broke")));
        assert_eq!(stats, WorkerStats { completed: 1, failed: 1 });
    }

    #[test]
    fn formatted_panic_message_is_kept() {
        let payload = std::panic::catch_unwind(|| panic!("code {}", 7)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "code 7");
    }
}
