//! Background work dispatch for Keel.
//!
//! A [`Dispatcher`] owns one named worker thread that runs submitted
//! closures in submission order. Tasks report failure by returning
//! `Err` or by panicking; either way the failure is handed to a
//! caller-supplied handler as a [`TaskFailure`] and the worker carries on
//! with the next task.
//!
//! Dispatchers are ordinary values: construct one where it is needed and
//! pass it (or an `Arc` of it) to whoever submits work.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod task;
mod worker;

pub use config::{ConfigError, DispatcherConfig};
pub use dispatcher::{Dispatcher, ShutdownReport};
pub use error::DispatchError;
pub use task::{FailureKind, TaskError, TaskFailure, TaskId};
