//! N-contender mutual exclusion from shared atomics alone.
//!
//! [`FilterLock`] generalises Peterson's two-thread algorithm to a fixed
//! set of `N` contenders. A contender climbs `N - 1` levels; at each level
//! one contender (the latest to arrive, the *victim*) is held back while
//! any other contender is at the same level or above. Whoever clears the
//! last level is alone in the critical section.
//!
//! The lock uses no OS primitives and never blocks: waiting is a spin that
//! falls back to [`std::thread::yield_now`]. It guarantees mutual
//! exclusion and freedom from starvation, but every contender must use a
//! distinct id in `0..N` and no id may be used by two threads at once.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod filter;
mod spin;

pub use filter::{FilterGuard, FilterLock, NOT_CONTENDING};
