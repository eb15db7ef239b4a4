//! The [`FilterLock`] and its RAII guard.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::spin::Spin;

/// Level value of a contender that is not trying to enter.
pub const NOT_CONTENDING: usize = usize::MAX;

/// One contender's level, on its own cache line.
///
/// Every waiter scans every level on each spin; without padding, one
/// contender's store would invalidate its neighbours' lines.
#[repr(align(128))]
struct Level(AtomicUsize);

/// Filter lock for exactly `N` contenders, identified by `0..N`.
///
/// All loads and stores are `SeqCst`. The algorithm depends on a
/// contender's own level and victim stores being visible to others before
/// it reads their levels, which weaker orderings do not guarantee.
///
/// ```
/// use keel_filter::FilterLock;
///
/// let lock = FilterLock::<2>::new();
/// {
///     let _guard = lock.lock(0);
///     // critical section for contender 0
/// }
/// assert_eq!(lock.level_of(0), None);
/// ```
pub struct FilterLock<const N: usize> {
    levels: [Level; N],
    victims: [AtomicUsize; N],
}

// Compile-time assertion: the lock is shared by reference across threads.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<FilterLock<4>>();
};

impl<const N: usize> FilterLock<N> {
    /// A lock with every contender outside.
    pub fn new() -> Self {
        const { assert!(N >= 1, "a filter lock needs at least one contender") };
        Self {
            levels: std::array::from_fn(|_| Level(AtomicUsize::new(NOT_CONTENDING))),
            victims: std::array::from_fn(|_| AtomicUsize::new(NOT_CONTENDING)),
        }
    }

    /// Number of contenders the lock was built for.
    pub const fn contenders(&self) -> usize {
        N
    }

    /// Block (by spinning) until contender `id` holds the lock.
    ///
    /// # Panics
    ///
    /// Panics if `id >= N`.
    pub fn enter(&self, id: usize) {
        self.check_id(id);
        for level in 0..N - 1 {
            self.levels[id].0.store(level, Ordering::SeqCst);
            self.victims[level].store(id, Ordering::SeqCst);
            let mut spin = Spin::new();
            while self.victims[level].load(Ordering::SeqCst) == id
                && self.other_at_or_above(id, level)
            {
                spin.wait();
            }
        }
    }

    /// Release the lock held by contender `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id >= N`.
    pub fn leave(&self, id: usize) {
        self.check_id(id);
        self.levels[id].0.store(NOT_CONTENDING, Ordering::SeqCst);
    }

    /// [`enter`](Self::enter) and return a guard that leaves on drop.
    ///
    /// # Panics
    ///
    /// Panics if `id >= N`.
    pub fn lock(&self, id: usize) -> FilterGuard<'_, N> {
        self.enter(id);
        FilterGuard { lock: self, id }
    }

    /// The level contender `id` last claimed, or `None` if it is outside.
    ///
    /// # Panics
    ///
    /// Panics if `id >= N`.
    pub fn level_of(&self, id: usize) -> Option<usize> {
        self.check_id(id);
        match self.levels[id].0.load(Ordering::SeqCst) {
            NOT_CONTENDING => None,
            level => Some(level),
        }
    }

    fn other_at_or_above(&self, id: usize, level: usize) -> bool {
        self.levels.iter().enumerate().any(|(k, slot)| {
            if k == id {
                return false;
            }
            let other = slot.0.load(Ordering::SeqCst);
            other != NOT_CONTENDING && other >= level
        })
    }

    fn check_id(&self, id: usize) {
        assert!(id < N, "contender id {id} out of range for {N} contenders");
    }
}

impl<const N: usize> Default for FilterLock<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for FilterLock<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let levels: Vec<Option<usize>> = (0..N).map(|id| self.level_of(id)).collect();
        f.debug_struct("FilterLock")
            .field("contenders", &N)
            .field("levels", &levels)
            .finish()
    }
}

/// Holds a [`FilterLock`] for one contender; leaves on drop.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct FilterGuard<'a, const N: usize> {
    lock: &'a FilterLock<N>,
    id: usize,
}

impl<const N: usize> FilterGuard<'_, N> {
    /// The contender holding the lock.
    pub fn id(&self) -> usize {
        self.id
    }
}

impl<const N: usize> Drop for FilterGuard<'_, N> {
    fn drop(&mut self) {
        self.lock.leave(self.id);
    }
}

impl<const N: usize> fmt::Debug for FilterGuard<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterGuard").field("id", &self.id).finish()
    }
}
