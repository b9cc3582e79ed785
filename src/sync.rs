//! Locks used by the tracking engine.
//!
//! Two flavours live side by side:
//!
//! - [`SpinMutex`] guards each session's event log. It never parks the
//!   calling thread, so it can be taken from scheduling callbacks that run
//!   where sleeping is not allowed. Critical sections under it must be O(1).
//! - [`Mutex`] / [`RwLock`] (re-exported from `parking_lot`) guard state that
//!   is only touched from ordinary blocking contexts: control operations and
//!   the subscription registry.
//!
//! # Examples
//!
//! ```
//! use sched_monitor::sync::SpinMutex;
//!
//! let log = SpinMutex::new(Vec::new());
//! log.lock().push(1);
//! assert_eq!(log.lock().len(), 1);
//! ```

pub use parking_lot::{Mutex, MutexGuard, RwLock};

/// Busy-waiting mutual exclusion, safe to acquire where blocking is forbidden.
#[derive(Debug, Default)]
pub struct SpinMutex<T>(spin::Mutex<T>);

impl<T> SpinMutex<T> {
    /// Creates a new spinlock-protected value.
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self(spin::Mutex::new(value))
    }

    /// Spins until the lock is acquired.
    pub fn lock(&self) -> spin::MutexGuard<'_, T> {
        self.0.lock()
    }

    /// Acquires the lock only if it is free right now.
    pub fn try_lock(&self) -> Option<spin::MutexGuard<'_, T>> {
        self.0.try_lock()
    }

    /// Whether some thread currently holds the lock.
    pub fn is_locked(&self) -> bool {
        self.0.is_locked()
    }

    /// Consumes the wrapper and returns the underlying value.
    pub fn into_inner(self) -> T {
        self.0.into_inner()
    }
}
