// Refcounted completion gate.

use crate::fatal;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

/// Counts outstanding commands that reference it.
///
/// The queue acquires it once per submission and releases it once per
/// completion; a count of zero means no referencing work is in flight. It is
/// shared through `Arc`, so entries in flight keep it alive.
#[derive(Debug, Default)]
pub struct Barrier {
    count: Mutex<u32>,
    cleared: Condvar,
}

impl Barrier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn lock(&self) -> MutexGuard<'_, u32> {
        self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn acquire(&self) {
        *self.lock() += 1;
    }

    /// Drop one reference. Releasing more often than acquired is fatal.
    pub fn release(&self) {
        let mut count = self.lock();
        if *count == 0 {
            drop(count);
            fatal!("barrier released more times than it was acquired");
        }
        *count -= 1;
        if *count == 0 {
            self.cleared.notify_all();
        }
    }

    pub fn count(&self) -> u32 {
        *self.lock()
    }

    pub fn is_clear(&self) -> bool {
        self.count() == 0
    }

    /// Block until no referencing work remains.
    pub fn wait(&self) {
        let mut count = self.lock();
        while *count > 0 {
            count = self
                .cleared
                .wait(count)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}
