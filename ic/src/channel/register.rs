//! SamplingRegister - the single last-value slot shared by producers and the tick handler

use std::mem;
use std::sync::{Mutex, PoisonError};

/// Mutex-protected slot holding the most recently written value
///
/// Writers overwrite unconditionally; the last writer to take the lock wins.
/// A poisoned lock is recovered, so a writer that panicked elsewhere cannot
/// make later writes fail.
#[derive(Debug, Default)]
pub struct SamplingRegister<T> {
    slot: Mutex<T>,
}

impl<T> SamplingRegister<T> {
    /// Create a register holding `initial`
    pub fn new(initial: T) -> Self {
        Self {
            slot: Mutex::new(initial),
        }
    }

    /// Overwrite the stored value
    pub fn write(&self, value: T) {
        let previous = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            mem::replace(&mut *slot, value)
        };
        // Old value drops outside the critical section
        drop(previous);
    }
}

impl<T: Clone> SamplingRegister<T> {
    /// Copy of the stored value
    pub fn snapshot(&self) -> T {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}
