//! A hand-rolled counting semaphore.
//!
//! The corpus has no semaphore crate in its dependency graph, so capacity-bounded
//! device access is built directly on [`Mutex`] + [`Condvar`], the same primitives the
//! teacher codebase uses for its own blocking handshakes.

use std::sync::{Condvar, Mutex};

/// Blocks callers once `capacity` permits are checked out; unblocks the oldest waiter
/// as permits are returned.
#[derive(Debug)]
pub struct CountingSemaphore {
    capacity: u32,
    available: Mutex<u32>,
    freed: Condvar,
}

impl CountingSemaphore {
    /// Creates a semaphore with `capacity` permits, all initially free.
    #[must_use]
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            available: Mutex::new(capacity),
            freed: Condvar::new(),
        }
    }

    /// The configured capacity (used to compute `used mod capacity` reporting indices).
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Blocks the calling thread until a permit is available, then checks it out.
    pub fn acquire(&self) {
        let mut available = self.available.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        while *available == 0 {
            available = self
                .freed
                .wait(available)
                .unwrap_or_else(std::sync::PoisonError::into_inner);
        }
        *available -= 1;
    }

    /// Returns a permit, waking one blocked waiter.
    pub fn release(&self) {
        let mut available = self.available.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        debug_assert!(*available < self.capacity, "released more permits than capacity");
        *available += 1;
        self.freed.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn second_acquirer_blocks_until_release() {
        let sem = Arc::new(CountingSemaphore::new(1));
        sem.acquire();

        let sem_clone = Arc::clone(&sem);
        let handle = thread::spawn(move || {
            sem_clone.acquire();
        });

        thread::sleep(Duration::from_millis(20));
        assert!(!handle.is_finished());

        sem.release();
        handle.join().expect("waiter completes once released");
    }
}
