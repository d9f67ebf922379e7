//! Synchronization primitives underneath the driver's event model.
//!
//! `LockLatch` is the mutex/condvar-gated boolean every `Event` is built
//! from; it is the same shape the driver's queues and I/O loop reach for
//! whenever a thread needs to block until some other thread flips a flag.

use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// A boolean gated by a mutex/condvar pair: starts false, can be set,
/// reset, and waited on (optionally with a timeout).
pub struct LockLatch {
    state: Mutex<bool>,
    condvar: Condvar,
}

impl LockLatch {
    pub fn new(initial: bool) -> LockLatch {
        LockLatch {
            state: Mutex::new(initial),
            condvar: Condvar::new(),
        }
    }

    pub fn get(&self) -> bool {
        *self.state.lock().unwrap()
    }

    pub fn set(&self) {
        let mut guard = self.state.lock().unwrap();
        *guard = true;
        self.condvar.notify_all();
    }

    pub fn reset(&self) {
        let mut guard = self.state.lock().unwrap();
        *guard = false;
    }

    /// Blocks until the latch is true, or `timeout` elapses. `None` blocks
    /// forever. Returns whether the latch was observed true.
    pub fn wait_timeout(&self, timeout: Option<Duration>) -> bool {
        let mut guard = self.state.lock().unwrap();
        let deadline = timeout.map(|d| Instant::now() + d);
        while !*guard {
            match deadline {
                None => guard = self.condvar.wait(guard).unwrap(),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    let (g, result) = self.condvar.wait_timeout(guard, deadline - now).unwrap();
                    guard = g;
                    if result.timed_out() && !*guard {
                        return false;
                    }
                }
            }
        }
        true
    }
}

impl Default for LockLatch {
    fn default() -> Self {
        LockLatch::new(false)
    }
}
