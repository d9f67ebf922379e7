//! Event primitives and the `Waiter` multiplexer.
//!
//! Two event kinds share one representation: a *file-readable* event is
//! flipped by whoever owns the underlying descriptor (the subprocess
//! reader thread, for a child's stdout; a `MessageQueue`, for its FIFO);
//! a *user-signalable* event is flipped directly by application code (the
//! driver's quit signal). Both are manual-reset: once `set`, they stay
//! signalled until something explicitly calls `reset`.
//!
//! There is no raw descriptor exposed to callers ("present a single
//! `Event` abstraction with pluggable backends... do not expose the
//! backend choice"). The `Waiter` multiplexes by polling every event's
//! latch on a short interval rather than registering with a kernel poller;
//! that keeps the dependency stack unchanged while preserving the
//! contract (ready index, timeout, hangup, round-robin fairness).

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::sync::LockLatch;

const POLL_QUANTUM: Duration = Duration::from_millis(4);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    FileReadable,
    UserSignalled,
}

/// A manual-reset, kind-tagged signal with an independent hangup flag.
pub struct Event {
    kind: EventKind,
    latch: LockLatch,
    hungup: AtomicBool,
}

impl Event {
    pub fn file_readable() -> Event {
        Event {
            kind: EventKind::FileReadable,
            latch: LockLatch::new(false),
            hungup: AtomicBool::new(false),
        }
    }

    pub fn user_signalled() -> Event {
        Event {
            kind: EventKind::UserSignalled,
            latch: LockLatch::new(false),
            hungup: AtomicBool::new(false),
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn set(&self) {
        self.latch.set();
    }

    pub fn reset(&self) {
        self.latch.reset();
    }

    pub fn is_signalled(&self) -> bool {
        self.latch.get()
    }

    /// Marks the underlying descriptor/handle as hung up (EOF, broken
    /// pipe). A hung-up event also reads as signalled so a `Waiter`
    /// blocked only on `is_signalled` still wakes.
    pub fn mark_hangup(&self) {
        self.hungup.store(true, Ordering::SeqCst);
        self.latch.set();
    }

    pub fn is_hungup(&self) -> bool {
        self.hungup.load(Ordering::SeqCst)
    }
}

/// Outcome of `Waiter::wait`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Exactly one event (by index into the slice passed to `wait`) was
    /// ready.
    Ready(usize),
    Timeout,
    Hangup(usize),
}

/// Multiplexes a fixed set of `Event`s, handing out ready indices in
/// round-robin order across successive calls so no single event can
/// starve the others.
pub struct Waiter {
    cursor: std::sync::Mutex<usize>,
}

impl Waiter {
    pub fn new() -> Waiter {
        Waiter {
            cursor: std::sync::Mutex::new(0),
        }
    }

    /// `timeout_ms < 0` means wait forever.
    pub fn wait(&self, events: &[&Event], timeout_ms: i64) -> WaitOutcome {
        assert!(!events.is_empty(), "Waiter::wait requires at least one event");
        let deadline = if timeout_ms < 0 {
            None
        } else {
            Some(Instant::now() + Duration::from_millis(timeout_ms as u64))
        };

        loop {
            let start = *self.cursor.lock().unwrap() % events.len();
            for offset in 0..events.len() {
                let idx = (start + offset) % events.len();
                if events[idx].is_hungup() {
                    self.advance_past(idx, events.len());
                    return WaitOutcome::Hangup(idx);
                }
                if events[idx].is_signalled() {
                    self.advance_past(idx, events.len());
                    return WaitOutcome::Ready(idx);
                }
            }

            match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return WaitOutcome::Timeout;
                    }
                    thread::sleep((deadline - now).min(POLL_QUANTUM));
                }
                None => thread::sleep(POLL_QUANTUM),
            }
        }
    }

    fn advance_past(&self, idx: usize, len: usize) {
        let mut cursor = self.cursor.lock().unwrap();
        *cursor = (idx + 1) % len;
    }
}

impl Default for Waiter {
    fn default() -> Self {
        Waiter::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robin_fairness() {
        let events: Vec<Event> = (0..4).map(|_| Event::user_signalled()).collect();
        for e in &events {
            e.set();
        }
        let refs: Vec<&Event> = events.iter().collect();
        let waiter = Waiter::new();
        let mut seen = Vec::new();
        for _ in 0..events.len() {
            match waiter.wait(&refs, 0) {
                WaitOutcome::Ready(idx) => seen.push(idx),
                other => panic!("expected Ready, got {:?}", other),
            }
        }
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn timeout_when_nothing_signalled() {
        let event = Event::user_signalled();
        let waiter = Waiter::new();
        assert_eq!(waiter.wait(&[&event], 20), WaitOutcome::Timeout);
    }

    #[test]
    fn hangup_wakes_waiter() {
        let event = Event::file_readable();
        event.mark_hangup();
        let waiter = Waiter::new();
        assert_eq!(waiter.wait(&[&event], -1), WaitOutcome::Hangup(0));
    }

    #[test]
    fn reset_clears_signal() {
        let event = Event::user_signalled();
        event.set();
        assert!(event.is_signalled());
        event.reset();
        assert!(!event.is_signalled());
    }
}
