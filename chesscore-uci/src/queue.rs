//! Typed message queues: an
//! MPSC FIFO guarded by a mutex, with a manual-reset `Event` signalled
//! whenever the queue transitions from empty to non-empty.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::event::{Event, WaitOutcome, Waiter};

/// A FIFO of `T` that any number of producers can push onto; `dequeue`
/// blocks (optionally with a timeout) until an item is available.
pub struct MessageQueue<T> {
    items: Mutex<VecDeque<T>>,
    event: Event,
}

impl<T> MessageQueue<T> {
    pub fn new() -> MessageQueue<T> {
        MessageQueue {
            items: Mutex::new(VecDeque::new()),
            event: Event::user_signalled(),
        }
    }

    /// The event this queue keeps signalled while non-empty, for a
    /// `Waiter` to multiplex alongside other sources.
    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn enqueue(&self, item: T) {
        let mut items = self.items.lock().unwrap();
        let was_empty = items.is_empty();
        items.push_back(item);
        if was_empty {
            self.event.set();
        }
    }

    pub fn try_dequeue(&self) -> Option<T> {
        let mut items = self.items.lock().unwrap();
        let item = items.pop_front();
        if items.is_empty() {
            self.event.reset();
        }
        item
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Blocks (via a private single-event `Waiter`) until an item is
    /// available or `timeout_ms` elapses (`-1` = forever).
    pub fn dequeue(&self, timeout_ms: i64) -> Option<T> {
        loop {
            if let Some(item) = self.try_dequeue() {
                return Some(item);
            }
            let waiter = Waiter::new();
            match waiter.wait(&[&self.event], timeout_ms) {
                WaitOutcome::Ready(_) => continue,
                WaitOutcome::Timeout => return None,
                WaitOutcome::Hangup(_) => return None,
            }
        }
    }
}

impl<T> Default for MessageQueue<T> {
    fn default() -> Self {
        MessageQueue::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order_preserved() {
        let q: MessageQueue<i32> = MessageQueue::new();
        q.enqueue(1);
        q.enqueue(2);
        q.enqueue(3);
        assert_eq!(q.try_dequeue(), Some(1));
        assert_eq!(q.try_dequeue(), Some(2));
        assert_eq!(q.try_dequeue(), Some(3));
        assert_eq!(q.try_dequeue(), None);
    }

    #[test]
    fn event_tracks_emptiness() {
        let q: MessageQueue<i32> = MessageQueue::new();
        assert!(!q.event().is_signalled());
        q.enqueue(1);
        assert!(q.event().is_signalled());
        q.try_dequeue();
        assert!(!q.event().is_signalled());
    }

    #[test]
    fn dequeue_times_out_when_empty() {
        let q: MessageQueue<i32> = MessageQueue::new();
        assert_eq!(q.dequeue(20), None);
    }
}
