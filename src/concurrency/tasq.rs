//! # MPMC Task Queue Module
//!
//! `TasQ` (§4.3): a FIFO queue supporting blocking and non-blocking push and
//! pop, plus a `done` that drains waiters and makes subsequent pops observe
//! the drained state. Built on `crossbeam_channel`'s MPMC channel for the
//! lock-free receive side; the send side is gated by a mutex so `try_push`
//! can report "busy" under contention the same way the reference
//! implementation's `TryPush` did against its queue mutex.

use std::sync::Mutex;

use crossbeam_channel::{unbounded, Receiver, Sender};

/// A multi-producer, multi-consumer FIFO queue, bounded only by available
/// memory.
pub struct TasQ<T> {
    sender: Mutex<Option<Sender<T>>>,
    receiver: Receiver<T>,
}

impl<T> TasQ<T> {
    /// Creates an empty, not-yet-done queue.
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        TasQ {
            sender: Mutex::new(Some(sender)),
            receiver,
        }
    }

    /// Pushes `item`, blocking only as long as it takes to acquire the send
    /// lock. A no-op once [`done`](Self::done) has been called.
    pub fn push(&self, item: T) {
        if let Some(sender) = self.sender.lock().unwrap().as_ref() {
            let _ = sender.send(item);
        }
    }

    /// Pushes `item` iff the send side is immediately available and the
    /// queue isn't done. Returns `item` back, without blocking, otherwise —
    /// so a caller trying several queues in turn can move on to the next
    /// one without cloning.
    pub fn try_push(&self, item: T) -> Result<(), T> {
        match self.sender.try_lock() {
            Ok(guard) => match guard.as_ref() {
                Some(sender) => sender.send(item).map_err(|e| e.into_inner()),
                None => Err(item),
            },
            Err(_) => Err(item),
        }
    }

    /// Blocks until an element is available or the queue is marked done and
    /// drained, in which case it returns `None`.
    pub fn pop(&self) -> Option<T> {
        self.receiver.recv().ok()
    }

    /// Returns an element if one is immediately available, without
    /// blocking.
    pub fn try_pop(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// Marks the queue done: already-buffered elements are still delivered,
    /// but once drained every blocking and non-blocking pop returns `None`
    /// and every push becomes a no-op.
    pub fn done(&self) {
        self.sender.lock().unwrap().take();
    }
}

impl<T> Default for TasQ<T> {
    fn default() -> Self {
        Self::new()
    }
}
