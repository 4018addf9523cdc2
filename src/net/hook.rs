//! # Hook Module
//!
//! A small multicast delegate list (`Hook<T>`, §4.5): every registered
//! callback runs in registration order each time the hook fires. Used by
//! [`Acceptor`](super::acceptor::Acceptor) to let callers observe connects,
//! disconnects, and inbound frames without subclassing anything.

/// An ordered list of callbacks, all invoked with the same argument when the
/// hook fires.
pub struct Hook<T> {
    delegates: Vec<Box<dyn Fn(&T) + Send + Sync>>,
}

impl<T> Hook<T> {
    pub fn new() -> Self {
        Hook { delegates: Vec::new() }
    }

    /// Registers a callback, appending it after any already registered.
    pub fn subscribe<F>(&mut self, delegate: F)
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.delegates.push(Box::new(delegate));
    }

    /// Removes every registered callback.
    pub fn clear(&mut self) {
        self.delegates.clear();
    }

    /// Invokes every registered callback with `event`, in registration
    /// order.
    pub fn fire(&self, event: &T) {
        for delegate in &self.delegates {
            delegate(event);
        }
    }
}

impl<T> Default for Hook<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::sync::Mutex;

    #[test]
    fn fires_every_delegate_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut hook = Hook::new();
        let o1 = Arc::clone(&order);
        hook.subscribe(move |_: &i32| o1.lock().unwrap().push(1));
        let o2 = Arc::clone(&order);
        hook.subscribe(move |_: &i32| o2.lock().unwrap().push(2));

        hook.fire(&42);
        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn fire_passes_the_event_through() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_in_hook = Arc::clone(&seen);
        let mut hook = Hook::new();
        hook.subscribe(move |value: &usize| seen_in_hook.store(*value, Ordering::Relaxed));
        hook.fire(&7);
        assert_eq!(seen.load(Ordering::Relaxed), 7);
    }

    #[test]
    fn clear_removes_every_delegate() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_in_hook = Arc::clone(&count);
        let mut hook = Hook::new();
        hook.subscribe(move |_: &()| {
            count_in_hook.fetch_add(1, Ordering::Relaxed);
        });
        hook.clear();
        hook.fire(&());
        assert_eq!(count.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn an_empty_hook_fires_without_panicking() {
        let hook: Hook<i32> = Hook::new();
        hook.fire(&1);
    }
}
