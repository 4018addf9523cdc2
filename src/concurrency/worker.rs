//! # Stoppable Worker Module
//!
//! A long-running worker thread whose body polls a shared stop flag rather
//! than being killed out from under it (§4.3). Re-architects the reference
//! implementation's promise/future "daemon thread" as an `Arc<AtomicBool>`
//! plus a `JoinHandle`, with the body supplied as an owned closure instead
//! of an overridden virtual method.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Handle a worker's body uses to check whether it has been asked to stop.
/// Cheap to clone; every clone observes the same underlying flag.
#[derive(Clone)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    /// `true` once the owning [`StoppableWorker`] has called `stop`.
    pub fn requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A worker thread that can be asked to stop and joined. `stop()` is
/// idempotent; calling it more than once, or on a worker that already
/// stopped, is a no-op.
pub struct StoppableWorker {
    flag: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl StoppableWorker {
    /// Spawns a thread running `body(token)`. `body` is responsible for
    /// polling `token.requested()` on its own schedule and returning once it
    /// sees it set.
    pub fn start<F>(body: F) -> Self
    where
        F: FnOnce(StopToken) + Send + 'static,
    {
        let flag = Arc::new(AtomicBool::new(false));
        let token = StopToken(Arc::clone(&flag));
        let handle = thread::spawn(move || body(token));
        StoppableWorker {
            flag,
            handle: Some(handle),
        }
    }

    /// `true` iff `stop` has been called on this worker.
    pub fn stop_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Sets the stop flag and joins the thread. Idempotent.
    pub fn stop(&mut self) {
        self.flag.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for StoppableWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
