//! # Work-Stealing Pool Module
//!
//! *N* workers, each with its own [`TasQ`], used by both the update daemon
//! and (per §4.3) anything else wanting the same producer/consumer shape.
//! A producer spreads work across queues by round-robin `try_push`, falling
//! back to a blocking push on its own cursor's home queue; each worker
//! tries every queue starting at its own index before blocking on its own.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::concurrency::tasq::TasQ;
use crate::concurrency::worker::StoppableWorker;

/// How many candidate queues a producer tries with `try_push` before
/// falling back to a blocking push on its own queue (§4.3).
const PUSH_ROUNDS: usize = 3;

/// A fixed-size pool of workers sharing *N* queues, where *N* equals the
/// number of workers. Dropping the pool stops every worker after they
/// finish draining their own queue.
pub struct WorkStealingPool<T> {
    queues: Vec<Arc<TasQ<T>>>,
    workers: Vec<StoppableWorker>,
    cursor: AtomicUsize,
}

impl<T: Send + 'static> WorkStealingPool<T> {
    /// Spawns `num_workers` workers, each running `handle` over whatever
    /// items it receives. `num_workers` is typically `num_cpus::get()`.
    pub fn new<F>(num_workers: usize, handle: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let num_workers = num_workers.max(1);
        let queues: Vec<Arc<TasQ<T>>> = (0..num_workers).map(|_| Arc::new(TasQ::new())).collect();
        let handle = Arc::new(handle);

        let workers = (0..num_workers)
            .map(|id| {
                let queues = queues.clone();
                let handle = Arc::clone(&handle);
                StoppableWorker::start(move |stop| loop {
                    if let Some(item) = steal(&queues, id) {
                        handle(item);
                        continue;
                    }
                    if stop.requested() {
                        break;
                    }
                    if let Some(item) = queues[id].pop() {
                        handle(item);
                    }
                    // `pop` returning `None` just means our own queue is
                    // done and drained; other queues may still have work,
                    // so loop back around to `steal` rather than exiting.
                })
            })
            .collect();

        WorkStealingPool {
            queues,
            workers,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Submits one item of work, spreading load across queues per §4.3.
    pub fn submit(&self, item: T) {
        let n = self.queues.len();
        let start = self.cursor.fetch_add(1, Ordering::Relaxed) % n;

        let mut item = item;
        for offset in 0..PUSH_ROUNDS * n {
            let idx = (start + offset) % n;
            match self.queues[idx].try_push(item) {
                Ok(()) => return,
                Err(returned) => item = returned,
            }
        }

        self.queues[start].push(item);
    }

    /// Number of workers (and queues) in the pool.
    pub fn len(&self) -> usize {
        self.workers.len()
    }
}

/// Tries every queue starting at `start`, wrapping around, before giving up.
fn steal<T>(queues: &[Arc<TasQ<T>>], start: usize) -> Option<T> {
    let n = queues.len();
    for offset in 0..n {
        let idx = (start + offset) % n;
        if let Some(item) = queues[idx].try_pop() {
            return Some(item);
        }
    }
    None
}

impl<T> Drop for WorkStealingPool<T> {
    fn drop(&mut self) {
        for queue in &self.queues {
            queue.done();
        }
        for worker in &mut self.workers {
            worker.stop();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::AtomicUsize as Counter;
    use std::sync::Mutex;
    use std::time::Duration;

    #[test]
    fn every_submitted_item_gets_handled() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_pool = Arc::clone(&seen);
        let pool = WorkStealingPool::new(4, move |item: usize| {
            seen_in_pool.lock().unwrap().push(item);
        });

        for i in 0..50 {
            pool.submit(i);
        }

        // Give the workers a moment to drain; the pool's Drop will also
        // force a full drain before returning.
        std::thread::sleep(Duration::from_millis(50));
        drop(pool);

        let mut got = seen.lock().unwrap().clone();
        got.sort_unstable();
        assert_eq!(got, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn pool_size_matches_worker_count() {
        let pool = WorkStealingPool::new(3, |_: usize| {});
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn zero_requested_workers_still_yields_one() {
        let counter = Arc::new(Counter::new(0));
        let counter_in_pool = Arc::clone(&counter);
        let pool = WorkStealingPool::new(0, move |_: usize| {
            counter_in_pool.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(pool.len(), 1);
        pool.submit(1);
        std::thread::sleep(Duration::from_millis(20));
        drop(pool);
        assert_eq!(counter.load(Ordering::Relaxed), 1);
    }
}
