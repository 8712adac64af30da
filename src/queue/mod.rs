//! Work queue, worker pool and the shared state workers report into.

mod pool;
mod work_queue;

pub use pool::{PoolStats, WorkerPool};
pub use work_queue::WorkQueue;

use parking_lot::Mutex;

/// Completion counter shared by the workers of a phase.
#[derive(Debug, Default)]
pub struct Counter {
    value: Mutex<u64>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&self) {
        *self.value.lock() = 0;
    }

    /// Add one and return the new value.
    pub fn increment(&self) -> u64 {
        let mut value = self.value.lock();
        *value += 1;
        *value
    }

    pub fn get(&self) -> u64 {
        *self.value.lock()
    }
}

/// Collects the terminal outcome of every item.
#[derive(Debug)]
pub struct ResultSink<R> {
    results: Mutex<Vec<R>>,
}

impl<R> Default for ResultSink<R> {
    fn default() -> Self {
        Self {
            results: Mutex::new(Vec::new()),
        }
    }
}

impl<R> ResultSink<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, result: R) {
        self.results.lock().push(result);
    }

    pub fn len(&self) -> usize {
        self.results.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_inner(self) -> Vec<R> {
        self.results.into_inner()
    }
}
