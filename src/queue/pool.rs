use super::WorkQueue;
use anyhow::{Context, Result};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Totals of one pool run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Items handed to the handler, retries included.
    pub handled: usize,
    /// Handler invocations that panicked.
    pub panicked: usize,
}

/// Fixed number of named OS threads draining a [`WorkQueue`].
#[derive(Debug, Clone)]
pub struct WorkerPool {
    name: String,
    workers: usize,
}

impl WorkerPool {
    pub fn new(name: impl Into<String>, workers: usize) -> Self {
        Self {
            name: name.into(),
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `handler` on every item until the queue drains, then join.
    ///
    /// The handler receives the queue so it can requeue its item. Each item
    /// is marked done after the handler returns, even if it panicked.
    pub fn run<T, F>(&self, queue: &WorkQueue<T>, handler: F) -> Result<PoolStats>
    where
        T: Send,
        F: Fn(T, &WorkQueue<T>) + Sync,
    {
        let handled = AtomicUsize::new(0);
        let panicked = AtomicUsize::new(0);

        tracing::debug!(pool = %self.name, workers = self.workers, pending = queue.pending(), "starting workers");

        std::thread::scope(|scope| -> Result<()> {
            let mut handles = Vec::with_capacity(self.workers);
            for i in 0..self.workers {
                let worker = format!("{}-{}", self.name, i);
                let (handler, handled, panicked) = (&handler, &handled, &panicked);
                let handle = std::thread::Builder::new()
                    .name(worker.clone())
                    .spawn_scoped(scope, move || {
                        while let Some(item) = queue.next() {
                            handled.fetch_add(1, Ordering::Relaxed);
                            if catch_unwind(AssertUnwindSafe(|| handler(item, queue))).is_err() {
                                panicked.fetch_add(1, Ordering::Relaxed);
                                tracing::error!(worker = %worker, "task panicked");
                            }
                            queue.task_done();
                        }
                    })
                    .with_context(|| format!("Failed to spawn worker {}-{}", self.name, i))?;
                handles.push(handle);
            }

            queue.join();
            for handle in handles {
                if handle.join().is_err() {
                    anyhow::bail!("Worker thread of pool {} panicked", self.name);
                }
            }
            Ok(())
        })?;

        let stats = PoolStats {
            handled: handled.into_inner(),
            panicked: panicked.into_inner(),
        };
        tracing::debug!(pool = %self.name, handled = stats.handled, panicked = stats.panicked, "workers finished");
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashSet;

    #[test]
    fn test_every_item_handled_once() {
        let queue = WorkQueue::new();
        for i in 0..200 {
            queue.put(i);
        }
        let seen = Mutex::new(Vec::new());

        let stats = WorkerPool::new("test", 8)
            .run(&queue, |item, _| seen.lock().push(item))
            .unwrap();

        let seen = seen.into_inner();
        assert_eq!(stats.handled, 200);
        assert_eq!(seen.len(), 200);
        assert_eq!(seen.iter().collect::<HashSet<_>>().len(), 200);
        assert_eq!(queue.in_flight(), 0);
    }

    #[test]
    fn test_panicking_task_is_marked_done() {
        let queue = WorkQueue::new();
        for i in 0..10 {
            queue.put(i);
        }
        let done = AtomicUsize::new(0);

        let stats = WorkerPool::new("panicky", 3)
            .run(&queue, |item, _| {
                if item % 4 == 0 {
                    panic!("bad item {item}");
                }
                done.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        assert_eq!(stats.panicked, 3);
        assert_eq!(done.load(Ordering::SeqCst), 7);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_requeued_items_are_retried() {
        let queue = WorkQueue::new();
        for i in 0..5 {
            queue.put((i, 0u32));
        }
        let finished = Mutex::new(Vec::new());

        let stats = WorkerPool::new("retry", 2)
            .run(&queue, |(id, attempt), q| {
                if attempt < 2 {
                    q.put((id, attempt + 1));
                } else {
                    finished.lock().push(id);
                }
            })
            .unwrap();

        assert_eq!(stats.handled, 15);
        assert_eq!(finished.into_inner().len(), 5);
    }

    #[test]
    fn test_zero_workers_rounds_up() {
        assert_eq!(WorkerPool::new("x", 0).workers(), 1);
    }
}
