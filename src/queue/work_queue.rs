use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

#[derive(Debug)]
struct State<T> {
    items: VecDeque<T>,
    in_flight: usize,
}

/// Shared FIFO of work items with a join barrier.
///
/// An item taken with [`next`](WorkQueue::next) or
/// [`try_take`](WorkQueue::try_take) counts as in flight until
/// [`task_done`](WorkQueue::task_done) is called for it. A handler may
/// [`put`](WorkQueue::put) its item back before marking it done; the retry is
/// then pending before the original leaves flight, so [`join`](WorkQueue::join)
/// never observes a gap.
#[derive(Debug)]
pub struct WorkQueue<T> {
    state: Mutex<State<T>>,
    changed: Condvar,
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                items: VecDeque::new(),
                in_flight: 0,
            }),
            changed: Condvar::new(),
        }
    }

    /// Queue an item.
    pub fn put(&self, item: T) {
        self.state.lock().items.push_back(item);
        self.changed.notify_all();
    }

    /// Take the next item without waiting.
    pub fn try_take(&self) -> Option<T> {
        let mut state = self.state.lock();
        let item = state.items.pop_front()?;
        state.in_flight += 1;
        Some(item)
    }

    /// Take the next item, waiting while in-flight work may still requeue.
    ///
    /// Returns `None` once the queue is empty and nothing is in flight.
    pub fn next(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                state.in_flight += 1;
                return Some(item);
            }
            if state.in_flight == 0 {
                return None;
            }
            self.changed.wait(&mut state);
        }
    }

    /// Mark one taken item as finished.
    pub fn task_done(&self) {
        let mut state = self.state.lock();
        if state.in_flight == 0 {
            tracing::warn!("task_done called with no task in flight");
        } else {
            state.in_flight -= 1;
        }
        drop(state);
        self.changed.notify_all();
    }

    /// Block until every queued item has been taken and marked done.
    pub fn join(&self) {
        let mut state = self.state.lock();
        while !state.items.is_empty() || state.in_flight > 0 {
            self.changed.wait(&mut state);
        }
    }

    /// Items waiting to be taken.
    pub fn pending(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Items taken but not yet marked done.
    pub fn in_flight(&self) -> usize {
        self.state.lock().in_flight
    }
}
