//! Self-feeding work queue for the traversal pool.
//!
//! Workers both consume and produce tasks. Pushing never blocks, and the
//! in-flight counter (queued + being processed) tells idle workers when the
//! traversal is finished: queue empty and nothing in flight.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

pub struct Worklist<T> {
    state: Mutex<State<T>>,
    ready: Condvar,
}

struct State<T> {
    queue: VecDeque<T>,
    in_flight: usize,
}

/// A claimed task. Dropping it marks the task finished, after any tasks it
/// pushed have been counted.
pub struct Claimed<'a, T> {
    item: T,
    list: &'a Worklist<T>,
}

impl<T> Claimed<'_, T> {
    pub fn get(&self) -> &T {
        &self.item
    }
}

impl<T> Drop for Claimed<'_, T> {
    fn drop(&mut self) {
        self.list.finish();
    }
}

impl<T> Worklist<T> {
    pub fn new(initial: impl IntoIterator<Item = T>) -> Self {
        let queue: VecDeque<T> = initial.into_iter().collect();
        let in_flight = queue.len();
        Self {
            state: Mutex::new(State { queue, in_flight }),
            ready: Condvar::new(),
        }
    }

    pub fn push(&self, item: T) {
        let mut state = self.state.lock();
        state.in_flight += 1;
        state.queue.push_back(item);
        drop(state);
        self.ready.notify_one();
    }

    /// Block until a task is available. `None` once the traversal drained.
    pub fn next(&self) -> Option<Claimed<'_, T>> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.queue.pop_front() {
                return Some(Claimed { item, list: self });
            }
            if state.in_flight == 0 {
                return None;
            }
            self.ready.wait(&mut state);
        }
    }

    fn finish(&self) {
        let mut state = self.state.lock();
        state.in_flight -= 1;
        let drained = state.in_flight == 0;
        drop(state);
        if drained {
            self.ready.notify_all();
        }
    }
}
