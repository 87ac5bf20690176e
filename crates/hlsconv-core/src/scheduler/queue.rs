//! Thread-safe FIFO of pending job specs.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::job::JobSpec;

/// Cloning shares the same queue.
#[derive(Debug, Clone, Default)]
pub struct JobQueue {
    inner: Arc<Mutex<VecDeque<JobSpec>>>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<JobSpec>> {
        // A panic while holding the lock cannot leave the deque half-updated.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn enqueue(&self, spec: JobSpec) {
        self.lock().push_back(spec);
    }

    /// Pop the oldest spec, or `None` if the queue is empty. Never blocks.
    pub fn dequeue(&self) -> Option<JobSpec> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove every pending spec, returning how many were dropped.
    pub fn clear(&self) -> usize {
        let mut q = self.lock();
        let n = q.len();
        q.clear();
        n
    }
}
