//! Fixed-size worker pool running boxed tasks on OS threads.
//!
//! Tasks go through an mpsc channel; idle workers take the next task, so at
//! most `capacity` tasks run at once and the rest wait in submission order.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::config::DEFAULT_MAX_WORKERS;

type Task = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, thiserror::Error)]
#[error("worker pool is shut down")]
pub struct PoolClosed;

pub struct WorkerPool {
    capacity: usize,
    tx: Mutex<Option<Sender<Task>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    active: Arc<AtomicUsize>,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WORKERS)
    }
}

impl WorkerPool {
    /// Start `capacity` workers (at least one).
    pub fn new(capacity: usize) -> Self {
        Self::spawn_with(capacity, |n, work| {
            thread::Builder::new()
                .name(format!("hlsconv-worker-{n}"))
                .spawn(work)
        })
    }

    /// Capacity is the number of workers that actually started. With none, the
    /// pool starts closed so submitters fail fast instead of queueing forever.
    fn spawn_with<S>(requested: usize, mut spawn: S) -> Self
    where
        S: FnMut(usize, Task) -> io::Result<JoinHandle<()>>,
    {
        let requested = requested.max(1);
        let (tx, rx) = mpsc::channel::<Task>();
        let rx = Arc::new(Mutex::new(rx));
        let active = Arc::new(AtomicUsize::new(0));
        let workers: Vec<JoinHandle<()>> = (0..requested)
            .filter_map(|n| {
                let rx = Arc::clone(&rx);
                let active = Arc::clone(&active);
                match spawn(n, Box::new(move || worker_loop(rx, active))) {
                    Ok(handle) => Some(handle),
                    Err(e) => {
                        tracing::error!("spawn worker thread: {}", e);
                        None
                    }
                }
            })
            .collect();
        if workers.len() < requested {
            tracing::warn!(requested, started = workers.len(), "worker pool started short");
        }
        let tx = if workers.is_empty() { None } else { Some(tx) };
        Self {
            capacity: workers.len(),
            tx: Mutex::new(tx),
            workers: Mutex::new(workers),
            active,
        }
    }

    /// Workers running; at most this many tasks execute at once.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tasks currently executing.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Schedule `task` on the next free worker. Safe to call from many threads.
    pub fn submit<F>(&self, task: F) -> Result<(), PoolClosed>
    where
        F: FnOnce() + Send + 'static,
    {
        let guard = self.tx.lock().unwrap_or_else(|p| p.into_inner());
        let tx = guard.as_ref().ok_or(PoolClosed)?;
        tx.send(Box::new(task)).map_err(|_| PoolClosed)
    }

    /// Stop accepting work, let queued tasks finish, and join the workers.
    pub fn shutdown(&self) {
        self.tx.lock().unwrap_or_else(|p| p.into_inner()).take();
        let workers = std::mem::take(&mut *self.workers.lock().unwrap_or_else(|p| p.into_inner()));
        for handle in workers {
            if handle.join().is_err() {
                tracing::warn!("worker thread panicked");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(rx: Arc<Mutex<Receiver<Task>>>, active: Arc<AtomicUsize>) {
    loop {
        let task = {
            let rx = rx.lock().unwrap_or_else(|p| p.into_inner());
            match rx.recv() {
                Ok(task) => task,
                Err(_) => break,
            }
        };
        active.fetch_add(1, Ordering::AcqRel);
        if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
            tracing::error!("pool task panicked");
        }
        active.fetch_sub(1, Ordering::AcqRel);
    }
}
