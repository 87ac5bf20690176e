//! Bounded-concurrency execution for bulk mode.
//!
//! `JobQueue` holds pending specs in submission order; `WorkerPool` runs
//! submitted tasks on at most N worker threads.

mod pool;
mod queue;

pub use pool::WorkerPool;
pub use queue::JobQueue;
