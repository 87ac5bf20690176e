use std::io;

/// Rejections raised synchronously by batch submission, before any job starts.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// No job specs were supplied.
    #[error("no jobs in batch")]
    EmptyBatch,
    /// The previous batch has not reached Done yet.
    #[error("a batch is already in progress ({remaining} job(s) remaining)")]
    InProgress { remaining: usize },
    #[error("invalid output base name: {0:?}")]
    InvalidBaseName(String),
    #[error("output folder: {0}")]
    Io(#[from] io::Error),
}
