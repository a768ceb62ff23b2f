use thiserror::Error;
use wmiquery_core::QueryError;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The provider init closure failed on the worker thread.
    #[error("provider initialisation failed: {0}")]
    Init(String),

    /// The worker thread exited (or panicked) before answering.
    #[error("worker thread gone")]
    Gone,
}

impl From<WorkerError> for QueryError {
    fn from(e: WorkerError) -> Self {
        QueryError::Worker(e.to_string())
    }
}
