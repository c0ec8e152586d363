//! Error types for workload generation.

use crate::adapter::SutError;

pub type WorkloadResult<T> = Result<T, WorkloadError>;

#[derive(thiserror::Error, Debug)]
pub enum WorkloadError {
    /// A required round argument is absent or empty.
    #[error("the \"{0}\" round argument is missing")]
    MissingArgument(&'static str),

    #[error("worker index {worker_index} is out of range for {total_workers} workers")]
    WorkerIndexOutOfRange {
        worker_index: u32,
        total_workers: u32,
    },

    /// A random existing account was requested before any was generated.
    #[error("no accounts have been generated yet")]
    NoAccountsGenerated,

    #[error("failed to read round arguments: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse round arguments: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse round arguments: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SUT adapter rejected the batch: {0}")]
    Sut(#[source] SutError),
}
