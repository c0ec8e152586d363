//! Per-worker workload modules.
//!
//! Each benchmark worker owns exactly one workload module. A module is
//! initialized once with the worker's identity and the round arguments, then
//! asked repeatedly to build a batch and hand it to a [`SutAdapter`].

mod announce;
mod calculate_result;

pub use announce::{AnnounceArgs, AnnounceWorkload, MarketplaceState};
pub use calculate_result::{CalculateResultWorkload, RESULT_TIME_OFFSET_SECS};

use crate::{
    adapter::SutAdapter,
    error::{WorkloadError, WorkloadResult},
    WorkerPrefix,
};

/// Identity of a worker within a round, assigned by the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerContext {
    /// The 0-based index of this worker.
    pub worker_index: u32,
    /// The number of workers participating in the round.
    pub total_workers: u32,
    /// The 0-based index of the current round.
    pub round_index: u32,
}

impl WorkerContext {
    pub fn new(worker_index: u32, total_workers: u32, round_index: u32) -> Self {
        Self {
            worker_index,
            total_workers,
            round_index,
        }
    }

    /// Derives this worker's account key namespace.
    pub fn worker_prefix(&self) -> WorkloadResult<WorkerPrefix> {
        if self.worker_index >= self.total_workers {
            return Err(WorkloadError::WorkerIndexOutOfRange {
                worker_index: self.worker_index,
                total_workers: self.total_workers,
            });
        }
        Ok(WorkerPrefix::new(self.worker_index, self.total_workers))
    }
}

/// A workload driven by the benchmark harness.
///
/// Construction doubles as initialization: a module that exists has already
/// validated its round arguments, so no batch can be produced from an invalid
/// configuration.
pub trait WorkloadModule {
    /// Builds the next batch and hands it to the adapter.
    fn submit_transaction(&mut self, sut: &mut dyn SutAdapter) -> WorkloadResult<()>;

    /// Releases per-round resources. Called once after the last submission.
    fn cleanup(&mut self) {
        tracing::debug!(workload = self.name(), "Cleaning up workload module");
    }

    /// Returns a human-readable name for this workload.
    fn name(&self) -> &'static str {
        "unknown"
    }
}
