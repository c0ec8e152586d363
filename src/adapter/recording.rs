//! In-memory adapter.
//!
//! Keeps every submitted batch so callers can inspect exactly what a worker
//! would have sent to the system under test.

use super::{Request, SutAdapter, SutError};

/// Adapter that records batches instead of sending them anywhere.
///
/// # Example
///
/// ```
/// use marketplace_workload::{Arg, RecordingAdapter, Request, SutAdapter, Verb};
///
/// let mut sut = RecordingAdapter::default();
/// let request = Request::marketplace(Verb::CalculateResult, vec![Arg::Uint(0)]);
/// sut.send_requests(vec![request]).unwrap();
///
/// assert_eq!(sut.batches().len(), 1);
/// assert_eq!(sut.requests().count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingAdapter {
    batches: Vec<Vec<Request>>,
}

impl RecordingAdapter {
    /// Batches in submission order.
    pub fn batches(&self) -> &[Vec<Request>] {
        &self.batches
    }

    /// All recorded requests, flattened in submission order.
    pub fn requests(&self) -> impl Iterator<Item = &Request> {
        self.batches.iter().flatten()
    }

    pub fn into_requests(self) -> Vec<Request> {
        self.batches.into_iter().flatten().collect()
    }
}

impl SutAdapter for RecordingAdapter {
    fn send_requests(&mut self, batch: Vec<Request>) -> Result<(), SutError> {
        self.batches.push(batch);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
