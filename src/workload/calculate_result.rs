//! Workload that asks the marketplace to settle results.
//!
//! Every transaction carries a per-worker transaction index and a deadline a
//! fixed offset into the future.

use crate::{
    adapter::{Arg, Request, SutAdapter, Verb},
    config::RoundArguments,
    error::{WorkloadError, WorkloadResult},
    AccountKey, Clock, SystemClock, WorkerPrefix,
};

use super::{WorkerContext, WorkloadModule};

/// Seconds added to the current time to form the result timestamp.
pub const RESULT_TIME_OFFSET_SECS: u64 = 1500;

/// Generates `calculateResult` transactions.
///
/// # Example
///
/// ```
/// use marketplace_workload::{CalculateResultWorkload, FixedClock, RoundArguments, WorkerContext};
///
/// let args = RoundArguments {
///     account_phase_prefix: Some("acct_".to_string()),
///     ..Default::default()
/// };
/// let clock = FixedClock::from_secs(1_000);
/// let mut workload =
///     CalculateResultWorkload::initialize(WorkerContext::new(0, 1, 0), &args, clock).unwrap();
///
/// let batch = workload.generate_batch(2);
/// assert_eq!(batch[0].args[0].as_uint(), Some(0));
/// assert_eq!(batch[1].args[1].as_uint(), Some(2_500));
/// ```
#[derive(Debug, Clone)]
pub struct CalculateResultWorkload<C = SystemClock> {
    ctx: WorkerContext,
    phase_prefix: String,
    worker_prefix: WorkerPrefix,
    txn_per_batch: usize,
    clock: C,
    /// Index the next transaction will use.
    next_tx_index: u64,
}

impl<C: Clock> CalculateResultWorkload<C> {
    /// Validates the round arguments and derives the worker prefix.
    ///
    /// Fails if `accountPhasePrefix` is absent or empty, or if the worker
    /// index is outside the round.
    pub fn initialize(
        ctx: WorkerContext,
        args: &RoundArguments,
        clock: C,
    ) -> WorkloadResult<Self> {
        let phase_prefix = args.require_account_phase_prefix()?.to_string();
        let worker_prefix = ctx.worker_prefix()?;
        let txn_per_batch = args.txn_per_batch();

        tracing::info!(
            worker = ctx.worker_index,
            round = ctx.round_index,
            prefix = %worker_prefix,
            txn_per_batch,
            "Initialized calculateResult workload"
        );

        Ok(Self {
            ctx,
            phase_prefix,
            worker_prefix,
            txn_per_batch,
            clock,
            next_tx_index: 0,
        })
    }

    /// Index of the most recent transaction, `None` before the first one.
    pub fn last_tx_index(&self) -> Option<u64> {
        self.next_tx_index.checked_sub(1)
    }

    pub fn txn_per_batch(&self) -> usize {
        self.txn_per_batch
    }

    /// Account key of the transaction with the given index.
    pub fn account_key(&self, tx_index: u64) -> AccountKey {
        self.worker_prefix
            .account_key(u128::from(tx_index) + 1)
            .with_phase_prefix(&self.phase_prefix)
    }

    /// Generates `count` requests, advancing the transaction index once per request.
    pub fn generate_batch(&mut self, count: usize) -> Vec<Request> {
        let mut batch = Vec::with_capacity(count);
        for _ in 0..count {
            let tx_index = self.next_tx_index;
            self.next_tx_index += 1;

            let account = self.account_key(tx_index);
            tracing::trace!(
                worker = self.ctx.worker_index,
                tx_index,
                %account,
                "Derived account key"
            );

            let timestamp = self.clock.unix_seconds() + RESULT_TIME_OFFSET_SECS;
            batch.push(Request::marketplace(
                Verb::CalculateResult,
                vec![Arg::Uint(tx_index), Arg::Uint(timestamp)],
            ));
        }
        batch
    }
}

impl<C: Clock> WorkloadModule for CalculateResultWorkload<C> {
    fn submit_transaction(&mut self, sut: &mut dyn SutAdapter) -> WorkloadResult<()> {
        let batch = self.generate_batch(self.txn_per_batch);
        tracing::debug!(
            worker = self.ctx.worker_index,
            adapter = sut.name(),
            size = batch.len(),
            "Submitting calculateResult batch"
        );
        sut.send_requests(batch).map_err(WorkloadError::Sut)
    }

    fn name(&self) -> &'static str {
        "calculateResult"
    }
}
