//! Marketplace announce workload and the account state behind it.

use alloy_primitives::U256;
use rand::{rngs::StdRng, Rng};
use serde::Serialize;

use crate::{
    adapter::{serialize_decimal, Arg, Request, SutAdapter, Verb},
    config::RoundArguments,
    error::{WorkloadError, WorkloadResult},
    random_token, AccountKey, Clock, SystemClock, WorkerPrefix, FILE_HASH_TOKEN_LEN,
};

use super::{WorkerContext, WorkloadModule};

/// Arguments of a single announce transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnounceArgs {
    /// Random placeholder token, not a digest.
    pub file_hash: String,
    pub timestamp: u64,
    #[serde(serialize_with = "serialize_decimal")]
    pub commitment: U256,
    pub manager: AccountKey,
    #[serde(serialize_with = "serialize_decimal")]
    pub money: U256,
}

impl AnnounceArgs {
    /// Positional arguments in contract order.
    pub fn into_args(self) -> Vec<Arg> {
        vec![
            Arg::Str(self.file_hash),
            Arg::Uint(self.timestamp),
            Arg::Amount(self.commitment),
            Arg::Str(self.manager.into()),
            Arg::Amount(self.money),
        ]
    }
}

/// Tracks the accounts a worker has announced.
///
/// Account `n` of a worker is keyed `prefix + encode(n)`, with `n` starting
/// at 1, so the keys of every generated account can be rebuilt from the count
/// alone.
#[derive(Debug, Clone)]
pub struct MarketplaceState<R = StdRng, C = SystemClock> {
    accounts_generated: u64,
    initial_money: U256,
    worker_prefix: WorkerPrefix,
    rng: R,
    clock: C,
}

impl<R: Rng, C: Clock> MarketplaceState<R, C> {
    /// Creates the state of a worker that has already generated `accounts` accounts.
    pub fn new(
        worker_prefix: WorkerPrefix,
        initial_money: U256,
        accounts: u64,
        rng: R,
        clock: C,
    ) -> Self {
        Self {
            accounts_generated: accounts,
            initial_money,
            worker_prefix,
            rng,
            clock,
        }
    }

    pub fn accounts_generated(&self) -> u64 {
        self.accounts_generated
    }

    pub fn initial_money(&self) -> U256 {
        self.initial_money
    }

    /// Key of the account with the given 1-based index.
    pub fn account_key(&self, index: u64) -> AccountKey {
        self.worker_prefix.account_key(u128::from(index))
    }

    /// Key of a uniformly chosen account in `1..=accounts_generated`.
    pub fn random_existing_account(&mut self) -> WorkloadResult<AccountKey> {
        if self.accounts_generated == 0 {
            return Err(WorkloadError::NoAccountsGenerated);
        }
        let index = self.rng.gen_range(1..=self.accounts_generated);
        Ok(self.account_key(index))
    }

    /// Mints the next account and returns the arguments announcing it.
    pub fn next_announce_args(&mut self) -> AnnounceArgs {
        self.accounts_generated += 1;
        AnnounceArgs {
            file_hash: random_token(&mut self.rng, FILE_HASH_TOKEN_LEN),
            timestamp: self.clock.unix_seconds(),
            commitment: self.initial_money,
            manager: self.account_key(self.accounts_generated),
            money: self.initial_money,
        }
    }
}

/// Generates `announce` transactions, one new manager account per request.
#[derive(Debug, Clone)]
pub struct AnnounceWorkload<R = StdRng, C = SystemClock> {
    ctx: WorkerContext,
    state: MarketplaceState<R, C>,
    txn_per_batch: usize,
}

impl<R: Rng, C: Clock> AnnounceWorkload<R, C> {
    /// Builds the worker's state from `initialMoney` and `accounts`.
    pub fn initialize(
        ctx: WorkerContext,
        args: &RoundArguments,
        rng: R,
        clock: C,
    ) -> WorkloadResult<Self> {
        let worker_prefix = ctx.worker_prefix()?;
        let txn_per_batch = args.txn_per_batch();

        tracing::info!(
            worker = ctx.worker_index,
            round = ctx.round_index,
            prefix = %worker_prefix,
            accounts = args.accounts(),
            txn_per_batch,
            "Initialized announce workload"
        );

        let state = MarketplaceState::new(
            worker_prefix,
            U256::from(args.initial_money()),
            args.accounts(),
            rng,
            clock,
        );
        Ok(Self {
            ctx,
            state,
            txn_per_batch,
        })
    }

    pub fn state(&self) -> &MarketplaceState<R, C> {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut MarketplaceState<R, C> {
        &mut self.state
    }

    pub fn generate_batch(&mut self, count: usize) -> Vec<Request> {
        (0..count)
            .map(|_| {
                let args = self.state.next_announce_args();
                tracing::trace!(
                    worker = self.ctx.worker_index,
                    manager = %args.manager,
                    "Announcing account"
                );
                Request::marketplace(Verb::Announce, args.into_args())
            })
            .collect()
    }
}

impl<R: Rng, C: Clock> WorkloadModule for AnnounceWorkload<R, C> {
    fn submit_transaction(&mut self, sut: &mut dyn SutAdapter) -> WorkloadResult<()> {
        let batch = self.generate_batch(self.txn_per_batch);
        tracing::debug!(
            worker = self.ctx.worker_index,
            adapter = sut.name(),
            size = batch.len(),
            accounts = self.state.accounts_generated(),
            "Submitting announce batch"
        );
        sut.send_requests(batch).map_err(WorkloadError::Sut)
    }

    fn name(&self) -> &'static str {
        "announce"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decode, FixedClock, RecordingAdapter, TOKEN_ALPHABET};
    use rand::SeedableRng;
    use std::collections::HashSet;

    const NOW: u64 = 1_700_000_000;

    fn state(prefix: WorkerPrefix, accounts: u64) -> MarketplaceState<StdRng, FixedClock> {
        MarketplaceState::new(
            prefix,
            U256::from(500u64),
            accounts,
            StdRng::seed_from_u64(42),
            FixedClock::from_secs(NOW),
        )
    }

    #[test]
    fn test_announce_args() {
        let mut state = state(WorkerPrefix::new(1, 2), 0);
        let args = state.next_announce_args();

        assert_eq!(state.accounts_generated(), 1);
        assert_eq!(args.manager.as_str(), "bb");
        assert_eq!(args.timestamp, NOW);
        assert_eq!(args.commitment, U256::from(500u64));
        assert_eq!(args.money, args.commitment);
        assert_eq!(args.file_hash.len(), FILE_HASH_TOKEN_LEN);
        assert!(args.file_hash.bytes().all(|b| TOKEN_ALPHABET.contains(&b)));

        let next = state.next_announce_args();
        assert_eq!(next.manager.as_str(), "bc");
        assert_ne!(next.file_hash, args.file_hash);
    }

    #[test]
    fn test_announce_continues_from_existing_accounts() {
        let mut state = state(WorkerPrefix::new(0, 1), 25);
        assert_eq!(state.next_announce_args().manager.as_str(), "ab");
        assert_eq!(state.accounts_generated(), 26);
    }

    #[test]
    fn test_random_account_requires_generated_accounts() {
        let mut state = state(WorkerPrefix::new(0, 1), 0);
        assert!(matches!(
            state.random_existing_account(),
            Err(WorkloadError::NoAccountsGenerated)
        ));
    }

    #[test]
    fn test_random_account_stays_in_range() {
        let mut state = state(WorkerPrefix::new(0, 1), 0);
        for _ in 0..3 {
            state.next_announce_args();
        }

        let picked: HashSet<u128> = (0..200)
            .map(|_| decode(state.random_existing_account().unwrap().as_str()).unwrap())
            .collect();
        assert_eq!(picked, HashSet::from([1, 2, 3]));
    }

    #[test]
    fn test_announce_args_json() {
        let mut state = state(WorkerPrefix::new(0, 1), 0);
        let json = serde_json::to_value(state.next_announce_args()).unwrap();
        assert_eq!(json["manager"], "b");
        assert_eq!(json["commitment"], "500");
        assert_eq!(json["money"], "500");
        assert_eq!(json["timestamp"], NOW);
        assert!(json["fileHash"].is_string());
    }

    #[test]
    fn test_initial_money_is_sent_verbatim() {
        let args = RoundArguments {
            initial_money: Some(u64::MAX),
            ..Default::default()
        };
        let mut workload = AnnounceWorkload::initialize(
            WorkerContext::new(0, 1, 0),
            &args,
            StdRng::seed_from_u64(3),
            FixedClock::from_secs(NOW),
        )
        .unwrap();

        let request = workload.generate_batch(1).remove(0);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["args"][2], u64::MAX.to_string());
        assert_eq!(json["args"][4], u64::MAX.to_string());
        assert_eq!(json["args"][3], "b");
    }

    #[test]
    fn test_workload_submits_announce_requests() {
        let args = RoundArguments {
            txn_per_batch: Some(3),
            initial_money: Some(750),
            ..Default::default()
        };
        let mut workload = AnnounceWorkload::initialize(
            WorkerContext::new(0, 1, 0),
            &args,
            StdRng::seed_from_u64(1),
            FixedClock::from_secs(NOW),
        )
        .unwrap();

        let mut sut = RecordingAdapter::default();
        workload.submit_transaction(&mut sut).unwrap();
        workload.submit_transaction(&mut sut).unwrap();

        assert_eq!(workload.state().accounts_generated(), 6);
        let requests = sut.into_requests();
        assert_eq!(requests.len(), 6);
        for (i, request) in requests.iter().enumerate() {
            assert_eq!(request.verb, Verb::Announce);
            assert_eq!(request.args.len(), 5);
            assert_eq!(request.args[1].as_uint(), Some(NOW));
            assert_eq!(request.args[2], Arg::Amount(U256::from(750u64)));
            assert_eq!(
                decode(request.args[3].as_str().unwrap()),
                Some(i as u128 + 1)
            );
        }
    }

    #[test]
    fn test_workers_mint_disjoint_managers() {
        let total = 3;
        let mut managers = HashSet::new();
        for worker in 0..total {
            let mut workload = AnnounceWorkload::initialize(
                WorkerContext::new(worker, total, 0),
                &RoundArguments::default(),
                StdRng::seed_from_u64(u64::from(worker)),
                FixedClock::from_secs(NOW),
            )
            .unwrap();
            for request in workload.generate_batch(100) {
                let manager = request.args[3].as_str().unwrap().to_string();
                assert!(managers.insert(manager), "worker {worker} reused a key");
            }
        }
        assert_eq!(managers.len(), 300);
    }
}
