//! Round arguments supplied by the benchmark configuration.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{WorkloadError, WorkloadResult};

/// Default number of transactions generated per submission.
pub const DEFAULT_TXN_PER_BATCH: usize = 1;

/// Default value of the commitment and money arguments of an announce.
pub const DEFAULT_INITIAL_MONEY: u64 = 10_000;

/// The user-provided arguments of a round.
///
/// Keys not listed here are ignored, since a benchmark file usually carries
/// arguments for several workload modules.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundArguments {
    /// Prefix shared by every account key minted during the round.
    #[serde(default)]
    pub account_phase_prefix: Option<String>,
    /// Transactions per submitted batch.
    #[serde(default)]
    pub txn_per_batch: Option<usize>,
    /// Commitment and money used by announce transactions.
    #[serde(default)]
    pub initial_money: Option<u64>,
    /// Number of accounts already created before the round starts.
    #[serde(default)]
    pub accounts: Option<u64>,
}

impl RoundArguments {
    /// Load the round arguments from a file in YAML format.
    pub fn load<P: AsRef<Path>>(path: P) -> WorkloadResult<Self> {
        let content = fs::read_to_string(&path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Parse the round arguments from a JSON object.
    pub fn from_json_str(content: &str) -> WorkloadResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Returns the account phase prefix, failing if it is absent or empty.
    pub fn require_account_phase_prefix(&self) -> WorkloadResult<&str> {
        match self.account_phase_prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => Ok(prefix),
            _ => Err(WorkloadError::MissingArgument("accountPhasePrefix")),
        }
    }

    /// Returns the batch size; absent or zero means [`DEFAULT_TXN_PER_BATCH`].
    pub fn txn_per_batch(&self) -> usize {
        match self.txn_per_batch {
            Some(n) if n > 0 => n,
            _ => DEFAULT_TXN_PER_BATCH,
        }
    }

    pub fn initial_money(&self) -> u64 {
        self.initial_money.unwrap_or(DEFAULT_INITIAL_MONEY)
    }

    pub fn accounts(&self) -> u64 {
        self.accounts.unwrap_or(0)
    }
}
