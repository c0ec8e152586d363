//! Workload generators for the marketplace benchmark.
//!
//! This crate produces the synthetic transaction arguments a benchmark worker
//! submits to a blockchain system under test (SUT): account keys, timestamps
//! and placeholder file hashes. Execution, transport and round scheduling are
//! owned by the harness; this crate only builds batches and hands them to a
//! [`SutAdapter`].
//!
//! # Architecture
//!
//! The crate is organized around three concepts:
//!
//! - **Account keys**: a base-26 alphabetic encoding of integer indices,
//!   namespaced per worker with a [`WorkerPrefix`]
//! - **Workload modules**: per-worker generators that turn counters, a clock
//!   and a random source into [`Request`] batches
//! - **Adapters**: the hand-off point to the SUT ([`SutAdapter`])
//!
//! # Quick Start
//!
//! ```
//! use marketplace_workload::{
//!     CalculateResultWorkload, FixedClock, RecordingAdapter, RoundArguments, WorkerContext,
//!     WorkloadModule,
//! };
//!
//! let args = RoundArguments {
//!     account_phase_prefix: Some("acct_".to_string()),
//!     txn_per_batch: Some(2),
//!     ..Default::default()
//! };
//!
//! let ctx = WorkerContext::new(0, 1, 0);
//! let clock = FixedClock::from_secs(1_700_000_000);
//! let mut workload = CalculateResultWorkload::initialize(ctx, &args, clock).unwrap();
//!
//! let mut sut = RecordingAdapter::default();
//! workload.submit_transaction(&mut sut).unwrap();
//!
//! assert_eq!(sut.requests().count(), 2);
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod workload;

pub use adapter::{Arg, JsonLinesAdapter, RecordingAdapter, Request, SutAdapter, SutError, Verb};
pub use config::RoundArguments;
pub use error::{WorkloadError, WorkloadResult};
pub use workload::{
    AnnounceArgs, AnnounceWorkload, CalculateResultWorkload, MarketplaceState, WorkerContext,
    WorkloadModule,
};

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

// ============================================================================
// Account Key Encoding
// ============================================================================

/// Digits of the account key encoding, lowest value first.
pub const ALPHABET: &[u8; 26] = b"abcdefghijklmnopqrstuvwxyz";

const RADIX: u128 = 26;

/// Encodes an index as a base-26 alphabetic string.
///
/// Digits are emitted least-significant first, so `encode(26) == "ab"`.
/// Zero encodes to the empty string. The encoding never ends with `'a'`,
/// which makes it injective over all non-negative integers.
pub fn encode(mut n: u128) -> String {
    let mut result = String::new();
    while n > 0 {
        result.push(ALPHABET[(n % RADIX) as usize] as char);
        n /= RADIX;
    }
    result
}

/// Encodes an index and pads it with zero digits (`'a'`) to at least `width`
/// characters. Padding lands in the most-significant positions, so the value
/// is unchanged.
pub fn encode_padded(n: u128, width: usize) -> String {
    let mut result = encode(n);
    while result.len() < width {
        result.push(ALPHABET[0] as char);
    }
    result
}

/// Decodes a string produced by [`encode`] or [`encode_padded`].
///
/// Returns `None` if the string contains characters outside [`ALPHABET`] or
/// the value does not fit in a `u128`.
pub fn decode(s: &str) -> Option<u128> {
    s.bytes().rev().try_fold(0u128, |acc, byte| {
        let digit = ALPHABET.iter().position(|&c| c == byte)? as u128;
        acc.checked_mul(RADIX)?.checked_add(digit)
    })
}

/// Namespace prepended to every account key minted by a worker.
///
/// All workers of a round get prefixes of the same width, so two prefixes are
/// never a proper prefix of one another and keys cannot collide across
/// workers. With a single worker the prefix is empty.
///
/// When `total_workers > 1` the keys are not interchangeable with the plain
/// `encode(worker_index)` prefix: worker 0 gets `"a"` rather than `""`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct WorkerPrefix(String);

impl WorkerPrefix {
    /// Derives the prefix of `worker_index` in a round of `total_workers`.
    pub fn new(worker_index: u32, total_workers: u32) -> Self {
        let width = encode(u128::from(total_workers.saturating_sub(1))).len();
        Self(encode_padded(u128::from(worker_index), width))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds the key of the account with the given index in this namespace.
    pub fn account_key(&self, index: u128) -> AccountKey {
        AccountKey(format!("{}{}", self.0, encode(index)))
    }
}

impl std::fmt::Display for WorkerPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Synthetic identifier of a simulated account on the SUT.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountKey(String);

impl AccountKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns this key with `phase_prefix` prepended.
    pub fn with_phase_prefix(&self, phase_prefix: &str) -> AccountKey {
        AccountKey(format!("{phase_prefix}{}", self.0))
    }
}

impl AsRef<str> for AccountKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<AccountKey> for String {
    fn from(key: AccountKey) -> Self {
        key.0
    }
}

// ============================================================================
// Clock & Randomness
// ============================================================================

/// Source of wall-clock time.
pub trait Clock {
    /// Time elapsed since the Unix epoch.
    fn since_epoch(&self) -> Duration;

    /// Current Unix time in seconds, rounded to the nearest second.
    fn unix_seconds(&self) -> u64 {
        let millis = self.since_epoch().as_millis();
        ((millis + 500) / 1000) as u64
    }
}

/// Clock backed by [`SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn since_epoch(&self) -> Duration {
        // A clock set before 1970 reads as the epoch.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
    }
}

/// Clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub Duration);

impl FixedClock {
    pub fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }
}

impl Clock for FixedClock {
    fn since_epoch(&self) -> Duration {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn since_epoch(&self) -> Duration {
        (**self).since_epoch()
    }
}

/// Characters a random token is drawn from.
pub const TOKEN_ALPHABET: &[u8; 62] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Length of the random token standing in for a file hash.
pub const FILE_HASH_TOKEN_LEN: usize = 64;

/// Generates a random alphanumeric token of `len` characters.
///
/// This is not a digest of anything; it only fills hash-shaped arguments.
pub fn random_token<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    #[test]
    fn test_encode_digits_least_significant_first() {
        assert_eq!(encode(0), "");
        assert_eq!(encode(1), "b");
        assert_eq!(encode(25), "z");
        assert_eq!(encode(26), "ab");
        assert_eq!(encode(27), "bb");
        assert_eq!(encode(26 * 26), "aab");
    }

    #[test]
    fn test_encode_decode_round_trip() {
        for n in (1..5_000u128).chain([u64::MAX as u128, u64::MAX as u128 + 1, u128::MAX]) {
            assert_eq!(decode(&encode(n)), Some(n), "round trip failed for {n}");
        }
        assert_eq!(decode(""), Some(0));
    }

    #[test]
    fn test_encode_is_injective() {
        let keys: HashSet<String> = (0..20_000u128).map(encode).collect();
        assert_eq!(keys.len(), 20_000);
    }

    #[test]
    fn test_decode_rejects_foreign_characters() {
        assert_eq!(decode("abC"), None);
        assert_eq!(decode("a1"), None);
    }

    #[test]
    fn test_encode_padded_preserves_value() {
        assert_eq!(encode_padded(0, 2), "aa");
        assert_eq!(encode_padded(1, 3), "baa");
        assert_eq!(encode_padded(26 * 26, 1), "aab");
        assert_eq!(decode(&encode_padded(123, 8)), Some(123));
    }

    #[test]
    fn test_single_worker_prefix_is_empty() {
        let prefix = WorkerPrefix::new(0, 1);
        assert_eq!(prefix.as_str(), "");
        assert_eq!(prefix.account_key(1).as_str(), "b");
    }

    #[test]
    fn test_worker_prefixes_share_width() {
        let prefixes: Vec<_> = (0..30).map(|w| WorkerPrefix::new(w, 30)).collect();
        assert!(prefixes.iter().all(|p| p.as_str().len() == 2));
        assert_eq!(prefixes[0].as_str(), "aa");
        assert_eq!(prefixes[27].as_str(), "bb");
    }

    #[test]
    fn test_plain_concatenation_is_ambiguous() {
        // Unpadded prefixes collide: worker 0 / index 27 and worker 1 / index 1.
        assert_eq!(encode(0) + &encode(27), encode(1) + &encode(1));

        let w0 = WorkerPrefix::new(0, 2);
        let w1 = WorkerPrefix::new(1, 2);
        assert_ne!(w0.account_key(27), w1.account_key(1));
    }

    #[test]
    fn test_prefixes_partition_key_space() {
        let total = 30;
        let mut seen = HashSet::new();
        for worker in 0..total {
            let prefix = WorkerPrefix::new(worker, total);
            for index in 0..800 {
                assert!(
                    seen.insert(prefix.account_key(index)),
                    "duplicate key for worker {worker}, index {index}"
                );
            }
        }
    }

    #[test]
    fn test_padded_prefix_differs_from_plain_encoding() {
        let prefix = WorkerPrefix::new(0, 2);
        assert_eq!(prefix.as_str(), "a");
        assert_ne!(prefix.as_str(), encode(0));
        assert_eq!(prefix.account_key(1).as_str(), "ab");

        // Workers other than 0 keep their plain encoding at full width.
        assert_eq!(WorkerPrefix::new(1, 2).as_str(), encode(1));
    }

    #[test]
    fn test_phase_prefix_is_prepended() {
        let key = WorkerPrefix::new(1, 2).account_key(26);
        assert_eq!(key.with_phase_prefix("acct_").as_str(), "acct_bab");
    }

    #[test]
    fn test_clock_rounds_to_nearest_second() {
        assert_eq!(FixedClock(Duration::from_millis(1_499)).unix_seconds(), 1);
        assert_eq!(FixedClock(Duration::from_millis(1_500)).unix_seconds(), 2);
        assert_eq!(FixedClock::from_secs(42).unix_seconds(), 42);
    }

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemClock.unix_seconds() > 1_577_836_800);
    }

    #[test]
    fn test_random_token_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let token = random_token(&mut rng, FILE_HASH_TOKEN_LEN);
        assert_eq!(token.len(), FILE_HASH_TOKEN_LEN);
        assert!(token.bytes().all(|b| TOKEN_ALPHABET.contains(&b)));

        // Same seed, same token.
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(random_token(&mut rng, FILE_HASH_TOKEN_LEN), token);

        assert_eq!(random_token(&mut rng, 0), "");
    }
}
