//! Requests and the hand-off to the system under test.
//!
//! This module provides the [`SutAdapter`] trait, the [`Request`] type the
//! workload modules produce, and two adapters: one that records batches in
//! memory and one that writes them out as JSON lines.

mod json_lines;
mod recording;

pub use json_lines::JsonLinesAdapter;
pub use recording::RecordingAdapter;

use alloy_primitives::U256;
use serde::{Serialize, Serializer};

/// Contract every marketplace request is addressed to.
pub const MARKETPLACE_CONTRACT: &str = "marketplace";

/// Opaque failure reported by a SUT adapter.
pub type SutError = Box<dyn std::error::Error + Send + Sync>;

/// Contract function invoked by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Verb {
    #[serde(rename = "calculateResult")]
    CalculateResult,
    #[serde(rename = "announce")]
    Announce,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::CalculateResult => "calculateResult",
            Verb::Announce => "announce",
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A positional request argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Arg {
    Uint(u64),
    Str(String),
    /// Token amount, serialized as a decimal string rather than a JSON
    /// number so values above `u64::MAX` survive. The digits are the amount
    /// verbatim; only the JSON type differs from a [`Arg::Uint`].
    Amount(#[serde(serialize_with = "serialize_decimal")] U256),
}

pub(crate) fn serialize_decimal<S: Serializer>(
    value: &U256,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

impl Arg {
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Arg::Uint(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<u64> for Arg {
    fn from(n: u64) -> Self {
        Arg::Uint(n)
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Str(s)
    }
}

impl From<U256> for Arg {
    fn from(amount: U256) -> Self {
        Arg::Amount(amount)
    }
}

/// One transaction's worth of arguments, consumed once by the adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub contract: &'static str,
    pub verb: Verb,
    pub args: Vec<Arg>,
    pub read_only: bool,
}

impl Request {
    /// Creates a state-changing request against the marketplace contract.
    pub fn marketplace(verb: Verb, args: Vec<Arg>) -> Self {
        Self {
            contract: MARKETPLACE_CONTRACT,
            verb,
            args,
            read_only: false,
        }
    }
}

/// Hand-off point between the workload modules and the system under test.
///
/// The adapter owns transport, retries and timeouts. Workload modules pass a
/// finished batch and do not interpret the outcome beyond forwarding an error.
///
/// # Implementing a New Adapter
///
/// ```
/// use marketplace_workload::{Request, SutAdapter, SutError};
///
/// #[derive(Default)]
/// struct CountingAdapter {
///     sent: usize,
/// }
///
/// impl SutAdapter for CountingAdapter {
///     fn send_requests(&mut self, batch: Vec<Request>) -> Result<(), SutError> {
///         self.sent += batch.len();
///         Ok(())
///     }
///
///     fn name(&self) -> &'static str {
///         "counting"
///     }
/// }
/// ```
pub trait SutAdapter {
    /// Forwards an ordered batch of requests to the system under test.
    fn send_requests(&mut self, batch: Vec<Request>) -> Result<(), SutError>;

    /// Returns a human-readable name for this adapter.
    fn name(&self) -> &'static str {
        "unknown"
    }
}

impl<S: SutAdapter + ?Sized> SutAdapter for &mut S {
    fn send_requests(&mut self, batch: Vec<Request>) -> Result<(), SutError> {
        (**self).send_requests(batch)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
