//! Ledger read-side types: node payloads and the reconciled history record.

use serde::{Deserialize, Serialize};

use crate::blockchain::types::lenient;

/// Entry of `recent_transactions` in `GET /address/{address}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReference {
    pub hash: String,
    #[serde(default)]
    pub epoch: Option<u64>,
}

impl TransactionReference {
    pub fn new(hash: impl Into<String>, epoch: Option<u64>) -> Self {
        Self {
            hash: hash.into(),
            epoch,
        }
    }
}

/// `parsed_tx` of `GET /tx/{hash}`. Untrusted: addresses are kept as raw text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParsedTransaction {
    pub from: String,
    pub to: String,
    /// Either a decimal coin string or an integer micro-unit string.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub amount: Option<String>,
    /// Integer micro-units when the node provides them.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub amount_raw: Option<String>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub nonce: u64,
    /// Fractional Unix seconds.
    #[serde(deserialize_with = "lenient::f64")]
    pub timestamp: f64,
}

/// Body of `GET /tx/{hash}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionDetail {
    pub parsed_tx: ParsedTransaction,
}

/// Direction of a transfer relative to the owned address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

/// One reconciled history entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    pub hash: String,
    /// Whole coins.
    pub amount: f64,
    /// Sender for incoming transfers, recipient for outgoing ones.
    pub counterparty: String,
    pub direction: Direction,
    pub nonce: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epoch: Option<u64>,
    /// Milliseconds since the Unix epoch.
    pub time_ms: i64,
}

/// Reconciled history plus how many detail fetches were dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    pub records: Vec<TransactionRecord>,
    pub dropped: usize,
}
