//! Transaction building: validation, fee tier and nonce policy.
//!
//! # Responsibilities
//! - Validate a transfer intent against the last observed account state
//! - Pick the nonce (`state.nonce + 1`) and the fee tier
//! - Stamp a jittered timestamp so rapid repeats never produce identical payloads
//!
//! The builder is a pure transform: no network calls, no retries. A stale
//! account state yields a transaction the node rejects, which surfaces as a
//! submission error.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::blockchain::types::{
    AccountState, Address, Amount, WalletError, WalletResult, MICRO_PER_COIN,
};

/// Upper bound (exclusive) of the random offset added to timestamps, in seconds.
pub const MAX_TIMESTAMP_JITTER_SECS: f64 = 0.01;

/// Transfers at or above this amount use the higher fee tier.
pub const LARGE_TRANSFER_THRESHOLD: Amount = Amount::from_micro(1_000 * MICRO_PER_COIN);

/// What the user wants to send. Raw input; validated by [`TxBuilder`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionIntent {
    /// Destination address as entered.
    pub to: String,
    /// Amount in whole coins.
    pub amount: f64,
}

impl TransactionIntent {
    pub fn new(to: impl Into<String>, amount: f64) -> Self {
        Self {
            to: to.into(),
            amount,
        }
    }
}

/// Fee tier tag carried in the `ou` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeTier {
    /// `ou = "1"`, fee 0.001.
    Standard,
    /// `ou = "3"`, fee 0.003.
    Large,
}

impl FeeTier {
    pub fn for_amount(amount: Amount) -> Self {
        if amount < LARGE_TRANSFER_THRESHOLD {
            FeeTier::Standard
        } else {
            FeeTier::Large
        }
    }

    pub fn ou(self) -> &'static str {
        match self {
            FeeTier::Standard => "1",
            FeeTier::Large => "3",
        }
    }

    /// Expected fee for display. The node enforces the actual fee.
    pub fn fee(self) -> Amount {
        match self {
            FeeTier::Standard => Amount::from_micro(1_000),
            FeeTier::Large => Amount::from_micro(3_000),
        }
    }
}

impl Serialize for FeeTier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.ou())
    }
}

impl<'de> Deserialize<'de> for FeeTier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match String::deserialize(deserializer)?.as_str() {
            "1" => Ok(FeeTier::Standard),
            "3" => Ok(FeeTier::Large),
            other => Err(serde::de::Error::custom(format!("unknown fee tier '{}'", other))),
        }
    }
}

/// Fractional Unix seconds.
///
/// Encodes like the reference JSON encoder: integral values without a
/// fractional part, everything else in shortest round-trip form.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Timestamp(f64);

impl Timestamp {
    pub fn from_secs_f64(secs: f64) -> Self {
        Self(secs)
    }

    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();
        Self(secs)
    }

    /// Current time plus a random offset in `[0, MAX_TIMESTAMP_JITTER_SECS)`.
    pub fn now_with_jitter() -> Self {
        let jitter = rand::thread_rng().gen_range(0.0..MAX_TIMESTAMP_JITTER_SECS);
        Self(Self::now().0 + jitter)
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // 2^53: beyond this every f64 is integral and no longer exact as i64
        if self.0.fract() == 0.0 && self.0.abs() < 9_007_199_254_740_992.0 {
            serializer.serialize_i64(self.0 as i64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f64::deserialize(deserializer).map(Timestamp)
    }
}

/// Canonical unsigned transfer. Field order is part of the wire contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    pub from: Address,
    #[serde(rename = "to_")]
    pub to: Address,
    /// Micro-units, encoded as a decimal string.
    pub amount: Amount,
    pub nonce: u64,
    pub ou: FeeTier,
    pub timestamp: Timestamp,
}

/// Confirmation data shown before sending.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferPreview {
    pub to: Address,
    pub amount: Amount,
    pub fee: Amount,
    pub total: Amount,
    pub nonce: u64,
    pub tier: FeeTier,
}

/// Transaction builder bound to the sending address.
#[derive(Debug, Clone)]
pub struct TxBuilder {
    from: Address,
}

impl TxBuilder {
    pub fn new(from: Address) -> Self {
        Self { from }
    }

    pub fn from_address(&self) -> &Address {
        &self.from
    }

    /// Validate `intent` and produce the unsigned transaction, stamped now.
    pub fn build(
        &self,
        intent: &TransactionIntent,
        state: &AccountState,
    ) -> WalletResult<UnsignedTransaction> {
        self.build_at(intent, state, Timestamp::now_with_jitter())
    }

    /// Same as [`build`](Self::build) with an explicit timestamp.
    pub fn build_at(
        &self,
        intent: &TransactionIntent,
        state: &AccountState,
        timestamp: Timestamp,
    ) -> WalletResult<UnsignedTransaction> {
        let (to, amount) = validate_intent(intent, state)?;
        let nonce = next_nonce(state);
        let ou = FeeTier::for_amount(amount);

        tracing::debug!(
            from = %self.from,
            to = %to,
            amount = %amount,
            nonce = nonce,
            ou = ou.ou(),
            "Built transaction"
        );

        Ok(UnsignedTransaction {
            from: self.from.clone(),
            to,
            amount,
            nonce,
            ou,
            timestamp,
        })
    }

    /// Validate `intent` and compute what the confirmation step displays.
    pub fn preview(
        &self,
        intent: &TransactionIntent,
        state: &AccountState,
    ) -> WalletResult<TransferPreview> {
        let (to, amount) = validate_intent(intent, state)?;
        let tier = FeeTier::for_amount(amount);
        let fee = tier.fee();

        Ok(TransferPreview {
            to,
            amount,
            fee,
            total: amount.saturating_add(fee),
            nonce: next_nonce(state),
            tier,
        })
    }
}

fn next_nonce(state: &AccountState) -> u64 {
    state.nonce.saturating_add(1)
}

/// First failing check wins: address, then amount, then balance.
fn validate_intent(
    intent: &TransactionIntent,
    state: &AccountState,
) -> WalletResult<(Address, Amount)> {
    let to = Address::parse(&intent.to)?;
    let amount = Amount::from_coins(intent.amount)?;

    // Balance check is in coins as entered, before any micro-unit conversion.
    if !state.covers(intent.amount) {
        let micro = MICRO_PER_COIN as f64;
        return Err(WalletError::InsufficientBalance {
            have: Amount::from_micro((state.balance_coins * micro).floor() as u64),
            want: Amount::from_micro((intent.amount * micro).ceil() as u64),
        });
    }

    Ok((to, amount))
}
