//! Chain-specific types and error definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Prefix carried by every address.
pub const ADDRESS_PREFIX: &str = "oct";

/// Number of base58 characters after the prefix.
pub const ADDRESS_BODY_LEN: usize = 44;

/// Micro-units in one whole coin.
pub const MICRO_PER_COIN: u64 = 1_000_000;

/// Errors that can occur during wallet operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WalletError {
    /// Secret key is undecodable or has the wrong length.
    #[error("Invalid private key: {reason}")]
    InvalidKey { reason: String },

    /// Destination does not match the address format.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Amount is not a finite positive number of micro-units.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Amount exceeds the last observed balance.
    #[error("Insufficient balance ({have} < {want})")]
    InsufficientBalance { have: Amount, want: Amount },

    /// Canonical encoding failed.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Signature or public key is malformed or does not verify.
    #[error("Signature error: {0}")]
    Signature(String),

    /// Transport-level RPC failure (connect, timeout, body read).
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Node answered with a non-success status.
    #[error("RPC returned status {status}: {body}")]
    RpcStatus { status: u16, body: String },

    /// Node answered with a body we could not decode.
    #[error("Malformed RPC response: {0}")]
    Decode(String),
}

/// Result type for wallet operations.
pub type WalletResult<T> = Result<T, WalletError>;

/// Length of the digest an address encodes.
const ADDRESS_DIGEST_LEN: usize = 32;

/// A protocol address: `oct` followed by 44 base58 characters.
///
/// Deserialization accepts the same strings as [`Address::parse`], plus the
/// shorter encodings that key derivation can produce.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Parse and validate a user-supplied address.
    pub fn parse(input: &str) -> WalletResult<Self> {
        if Self::is_valid(input) {
            Ok(Self(input.to_string()))
        } else {
            Err(WalletError::InvalidAddress(input.to_string()))
        }
    }

    /// Equivalent of `^oct[1-9A-HJ-NP-Za-km-z]{44}$`.
    pub fn is_valid(input: &str) -> bool {
        match input.strip_prefix(ADDRESS_PREFIX) {
            Some(body) => body.len() == ADDRESS_BODY_LEN && body.chars().all(is_base58_char),
            None => false,
        }
    }

    /// Derived addresses are trusted as-is; their length follows the encoding.
    pub(crate) fn from_derived(encoded: String) -> Self {
        Self(encoded)
    }

    /// `oct` + base58 of exactly one sha256 digest, whatever its length.
    fn is_digest_encoding(input: &str) -> bool {
        input
            .strip_prefix(ADDRESS_PREFIX)
            .and_then(|body| bs58::decode(body).into_vec().ok())
            .map(|digest| digest.len() == ADDRESS_DIGEST_LEN)
            .unwrap_or(false)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_base58_char(c: char) -> bool {
    matches!(c, '1'..='9' | 'A'..='H' | 'J'..='N' | 'P'..='Z' | 'a'..='k' | 'm'..='z')
}

impl FromStr for Address {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = WalletError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if Self::is_valid(&value) || Self::is_digest_encoding(&value) {
            Ok(Self(value))
        } else {
            Err(WalletError::InvalidAddress(value))
        }
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Address::try_from(String::deserialize(deserializer)?).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An amount in micro-units (1 coin = 1_000_000 micro).
///
/// Serializes on the wire as a decimal string of micro-units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_micro(micro: u64) -> Self {
        Self(micro)
    }

    pub const fn micro(self) -> u64 {
        self.0
    }

    /// Convert a user-entered coin amount: `floor(coins * 1_000_000)`.
    pub fn from_coins(coins: f64) -> WalletResult<Self> {
        if !coins.is_finite() || coins <= 0.0 {
            return Err(WalletError::InvalidAmount(format!(
                "{} is not a positive number",
                coins
            )));
        }
        let micro = (coins * MICRO_PER_COIN as f64).floor();
        if micro >= u64::MAX as f64 {
            return Err(WalletError::InvalidAmount(format!("{} is too large", coins)));
        }
        if micro < 1.0 {
            return Err(WalletError::InvalidAmount(format!(
                "{} is below the smallest unit",
                coins
            )));
        }
        Ok(Self(micro as u64))
    }

    /// Convert a node-reported balance. Rounds instead of flooring so that
    /// float noise never shaves a micro-unit off; invalid values become zero.
    pub fn from_balance(coins: f64) -> Self {
        if !coins.is_finite() || coins <= 0.0 {
            return Self::ZERO;
        }
        Self((coins * MICRO_PER_COIN as f64).round().min(u64::MAX as f64) as u64)
    }

    pub fn to_coins(self) -> f64 {
        self.0 as f64 / MICRO_PER_COIN as f64
    }

    pub fn saturating_add(self, other: Amount) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:06}",
            self.0 / MICRO_PER_COIN,
            self.0 % MICRO_PER_COIN
        )
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient::u64(deserializer).map(Amount)
    }
}

/// Balance and nonce as last reported by the node. Always possibly stale.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AccountState {
    /// Micro-units, rounded from the reported balance. For display and totals.
    pub balance: Amount,
    /// Whole coins exactly as reported. Spend checks compare against this.
    pub balance_coins: f64,
    pub nonce: u64,
}

impl AccountState {
    pub fn new(balance: Amount, nonce: u64) -> Self {
        Self {
            balance,
            balance_coins: balance.to_coins(),
            nonce,
        }
    }

    /// State from a node-reported coin balance; invalid values become zero.
    pub fn from_reported(balance_coins: f64, nonce: u64) -> Self {
        let balance_coins = if balance_coins.is_finite() && balance_coins > 0.0 {
            balance_coins
        } else {
            0.0
        };
        Self {
            balance: Amount::from_balance(balance_coins),
            balance_coins,
            nonce,
        }
    }

    /// Whether `coins`, as entered, fits in the reported balance.
    pub fn covers(&self, coins: f64) -> bool {
        coins <= self.balance_coins
    }

    /// State reported for an address the node has never seen.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Deserializers for node fields that arrive either as JSON numbers or
/// as numeric strings.
pub(crate) mod lenient {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(serde_json::Number),
        String(String),
    }

    pub fn f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match NumberOrString::deserialize(deserializer)? {
            NumberOrString::Number(n) => n
                .as_f64()
                .ok_or_else(|| D::Error::custom(format!("{} is not a finite number", n))),
            NumberOrString::String(s) => s
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("'{}' is not a number", s))),
        }
    }

    pub fn u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match NumberOrString::deserialize(deserializer)? {
            NumberOrString::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|v| v.fract() == 0.0 && *v >= 0.0).map(|v| v as u64))
                .ok_or_else(|| D::Error::custom(format!("{} is not an unsigned integer", n))),
            NumberOrString::String(s) => s
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("'{}' is not an unsigned integer", s))),
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match NumberOrString::deserialize(deserializer)? {
            NumberOrString::Number(n) => n.to_string(),
            NumberOrString::String(s) => s,
        })
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(
            match Option::<NumberOrString>::deserialize(deserializer)? {
                Some(NumberOrString::Number(n)) => Some(n.to_string()),
                Some(NumberOrString::String(s)) => Some(s),
                None => None,
            },
        )
    }
}
