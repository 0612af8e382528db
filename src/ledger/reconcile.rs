//! History reconciliation.
//!
//! Turns fetched transaction details into the history view: unique by hash
//! (first occurrence wins), classified against the owned address, amounts in
//! whole coins, newest first, at most [`MAX_HISTORY_RECORDS`] entries.

use std::collections::HashSet;

use crate::blockchain::types::{Address, Amount, WalletResult, MICRO_PER_COIN};
use crate::ledger::types::{Direction, TransactionDetail, TransactionRecord, TransactionReference};

/// Cap on the reconciled history length.
pub const MAX_HISTORY_RECORDS: usize = 50;

pub fn micro_to_coins(micro: u64) -> f64 {
    micro as f64 / MICRO_PER_COIN as f64
}

pub fn coins_to_micro(coins: f64) -> WalletResult<u64> {
    Amount::from_coins(coins).map(Amount::micro)
}

/// Interpret a node amount: decimal strings are coins, integers are micro-units.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.contains('.') {
        raw.parse::<f64>().ok().filter(|v| v.is_finite())
    } else {
        raw.parse::<u64>().ok().map(micro_to_coins)
    }
}

/// Build the ordered history for `owner` from `(hash, detail)` pairs.
pub fn reconcile(
    owner: &Address,
    references: &[TransactionReference],
    details: Vec<(String, TransactionDetail)>,
) -> Vec<TransactionRecord> {
    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(details.len());

    for (hash, detail) in details {
        if !seen.insert(hash.clone()) {
            continue;
        }

        let tx = detail.parsed_tx;
        let raw = tx
            .amount_raw
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(tx.amount.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or("0");

        let Some(amount) = parse_amount(raw) else {
            tracing::debug!(hash = %hash, raw, "Skipping transaction with unparsable amount");
            continue;
        };

        let (direction, counterparty) = if tx.to == owner.as_str() {
            (Direction::In, tx.from)
        } else {
            (Direction::Out, tx.to)
        };

        let epoch = references
            .iter()
            .find(|r| r.hash == hash)
            .and_then(|r| r.epoch);

        records.push(TransactionRecord {
            hash,
            amount,
            counterparty,
            direction,
            nonce: tx.nonce,
            epoch,
            time_ms: (tx.timestamp * 1000.0) as i64,
        });
    }

    records.sort_by(|a, b| b.time_ms.cmp(&a.time_ms));
    records.truncate(MAX_HISTORY_RECORDS);
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::ParsedTransaction;

    const OWNER: &str = "oct2KagShR4Usj2uARXJeDw7XJEKvQ3XDr84dC47hUB3Uyd";
    const PEER: &str = "oct4XmjKEd9A96KhoMX94zWJmd28dcPisbWGYWtad1dQ9v5";

    fn owner() -> Address {
        Address::parse(OWNER).unwrap()
    }

    fn detail(from: &str, to: &str, amount: &str, timestamp: f64) -> TransactionDetail {
        TransactionDetail {
            parsed_tx: ParsedTransaction {
                from: from.to_string(),
                to: to.to_string(),
                amount: Some(amount.to_string()),
                amount_raw: None,
                nonce: 1,
                timestamp,
            },
        }
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("2500000"), Some(2.5));
        assert_eq!(parse_amount("2.5"), Some(2.5));
        assert_eq!(parse_amount("0"), Some(0.0));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("-5"), None);
    }

    #[test]
    fn test_micro_conversion_round_trip() {
        for coins in [0.000001, 0.5, 10.0, 999.999999, 31337.123456] {
            let back = micro_to_coins(coins_to_micro(coins).unwrap());
            assert!((back - coins).abs() <= 1e-6 + 1e-9, "{} -> {}", coins, back);
        }
    }

    #[test]
    fn test_duplicate_hash_kept_once() {
        let details = vec![
            ("h1".to_string(), detail(PEER, OWNER, "1000000", 100.0)),
            ("h1".to_string(), detail(PEER, OWNER, "9000000", 200.0)),
        ];
        let history = reconcile(&owner(), &[], details);
        assert_eq!(history.len(), 1);
        // First occurrence wins
        assert_eq!(history[0].amount, 1.0);
    }

    #[test]
    fn test_ordering_newest_first() {
        let details = vec![
            ("t2".to_string(), detail(PEER, OWNER, "1", 200.0)),
            ("t3".to_string(), detail(PEER, OWNER, "1", 100.0)),
            ("t1".to_string(), detail(PEER, OWNER, "1", 300.0)),
        ];
        let hashes: Vec<_> = reconcile(&owner(), &[], details)
            .into_iter()
            .map(|r| r.hash)
            .collect();
        assert_eq!(hashes, vec!["t1", "t2", "t3"]);
    }

    #[test]
    fn test_direction_and_counterparty() {
        let details = vec![
            ("in".to_string(), detail(PEER, OWNER, "1", 2.0)),
            ("out".to_string(), detail(OWNER, PEER, "1", 1.0)),
        ];
        let history = reconcile(&owner(), &[], details);

        assert_eq!(history[0].direction, Direction::In);
        assert_eq!(history[0].counterparty, PEER);
        assert_eq!(history[1].direction, Direction::Out);
        assert_eq!(history[1].counterparty, PEER);
    }

    #[test]
    fn test_amount_raw_preferred_and_epoch_attached() {
        let mut d = detail(PEER, OWNER, "3.0", 1_700_000_000.5);
        d.parsed_tx.amount_raw = Some("1250000".to_string());
        let refs = vec![TransactionReference::new("h", Some(77))];

        let history = reconcile(&owner(), &refs, vec![("h".to_string(), d)]);
        assert_eq!(history[0].amount, 1.25);
        assert_eq!(history[0].epoch, Some(77));
        assert_eq!(history[0].time_ms, 1_700_000_000_500);
    }

    #[test]
    fn test_unparsable_amount_skipped() {
        let details = vec![
            ("bad".to_string(), detail(PEER, OWNER, "lots", 1.0)),
            ("good".to_string(), detail(PEER, OWNER, "1", 2.0)),
        ];
        let history = reconcile(&owner(), &[], details);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].hash, "good");
    }

    #[test]
    fn test_truncated_to_cap() {
        let details = (0..80)
            .map(|i| (format!("h{}", i), detail(PEER, OWNER, "1", i as f64)))
            .collect();
        let history = reconcile(&owner(), &[], details);
        assert_eq!(history.len(), MAX_HISTORY_RECORDS);
        assert_eq!(history[0].hash, "h79");
        assert_eq!(history[MAX_HISTORY_RECORDS - 1].hash, "h30");
    }
}
