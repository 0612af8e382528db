//! Ledger reader: account state and reconciled history for one address.

use std::collections::HashSet;

use crate::blockchain::client::RpcClient;
use crate::blockchain::types::{AccountState, Address, WalletResult};
use crate::ledger::reconcile::reconcile;
use crate::ledger::types::{History, TransactionReference};
use crate::observability::metrics;
use crate::resilience::gather;

/// Default number of references requested per history refresh.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Read-side view of the node. Holds no state between calls.
#[derive(Debug, Clone)]
pub struct LedgerReader {
    rpc: RpcClient,
}

impl LedgerReader {
    pub fn new(rpc: RpcClient) -> Self {
        Self { rpc }
    }

    /// Balance and nonce. An unknown account is a valid empty account;
    /// transport and status errors propagate.
    pub async fn fetch_account_state(&self, address: &Address) -> WalletResult<AccountState> {
        let state = match self.rpc.get_balance(address).await? {
            Some(body) => AccountState::from_reported(body.balance, body.nonce),
            None => {
                tracing::debug!(address = %address, "Account unknown to node, using empty state");
                AccountState::empty()
            }
        };

        tracing::debug!(
            address = %address,
            balance = %state.balance,
            nonce = state.nonce,
            "Fetched account state"
        );

        Ok(state)
    }

    /// Fetch up to `limit` references, their details concurrently, and reconcile.
    ///
    /// A 404 on the reference list is an empty history. Individual detail
    /// failures are dropped and counted in [`History::dropped`].
    pub async fn fetch_history(&self, address: &Address, limit: usize) -> WalletResult<History> {
        let references = match self.rpc.get_address_transactions(address, limit).await? {
            Some(refs) => refs,
            None => {
                tracing::debug!(address = %address, "No transaction record, empty history");
                return Ok(History::default());
            }
        };

        let unique = unique_references(&references);
        let gathered = gather(unique.iter().map(|reference| async move {
            self.rpc
                .get_transaction(&reference.hash)
                .await
                .map(|detail| (reference.hash.clone(), detail))
        }))
        .await;

        if gathered.dropped > 0 {
            tracing::warn!(
                address = %address,
                dropped = gathered.dropped,
                fetched = gathered.successes.len(),
                "Some transaction details could not be fetched"
            );
        }
        metrics::record_history_dropped(gathered.dropped);

        let records = reconcile(address, &references, gathered.successes);
        metrics::record_history_size(records.len());

        Ok(History {
            records,
            dropped: gathered.dropped,
        })
    }
}

/// References with duplicate hashes removed, first occurrence kept.
fn unique_references(references: &[TransactionReference]) -> Vec<&TransactionReference> {
    let mut seen = HashSet::new();
    references
        .iter()
        .filter(|r| seen.insert(r.hash.as_str()))
        .collect()
}
