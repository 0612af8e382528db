//! Explicit wallet session handle.
//!
//! A session owns the decoded key material for as long as the user is logged
//! in and is passed to every engine call; nothing is held in globals.
//! [`WalletSession::logout`] consumes the handle, which zeroizes the key.
//!
//! # Nonce race
//! Transactions built from the same account snapshot carry the same nonce and
//! the node rejects all but one. Sends through one session are serialized by
//! an internal lock; separate sessions or processes are not coordinated.

use tokio::sync::Mutex;

use crate::blockchain::client::{RpcClient, SubmissionResult};
use crate::blockchain::signer::{self, SignedTransaction};
use crate::blockchain::transaction::{TransactionIntent, TransferPreview, TxBuilder};
use crate::blockchain::types::{AccountState, Address, WalletResult};
use crate::blockchain::wallet::KeyMaterial;
use crate::ledger::reader::{LedgerReader, DEFAULT_HISTORY_LIMIT};
use crate::ledger::types::History;

#[derive(Debug)]
pub struct WalletSession {
    keys: KeyMaterial,
    builder: TxBuilder,
    rpc: RpcClient,
    reader: LedgerReader,
    history_limit: usize,
    send_lock: Mutex<()>,
}

impl WalletSession {
    /// Start a session from a base64 secret.
    pub fn login(secret_b64: &str, rpc: RpcClient) -> WalletResult<Self> {
        Ok(Self::from_keys(KeyMaterial::from_base64(secret_b64)?, rpc))
    }

    pub fn from_keys(keys: KeyMaterial, rpc: RpcClient) -> Self {
        let builder = TxBuilder::new(keys.address().clone());
        let reader = LedgerReader::new(rpc.clone());
        Self {
            keys,
            builder,
            rpc,
            reader,
            history_limit: DEFAULT_HISTORY_LIMIT,
            send_lock: Mutex::new(()),
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn address(&self) -> &Address {
        self.keys.address()
    }

    pub fn public_key_base64(&self) -> String {
        self.keys.public_key_base64()
    }

    pub fn reader(&self) -> &LedgerReader {
        &self.reader
    }

    pub async fn account_state(&self) -> WalletResult<AccountState> {
        self.reader.fetch_account_state(self.address()).await
    }

    pub async fn history(&self) -> WalletResult<History> {
        self.reader
            .fetch_history(self.address(), self.history_limit)
            .await
    }

    /// Confirmation data against a given snapshot. No network.
    pub fn preview(
        &self,
        intent: &TransactionIntent,
        state: &AccountState,
    ) -> WalletResult<TransferPreview> {
        self.builder.preview(intent, state)
    }

    /// Build and sign against a given snapshot. No network.
    pub fn prepare(
        &self,
        intent: &TransactionIntent,
        state: &AccountState,
    ) -> WalletResult<SignedTransaction> {
        let tx = self.builder.build(intent, state)?;
        signer::sign(&self.keys, tx)
    }

    /// Fetch fresh account state, then [`send_with_state`](Self::send_with_state).
    ///
    /// Errors are validation failures or a failed state fetch; node
    /// rejections come back as an unsuccessful [`SubmissionResult`].
    pub async fn send(&self, intent: &TransactionIntent) -> WalletResult<SubmissionResult> {
        let _guard = self.send_lock.lock().await;
        let state = self.account_state().await?;
        self.submit_locked(intent, &state).await
    }

    /// Validate, build, sign and submit against a known snapshot.
    /// Validation failures return before any network call.
    pub async fn send_with_state(
        &self,
        intent: &TransactionIntent,
        state: &AccountState,
    ) -> WalletResult<SubmissionResult> {
        let _guard = self.send_lock.lock().await;
        self.submit_locked(intent, state).await
    }

    async fn submit_locked(
        &self,
        intent: &TransactionIntent,
        state: &AccountState,
    ) -> WalletResult<SubmissionResult> {
        let signed = self.prepare(intent, state)?;
        Ok(self.rpc.send_transaction(&signed).await)
    }

    /// End the session and discard the key material.
    pub fn logout(self) {
        tracing::info!(address = %self.keys.address(), "Session closed");
    }
}
