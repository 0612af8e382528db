//! Background refresh of account state and history.

use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::blockchain::types::{AccountState, Address};
use crate::config::schema::HistoryConfig;
use crate::ledger::reader::LedgerReader;
use crate::ledger::types::TransactionRecord;
use crate::resilience::calculate_backoff;

/// First retry delay after a failed refresh.
const ERROR_RETRY_BASE: Duration = Duration::from_secs(5);

/// Latest view published by the monitor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerSnapshot {
    /// `None` until the first successful balance fetch.
    pub state: Option<AccountState>,
    pub history: Vec<TransactionRecord>,
    /// Detail fetches dropped in the last history refresh.
    pub dropped_details: usize,
    /// Last balance refresh error; cleared by the next successful balance refresh.
    pub state_error: Option<String>,
    /// Last history refresh error; cleared by the next successful history refresh.
    pub history_error: Option<String>,
}

impl LedgerSnapshot {
    /// Either outstanding error, balance first.
    pub fn last_error(&self) -> Option<&str> {
        self.state_error.as_deref().or(self.history_error.as_deref())
    }
}

/// Polls the node on two cadences and publishes [`LedgerSnapshot`]s.
pub struct LedgerMonitor {
    reader: LedgerReader,
    address: Address,
    config: HistoryConfig,
    tx: watch::Sender<LedgerSnapshot>,
    balance_failures: u32,
    history_failures: u32,
}

impl LedgerMonitor {
    pub fn new(
        reader: LedgerReader,
        address: Address,
        config: HistoryConfig,
    ) -> (Self, watch::Receiver<LedgerSnapshot>) {
        let (tx, rx) = watch::channel(LedgerSnapshot::default());
        let monitor = Self {
            reader,
            address,
            config,
            tx,
            balance_failures: 0,
            history_failures: 0,
        };
        (monitor, rx)
    }

    /// Run until the shutdown signal fires.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            address = %self.address,
            balance_every_secs = self.config.balance_refresh_secs,
            history_every_secs = self.config.history_refresh_secs,
            "Ledger monitor starting"
        );

        let balance_every = Duration::from_secs(self.config.balance_refresh_secs);
        let history_every = Duration::from_secs(self.config.history_refresh_secs);

        let mut balance_ticker = time::interval(balance_every);
        let mut history_ticker = time::interval(history_every);
        balance_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        history_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = balance_ticker.tick() => {
                    if !self.refresh_state().await {
                        let delay = calculate_backoff(self.balance_failures, ERROR_RETRY_BASE, balance_every);
                        balance_ticker.reset_at(Instant::now() + delay);
                    }
                }
                _ = history_ticker.tick() => {
                    if !self.refresh_history().await {
                        let delay = calculate_backoff(self.history_failures, ERROR_RETRY_BASE, history_every);
                        history_ticker.reset_at(Instant::now() + delay);
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Ledger monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Refresh balance and nonce. Returns `false` on failure; the previous
    /// state stays published.
    pub async fn refresh_state(&mut self) -> bool {
        match self.reader.fetch_account_state(&self.address).await {
            Ok(state) => {
                self.balance_failures = 0;
                self.tx.send_modify(|snapshot| {
                    if snapshot.state != Some(state) {
                        tracing::info!(
                            balance = %state.balance,
                            nonce = state.nonce,
                            "Account state changed"
                        );
                    }
                    snapshot.state = Some(state);
                    snapshot.state_error = None;
                });
                true
            }
            Err(e) => {
                self.balance_failures = self.balance_failures.saturating_add(1);
                tracing::warn!(
                    error = %e,
                    consecutive_failures = self.balance_failures,
                    "Account state refresh failed"
                );
                self.tx.send_modify(|snapshot| snapshot.state_error = Some(e.to_string()));
                false
            }
        }
    }

    /// Refresh history. Returns `false` on failure; the previous history
    /// stays published.
    pub async fn refresh_history(&mut self) -> bool {
        match self.reader.fetch_history(&self.address, self.config.limit).await {
            Ok(history) => {
                self.history_failures = 0;
                self.tx.send_modify(|snapshot| {
                    let newest = history.records.first().map(|r| r.hash.as_str());
                    if snapshot.history.first().map(|r| r.hash.as_str()) != newest {
                        tracing::info!(records = history.records.len(), "History changed");
                    }
                    snapshot.history = history.records;
                    snapshot.dropped_details = history.dropped;
                    snapshot.history_error = None;
                });
                true
            }
            Err(e) => {
                self.history_failures = self.history_failures.saturating_add(1);
                tracing::warn!(
                    error = %e,
                    consecutive_failures = self.history_failures,
                    "History refresh failed"
                );
                self.tx.send_modify(|snapshot| snapshot.history_error = Some(e.to_string()));
                false
            }
        }
    }
}
