//! Octra wallet transaction engine.
//!
//! Key handling, transaction construction, canonical signing, submission and
//! ledger reads against an Octra-style JSON-over-HTTP node.

pub mod blockchain;
pub mod config;
pub mod ledger;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use blockchain::{
    AccountState, Address, Amount, KeyMaterial, RpcClient, SignedTransaction, SubmissionResult,
    TransactionIntent, TxBuilder, WalletError, WalletResult, WalletSession,
};
pub use config::schema::WalletConfig;
pub use ledger::{LedgerMonitor, LedgerReader, LedgerSnapshot};
pub use lifecycle::Shutdown;
