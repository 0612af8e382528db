//! Ledger read side.
//!
//! # Data Flow
//! ```text
//! GET /balance/{address}             → reader.rs → AccountState (404 ⇒ empty)
//! GET /address/{address}?limit=N     → reader.rs → references (404 ⇒ empty history)
//! GET /tx/{hash} × N (concurrently)  → gather → successes + dropped count
//!     → reconcile.rs (dedup, classify, convert, sort, cap)
//!     → History
//!
//! monitor.rs repeats both reads on their own cadences and publishes
//! snapshots over a watch channel.
//! ```
//!
//! # Design Decisions
//! - Node data is untrusted: payloads are parsed leniently, bad entries dropped
//! - A failed detail fetch never fails the whole history

pub mod monitor;
pub mod reader;
pub mod reconcile;
pub mod types;

pub use monitor::{LedgerMonitor, LedgerSnapshot};
pub use reader::LedgerReader;
pub use types::{Direction, History, TransactionRecord};
