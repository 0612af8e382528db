//! Transaction engine.
//!
//! # Data Flow
//! ```text
//! OCTRA_PRIVATE_KEY (base64 secret)
//!     → wallet.rs (decode, derive public key and address)
//!     → transaction.rs (validate intent, nonce and fee tier)
//!     → signer.rs (canonical bytes, Ed25519 signature)
//!     → client.rs (POST /send-tx, normalize the answer)
//!
//! session.rs ties the steps together behind one handle per login.
//! ```
//!
//! # Security Constraints
//! - Secret keys ONLY from environment variables
//! - Never log secret keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod session;
pub mod signer;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::{RpcClient, SendTxResponse, SubmissionResult};
pub use session::WalletSession;
pub use signer::SignedTransaction;
pub use transaction::{TransactionIntent, TxBuilder, UnsignedTransaction};
pub use types::{AccountState, Address, Amount, WalletError, WalletResult};
pub use wallet::KeyMaterial;
