//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → every subscribed task leaves its loop → process exits
//! ```
//!
//! # Design Decisions
//! - One broadcast channel, any number of long-running tasks
//! - Shutdown has a deadline: tasks that do not stop are abandoned

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
