//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! History refresh:
//!     → gather.rs (concurrent detail fetches, failures dropped and counted)
//!
//! Background refresh loop:
//!     → On failure: backoff.rs (jittered delay before the next attempt)
//! ```
//!
//! # Design Decisions
//! - Timeouts belong to the HTTP client; every call has one
//! - Submissions are never retried here; retry policy belongs to the caller
//! - Partial failure is a normal outcome for fan-out reads

pub mod backoff;
pub mod gather;

pub use backoff::calculate_backoff;
pub use gather::{gather, Gathered};
