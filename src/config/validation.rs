//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, history limit within the cap)
//! - Check that endpoints and bind addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: WalletConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::WalletConfig;
use crate::ledger::reconcile::MAX_HISTORY_RECORDS;

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &WalletConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.rpc.url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            "rpc.url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("rpc.url", e.to_string())),
    }

    if config.rpc.timeout_secs == 0 {
        errors.push(ValidationError::new("rpc.timeout_secs", "must be greater than 0"));
    }
    if config.rpc.connect_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "rpc.connect_timeout_secs",
            "must be greater than 0",
        ));
    }

    if config.history.limit == 0 || config.history.limit > MAX_HISTORY_RECORDS {
        errors.push(ValidationError::new(
            "history.limit",
            format!("must be between 1 and {}", MAX_HISTORY_RECORDS),
        ));
    }
    if config.history.balance_refresh_secs == 0 {
        errors.push(ValidationError::new(
            "history.balance_refresh_secs",
            "must be greater than 0",
        ));
    }
    if config.history.history_refresh_secs == 0 {
        errors.push(ValidationError::new(
            "history.history_refresh_secs",
            "must be greater than 0",
        ));
    }

    let obs = &config.observability;
    if obs.log_format != "pretty" && obs.log_format != "json" {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("expected 'pretty' or 'json', got '{}'", obs.log_format),
        ));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", obs.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
