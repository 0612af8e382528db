//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the wallet.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the wallet.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WalletConfig {
    /// Node endpoint and timeouts.
    pub rpc: RpcConfig,

    /// History size and refresh cadence.
    pub history: HistoryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// RPC endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Node base URL (e.g., "https://octra.network").
    pub url: String,

    /// Total request timeout in seconds.
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "https://octra.network".to_string(),
            timeout_secs: 10,
            connect_timeout_secs: 5,
        }
    }
}

/// History and refresh configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Number of transaction references requested per refresh.
    pub limit: usize,

    /// Balance/nonce refresh interval in seconds.
    pub balance_refresh_secs: u64,

    /// History refresh interval in seconds.
    pub history_refresh_secs: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: 20,
            balance_refresh_secs: 30,
            history_refresh_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
