//! Node RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Query account state, transaction references and transaction details
//! - Submit signed transfers and normalize the node's answers
//! - Report 404s as "absent" so readers can treat them as empty state
//!
//! Timeouts are enforced by the underlying HTTP client. Nothing here retries.

use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::blockchain::signer::SignedTransaction;
use crate::blockchain::types::{lenient, Address, WalletError, WalletResult};
use crate::config::schema::RpcConfig;
use crate::ledger::types::{TransactionDetail, TransactionReference};
use crate::observability::metrics;

/// Body of `GET /balance/{address}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BalanceResponse {
    #[serde(deserialize_with = "lenient::f64")]
    pub balance: f64,
    #[serde(deserialize_with = "lenient::u64")]
    pub nonce: u64,
}

/// Body of `GET /address/{address}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressResponse {
    #[serde(default)]
    pub recent_transactions: Vec<TransactionReference>,
}

/// The node's answer to `POST /send-tx`, decoded into one closed set.
#[derive(Debug, Clone, PartialEq)]
pub enum SendTxResponse {
    /// `{"status": "accepted", "tx_hash": ..., "pool_info": ...}`
    Accepted {
        tx_hash: Option<String>,
        pool_info: Option<serde_json::Value>,
    },
    /// Legacy plain text: `OK <hash>`.
    LegacyOk { tx_hash: Option<String> },
    /// Everything else, including non-2xx statuses.
    Rejected { message: String },
}

impl SendTxResponse {
    /// Decide which shape a response has from its status and raw body.
    pub fn classify(status: StatusCode, body: &str) -> Self {
        let json = serde_json::from_str::<serde_json::Value>(body).ok();

        if !status.is_success() {
            let message = json
                .as_ref()
                .and_then(error_message)
                .unwrap_or_else(|| {
                    if body.trim().is_empty() {
                        format!("HTTP {}", status.as_u16())
                    } else {
                        body.to_string()
                    }
                });
            return SendTxResponse::Rejected { message };
        }

        match json {
            Some(serde_json::Value::Object(ref map))
                if map.get("status").and_then(|s| s.as_str()) == Some("accepted") =>
            {
                SendTxResponse::Accepted {
                    tx_hash: map.get("tx_hash").and_then(|h| h.as_str()).map(str::to_string),
                    pool_info: map.get("pool_info").cloned(),
                }
            }
            Some(serde_json::Value::String(ref text)) if is_legacy_ok(text) => {
                SendTxResponse::LegacyOk {
                    tx_hash: legacy_hash(text),
                }
            }
            None if is_legacy_ok(body) => SendTxResponse::LegacyOk {
                tx_hash: legacy_hash(body),
            },
            Some(ref value) => SendTxResponse::Rejected {
                message: error_message(value).unwrap_or_else(|| value.to_string()),
            },
            None => SendTxResponse::Rejected {
                message: body.to_string(),
            },
        }
    }
}

fn is_legacy_ok(text: &str) -> bool {
    text.trim_start()
        .get(..2)
        .map(|head| head.eq_ignore_ascii_case("ok"))
        .unwrap_or(false)
}

/// Trailing whitespace-delimited token after the leading `ok`.
fn legacy_hash(text: &str) -> Option<String> {
    let mut tokens = text.split_whitespace();
    tokens.next();
    tokens.last().map(str::to_string)
}

fn error_message(value: &serde_json::Value) -> Option<String> {
    ["error", "message"]
        .iter()
        .find_map(|key| value.get(*key))
        .map(|v| match v.as_str() {
            Some(s) => s.to_string(),
            None => v.to_string(),
        })
}

/// Outcome of a submission. Every failure mode lands in `error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock seconds spent on the call.
    pub response_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_info: Option<serde_json::Value>,
}

impl SubmissionResult {
    pub fn from_response(response: SendTxResponse, elapsed: Duration) -> Self {
        let response_time = elapsed.as_secs_f64();
        match response {
            SendTxResponse::Accepted { tx_hash, pool_info } => Self {
                success: true,
                tx_hash,
                error: None,
                response_time,
                pool_info,
            },
            SendTxResponse::LegacyOk { tx_hash } => Self {
                success: true,
                tx_hash,
                error: None,
                response_time,
                pool_info: None,
            },
            SendTxResponse::Rejected { message } => Self::failure(message, elapsed),
        }
    }

    pub fn failure(error: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            success: false,
            tx_hash: None,
            error: Some(error.into()),
            response_time: elapsed.as_secs_f64(),
            pool_info: None,
        }
    }
}

/// HTTP client for a single node.
#[derive(Clone)]
pub struct RpcClient {
    http: Client,
    base_url: String,
    config: RpcConfig,
}

impl RpcClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `config` - RPC configuration (endpoint and timeouts)
    pub fn new(config: RpcConfig) -> WalletResult<Self> {
        let parsed: Url = config
            .url
            .parse()
            .map_err(|e| WalletError::Rpc(format!("Invalid RPC URL '{}': {}", config.url, e)))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| WalletError::Rpc(format!("Failed to build HTTP client: {}", e)))?;

        tracing::info!(
            rpc_url = %parsed,
            timeout_secs = config.timeout_secs,
            "RPC client initialized"
        );

        Ok(Self {
            http,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            config,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    /// `GET /balance/{address}`. `None` when the node does not know the account.
    pub async fn get_balance(&self, address: &Address) -> WalletResult<Option<BalanceResponse>> {
        let url = format!("{}/balance/{}", self.base_url, address);
        self.get_json("balance", &url).await
    }

    /// `GET /address/{address}?limit=N`. `None` when the node has no record.
    pub async fn get_address_transactions(
        &self,
        address: &Address,
        limit: usize,
    ) -> WalletResult<Option<Vec<TransactionReference>>> {
        let url = format!("{}/address/{}?limit={}", self.base_url, address, limit);
        let response: Option<AddressResponse> = self.get_json("address", &url).await?;
        Ok(response.map(|r| r.recent_transactions))
    }

    /// `GET /tx/{hash}`. A 404 is an error here; the caller drops it.
    pub async fn get_transaction(&self, hash: &str) -> WalletResult<TransactionDetail> {
        let url = format!("{}/tx/{}", self.base_url, hash);
        self.get_json::<TransactionDetail>("tx", &url)
            .await?
            .ok_or_else(|| WalletError::RpcStatus {
                status: StatusCode::NOT_FOUND.as_u16(),
                body: format!("transaction {} not found", hash),
            })
    }

    /// `POST /send-tx`. Never fails: every outcome is a [`SubmissionResult`].
    pub async fn send_transaction(&self, signed: &SignedTransaction) -> SubmissionResult {
        let url = format!("{}/send-tx", self.base_url);
        let start = Instant::now();

        let outcome = match self.http.post(&url).json(signed).send().await {
            Ok(response) => {
                let status = response.status();
                match response.text().await {
                    Ok(body) => SubmissionResult::from_response(
                        SendTxResponse::classify(status, &body),
                        start.elapsed(),
                    ),
                    Err(e) => SubmissionResult::failure(
                        format!("Failed to read response body: {}", e),
                        start.elapsed(),
                    ),
                }
            }
            Err(e) => SubmissionResult::failure(describe_transport_error(&e), start.elapsed()),
        };

        let label = if outcome.success { "accepted" } else { "rejected" };
        metrics::record_rpc_request("send-tx", label);
        metrics::record_submission(outcome.success, start.elapsed());

        if outcome.success {
            tracing::info!(
                tx_hash = outcome.tx_hash.as_deref().unwrap_or("-"),
                nonce = signed.tx.nonce,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Transaction accepted"
            );
        } else {
            tracing::warn!(
                error = outcome.error.as_deref().unwrap_or("-"),
                nonce = signed.tx.nonce,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Transaction rejected"
            );
        }

        outcome
    }

    /// GET and decode JSON; 404 maps to `Ok(None)`.
    async fn get_json<T>(&self, endpoint: &'static str, url: &str) -> WalletResult<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = match self.http.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                metrics::record_rpc_request(endpoint, "transport_error");
                tracing::warn!(endpoint, error = %e, "RPC request failed");
                return Err(WalletError::Rpc(describe_transport_error(&e)));
            }
        };

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WalletError::Rpc(format!("Failed to read response body: {}", e)))?;

        if status == StatusCode::NOT_FOUND || is_unknown_account(&body) {
            metrics::record_rpc_request(endpoint, "not_found");
            tracing::debug!(endpoint, "RPC resource not found");
            return Ok(None);
        }

        if !status.is_success() {
            metrics::record_rpc_request(endpoint, "error_status");
            tracing::warn!(endpoint, status = status.as_u16(), "RPC returned error status");
            return Err(WalletError::RpcStatus {
                status: status.as_u16(),
                body,
            });
        }

        metrics::record_rpc_request(endpoint, "ok");
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| WalletError::Decode(format!("{} response: {}", endpoint, e)))
    }
}

/// Some nodes answer unknown accounts with an error body instead of a 404.
fn is_unknown_account(body: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .as_ref()
        .and_then(error_message)
        .map(|m| m.to_ascii_lowercase().contains("no such account"))
        .unwrap_or(false)
}

fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("Request timed out: {}", e)
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        e.to_string()
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("rpc_url", &self.base_url)
            .field("timeout_secs", &self.config.timeout_secs)
            .finish()
    }
}
