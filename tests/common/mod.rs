//! Shared utilities for integration tests: a programmable stub node.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;

use octra_wallet::config::schema::RpcConfig;
use octra_wallet::RpcClient;

/// Base64 of 64 zero bytes: seed of 32 zeros followed by 32 zeros.
pub const ZERO_SECRET_64: &str =
    "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA==";

/// Address derived from the all-zero seed.
pub const ZERO_ADDRESS: &str = "oct2KagShR4Usj2uARXJeDw7XJEKvQ3XDr84dC47hUB3Uyd";

/// Address derived from a seed of 32 bytes of 0x01.
pub const ONES_ADDRESS: &str = "oct4XmjKEd9A96KhoMX94zWJmd28dcPisbWGYWtad1dQ9v5";

type Reply = (u16, String);

/// Canned responses keyed by path parameter. Missing keys answer 404.
#[derive(Default)]
pub struct NodeState {
    balances: Mutex<HashMap<String, Reply>>,
    addresses: Mutex<HashMap<String, Reply>>,
    transactions: Mutex<HashMap<String, Reply>>,
    send_reply: Mutex<Option<Reply>>,
    submitted: Mutex<Vec<Value>>,
    hits: AtomicUsize,
}

pub struct StubNode {
    pub addr: SocketAddr,
    state: Arc<NodeState>,
}

impl StubNode {
    /// Bind to an ephemeral port and serve in the background.
    pub async fn start() -> Self {
        let state = Arc::new(NodeState::default());
        let app = Router::new()
            .route("/balance/{address}", get(balance))
            .route("/address/{address}", get(address))
            .route("/tx/{hash}", get(transaction))
            .route("/send-tx", post(send_tx))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client(&self) -> RpcClient {
        RpcClient::new(RpcConfig {
            url: self.url(),
            timeout_secs: 5,
            connect_timeout_secs: 2,
        })
        .unwrap()
    }

    pub fn set_balance(&self, address: &str, status: u16, body: impl Into<String>) {
        self.state
            .balances
            .lock()
            .unwrap()
            .insert(address.to_string(), (status, body.into()));
    }

    pub fn set_address(&self, address: &str, status: u16, body: impl Into<String>) {
        self.state
            .addresses
            .lock()
            .unwrap()
            .insert(address.to_string(), (status, body.into()));
    }

    pub fn set_transaction(&self, hash: &str, status: u16, body: impl Into<String>) {
        self.state
            .transactions
            .lock()
            .unwrap()
            .insert(hash.to_string(), (status, body.into()));
    }

    pub fn set_send_reply(&self, status: u16, body: impl Into<String>) {
        *self.state.send_reply.lock().unwrap() = Some((status, body.into()));
    }

    /// JSON bodies received on `/send-tx`, in arrival order.
    pub fn submitted(&self) -> Vec<Value> {
        self.state.submitted.lock().unwrap().clone()
    }

    /// Total requests served on any route.
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }
}

fn lookup(state: &NodeState, table: &Mutex<HashMap<String, Reply>>, key: &str) -> (StatusCode, String) {
    state.hits.fetch_add(1, Ordering::SeqCst);
    match table.lock().unwrap().get(key) {
        Some((status, body)) => (StatusCode::from_u16(*status).unwrap(), body.clone()),
        None => (StatusCode::NOT_FOUND, r#"{"error":"not found"}"#.to_string()),
    }
}

async fn balance(State(state): State<Arc<NodeState>>, Path(address): Path<String>) -> (StatusCode, String) {
    lookup(&state, &state.balances, &address)
}

async fn address(State(state): State<Arc<NodeState>>, Path(address): Path<String>) -> (StatusCode, String) {
    lookup(&state, &state.addresses, &address)
}

async fn transaction(State(state): State<Arc<NodeState>>, Path(hash): Path<String>) -> (StatusCode, String) {
    lookup(&state, &state.transactions, &hash)
}

async fn send_tx(State(state): State<Arc<NodeState>>, body: String) -> (StatusCode, String) {
    state.hits.fetch_add(1, Ordering::SeqCst);
    if let Ok(value) = serde_json::from_str::<Value>(&body) {
        state.submitted.lock().unwrap().push(value);
    }
    match state.send_reply.lock().unwrap().clone() {
        Some((status, body)) => (StatusCode::from_u16(status).unwrap(), body),
        None => (
            StatusCode::OK,
            r#"{"status":"accepted","tx_hash":"stub"}"#.to_string(),
        ),
    }
}

/// RPC client pointed at a port nothing listens on.
pub async fn unreachable_client() -> RpcClient {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    RpcClient::new(RpcConfig {
        url: format!("http://{}", addr),
        timeout_secs: 2,
        connect_timeout_secs: 1,
    })
    .unwrap()
}
