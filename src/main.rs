//! `octra-wallet`: command-line front end for the transaction engine.
//!
//! The secret key is read from `OCTRA_PRIVATE_KEY`; it is never accepted as
//! an argument or read from the config file. Command output is JSON on
//! stdout, logs go to stderr.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use octra_wallet::blockchain::transaction::TransferPreview;
use octra_wallet::config::{load_or_default, ConfigOverrides};
use octra_wallet::lifecycle::signals::wait_for_signal;
use octra_wallet::observability::{logging, metrics};
use octra_wallet::{
    KeyMaterial, LedgerMonitor, LedgerSnapshot, RpcClient, Shutdown, TransactionIntent,
    WalletSession,
};

/// How long `watch` waits for the monitor to stop after a signal.
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "octra-wallet")]
#[command(about = "Send and inspect Octra transfers", long_about = None)]
struct Cli {
    /// TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Node URL, overrides the config file and OCTRA_RPC_URL.
    #[arg(long)]
    rpc_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the address and public key of the loaded key
    Address,
    /// Show balance and nonce
    Balance,
    /// Show reconciled transaction history
    History {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Send a transfer
    Send {
        #[arg(long)]
        to: String,
        /// Amount in whole coins
        #[arg(long)]
        amount: f64,
        /// Build and sign, print, but do not submit
        #[arg(long)]
        dry_run: bool,
    },
    /// Follow balance and history until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        rpc_url: cli.rpc_url,
        history_limit: match cli.command {
            Commands::History { limit } => limit,
            _ => None,
        },
    };
    let config = load_or_default(cli.config.as_deref(), &overrides)?;

    logging::init_logging(&config.observability);

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let keys = KeyMaterial::from_env()?;
    let rpc = RpcClient::new(config.rpc.clone())?;
    tracing::debug!(rpc_url = %rpc.base_url(), address = %keys.address(), "Wallet loaded");

    let session = WalletSession::from_keys(keys, rpc).with_history_limit(config.history.limit);

    match cli.command {
        Commands::Address => {
            print_json(&json!({
                "address": session.address(),
                "public_key": session.public_key_base64(),
            }))?;
        }
        Commands::Balance => {
            let state = session.account_state().await?;
            print_json(&json!({
                "address": session.address(),
                "balance": state.balance.to_string(),
                "nonce": state.nonce,
            }))?;
        }
        Commands::History { .. } => {
            let history = session.history().await?;
            print_json(&json!({
                "address": session.address(),
                "transactions": history.records,
                "dropped": history.dropped,
            }))?;
        }
        Commands::Send {
            to,
            amount,
            dry_run,
        } => {
            let intent = TransactionIntent::new(to, amount);
            let state = session.account_state().await?;
            let preview = session.preview(&intent, &state)?;

            if dry_run {
                let signed = session.prepare(&intent, &state)?;
                print_json(&json!({
                    "preview": preview_json(&preview),
                    "transaction": signed,
                }))?;
            } else {
                let result = session.send_with_state(&intent, &state).await?;
                print_json(&json!({
                    "preview": preview_json(&preview),
                    "result": result,
                }))?;
                if !result.success {
                    session.logout();
                    std::process::exit(1);
                }
            }
        }
        Commands::Watch => {
            let (monitor, mut snapshots) = LedgerMonitor::new(
                session.reader().clone(),
                session.address().clone(),
                config.history.clone(),
            );

            let shutdown = Shutdown::new();
            let mut stop = shutdown.subscribe();
            let task = tokio::spawn(monitor.run(shutdown.subscribe()));
            let signal_shutdown = shutdown.clone();
            tokio::spawn(async move { wait_for_signal(&signal_shutdown).await });

            loop {
                tokio::select! {
                    changed = snapshots.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let snapshot = snapshots.borrow_and_update().clone();
                        print_json(&snapshot_json(&snapshot))?;
                    }
                    _ = stop.recv() => break,
                }
            }

            shutdown.drain(task, SHUTDOWN_DEADLINE).await;
        }
    }

    session.logout();
    Ok(())
}

fn preview_json(preview: &TransferPreview) -> Value {
    json!({
        "to": preview.to,
        "amount": preview.amount.to_string(),
        "fee": preview.fee.to_string(),
        "total": preview.total.to_string(),
        "nonce": preview.nonce,
        "ou": preview.tier.ou(),
    })
}

fn snapshot_json(snapshot: &LedgerSnapshot) -> Value {
    json!({
        "balance": snapshot.state.map(|s| s.balance.to_string()),
        "nonce": snapshot.state.map(|s| s.nonce),
        "transactions": snapshot.history,
        "dropped": snapshot.dropped_details,
        "balance_error": snapshot.state_error,
        "history_error": snapshot.history_error,
    })
}

fn print_json(value: &Value) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
