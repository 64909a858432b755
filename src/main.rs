//! circular-cli - command-line front end for a Circular gateway
//!
//! Loads settings, then runs one gateway command and prints the JSON answer.

use anyhow::{Context, Result};
use circular_client::crypto::{address_from_public_key, CryptoProvider, Secp256k1Provider};
use circular_client::gateway::{FinalityPoller, GatewayClient, Operation, SubmitOutcome};
use circular_client::tx::TransactionSubmitter;
use circular_client::{metrics, Settings};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "circular-cli")]
#[command(about = "Submit and track transactions through a Circular gateway", long_about = None)]
#[command(version)]
struct Cli {
    /// Settings file (TOML)
    #[arg(short, long, env = "CIRCULAR_CONFIG")]
    config: Option<PathBuf>,

    /// Override the gateway base URL
    #[arg(long)]
    url: Option<String>,

    /// Print collected metrics after the command
    #[arg(long)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the blockchains known to the gateway
    Blockchains,
    /// Show a wallet's current nonce
    Nonce {
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        blockchain: Option<String>,
    },
    /// Sign and submit a transaction from the configured wallet
    Send {
        #[arg(long)]
        to: String,
        /// Transaction type, e.g. C_TYPE_COIN
        #[arg(long = "type")]
        tx_type: String,
        /// JSON payload
        #[arg(long)]
        payload: String,
        #[arg(long)]
        blockchain: Option<String>,
        /// Wait for the transaction to become final
        #[arg(long)]
        wait: bool,
    },
    /// Register the wallet of a public key
    Register {
        #[arg(long)]
        public_key: String,
        #[arg(long)]
        blockchain: Option<String>,
    },
    /// Wait for transactions to become final
    Outcome {
        /// Transaction IDs
        #[arg(required = true)]
        tx_ids: Vec<String>,
        #[arg(long)]
        blockchain: Option<String>,
        /// Override the configured timeout
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Derive the public key and address of the configured private key
    Pubkey,
    /// Run any gateway operation with a raw JSON body
    Query {
        /// Operation name, e.g. GetWallet or Circular_GetBlock_
        operation: String,
        #[arg(default_value = "{}")]
        body: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(url) = cli.url {
        settings.gateway.url = url;
    }

    let client = GatewayClient::new(settings.gateway.clone())?;
    info!(
        "Circular client v{} using gateway {}",
        env!("CARGO_PKG_VERSION"),
        client.config().url
    );

    let result = run(cli.command, &settings, client).await;

    if cli.print_metrics {
        eprintln!("{}", metrics::gather());
    }

    if let Err(e) = &result {
        error!("Command failed: {:#}", e);
    }
    result
}

async fn run(command: Commands, settings: &Settings, client: GatewayClient) -> Result<()> {
    match command {
        Commands::Blockchains => {
            let response = client.get_blockchains().await?;
            print_json(&serde_json::to_value(response)?)?;
        }
        Commands::Nonce {
            address,
            blockchain,
        } => {
            let blockchain = blockchain_or(settings, blockchain)?;
            let address = address_or(settings, address)?;
            let submitter = TransactionSubmitter::new(client);
            let nonce = submitter
                .nonce_resolver()
                .current(&blockchain, &address)
                .await?;
            print_json(&json!({"Address": address, "Nonce": nonce}))?;
        }
        Commands::Send {
            to,
            tx_type,
            payload,
            blockchain,
            wait,
        } => {
            let blockchain = blockchain_or(settings, blockchain)?;
            let private_key = settings.wallet.private_key()?;
            let from = match settings.wallet.address.clone() {
                Some(address) => address,
                None => {
                    let public_key = Secp256k1Provider::new().derive_public_key(&private_key)?;
                    address_from_public_key(&public_key)
                }
            };
            let payload: Value =
                serde_json::from_str(&payload).context("Payload is not valid JSON")?;

            let submitter = TransactionSubmitter::new(client.clone());
            let tx = submitter
                .prepare(&from, &private_key, &to, &tx_type, &payload, &blockchain)
                .await?;
            let outcome = submitter.submit_raw(&tx).await;
            print_outcome(&outcome)?;

            if wait {
                if !outcome.is_success() {
                    anyhow::bail!("Transaction {} was not accepted", tx.id);
                }
                let poller = FinalityPoller::from_config(client, &settings.finality);
                wait_for(&poller, &blockchain, &[tx.id], settings.finality.timeout_secs).await?;
            }
        }
        Commands::Register {
            public_key,
            blockchain,
        } => {
            let blockchain = blockchain_or(settings, blockchain)?;
            let registration = TransactionSubmitter::new(client)
                .register_wallet(&blockchain, &public_key)
                .await?;
            info!(
                "Registration {} for wallet {}",
                registration.id, registration.address
            );
            print_outcome(&registration.outcome)?;
        }
        Commands::Outcome {
            tx_ids,
            blockchain,
            timeout,
        } => {
            let blockchain = blockchain_or(settings, blockchain)?;
            let poller = FinalityPoller::from_config(client, &settings.finality);
            let timeout = timeout.unwrap_or(settings.finality.timeout_secs);
            wait_for(&poller, &blockchain, &tx_ids, timeout).await?;
        }
        Commands::Pubkey => {
            let private_key = settings.wallet.private_key()?;
            let public_key = Secp256k1Provider::new().derive_public_key(&private_key)?;
            let address = address_from_public_key(&public_key);
            print_json(&json!({"PublicKey": public_key, "Address": address}))?;
        }
        Commands::Query { operation, body } => {
            let op = Operation::from_name(&operation)
                .with_context(|| format!("Unknown gateway operation: {}", operation))?;
            let body: Value = serde_json::from_str(&body).context("Body is not valid JSON")?;
            let response = client.query(op, body).await?;
            print_json(&serde_json::to_value(response)?)?;
        }
    }

    Ok(())
}

/// Poll every transaction concurrently; Ctrl+C cancels all of them
async fn wait_for(
    poller: &FinalityPoller,
    blockchain: &str,
    tx_ids: &[String],
    timeout_secs: u64,
) -> Result<()> {
    let handles: Vec<_> = tx_ids
        .iter()
        .map(|id| poller.spawn(blockchain, id, timeout_secs))
        .collect();

    let cancels: Vec<_> = handles.iter().map(|h| h.canceller()).collect();
    let ctrl_c = tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling {} poll(s)", cancels.len());
            for cancel in &cancels {
                cancel.cancel();
            }
        }
    });

    let outcomes =
        futures::future::join_all(handles.into_iter().map(|h| h.outcome())).await;
    ctrl_c.abort();

    let mut failed = 0;
    for (tx_id, outcome) in tx_ids.iter().zip(outcomes) {
        match outcome {
            Ok(value) => print_json(&json!({"ID": tx_id, "Outcome": value}))?,
            Err(e) => {
                failed += 1;
                error!("Transaction {}: {}", tx_id, e);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} transaction(s) did not settle", failed, tx_ids.len());
    }
    Ok(())
}

fn blockchain_or(settings: &Settings, blockchain: Option<String>) -> Result<String> {
    blockchain
        .or_else(|| settings.wallet.blockchain.clone())
        .context("No blockchain given. Pass --blockchain or set wallet.blockchain")
}

fn address_or(settings: &Settings, address: Option<String>) -> Result<String> {
    address
        .or_else(|| settings.wallet.address.clone())
        .context("No wallet address given. Pass --address or set wallet.address")
}

fn print_outcome(outcome: &SubmitOutcome) -> Result<()> {
    let value = match outcome {
        SubmitOutcome::Response(response) => serde_json::to_value(response)?,
        SubmitOutcome::Unparsed { status, message } => {
            json!({"status": status, "message": message})
        }
        SubmitOutcome::Unreachable { message, error } => {
            json!({"success": false, "message": message, "error": error})
        }
    };
    print_json(&value)
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,circular_client=debug,hyper=warn,reqwest=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();
}
