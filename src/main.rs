//! chainio command line.
//!
//! # Architecture Overview
//!
//! ```text
//!   chainio <command>
//!       │
//!       ▼
//!   config (TOML) ──▶ observability (logging, metrics)
//!       │
//!       ├──▶ evm-*  ──▶ EvmClient ──▶ EvmBroadcaster / EvmPoller / EvmQuerier ─┐
//!       │                                                                      ├──▶ TxEngine
//!       ├──▶ wasm-* ──▶ CosmosClient ──▶ CosmosPoller / CosmosQuerier ─────────┘
//!       │
//!       └──▶ evm-watch ──▶ EventWatcher ──▶ ObservedValueCache
//! ```
//!
//! Submitting CosmWasm transactions needs a `CosmosSigner`, which callers
//! provide when embedding the library; the CLI only reads from CosmWasm
//! chains.

use std::path::PathBuf;
use std::sync::Arc;

use alloy::primitives::{hex, U256};
use alloy::rpc::types::Log;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use chainio::config::{load_config, ChainioConfig};
use chainio::cosmos::{CosmosClient, CosmosPoller, CosmosQuerier};
use chainio::engine::{
    ConfirmationPoller, ContractQuerier, FeeParams, Funds, SubmissionHandle, TxEngine, TxReceipt,
    TxRequest,
};
use chainio::events::{EventDecoder, EventWatcher, ObservedValueCache};
use chainio::evm::{EvmBroadcaster, EvmClient, EvmPoller, EvmQuerier, Wallet};
use chainio::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "chainio")]
#[command(about = "Submit and track transactions on CosmWasm and EVM chains", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Call a read-only EVM contract function
    EvmQuery {
        #[arg(long)]
        contract: String,
        /// ABI-encoded calldata, hex
        #[arg(long)]
        calldata: String,
    },
    /// Run a CosmWasm smart query
    WasmQuery {
        #[arg(long)]
        contract: String,
        /// JSON query message
        #[arg(long)]
        query: String,
    },
    /// Look up an EVM transaction receipt once
    EvmStatus {
        #[arg(long)]
        tx: String,
    },
    /// Look up a Cosmos transaction once
    WasmStatus {
        #[arg(long)]
        tx: String,
    },
    /// Sign, broadcast and confirm an EVM contract call
    EvmExecute {
        #[arg(long)]
        contract: String,
        /// ABI-encoded calldata, hex
        #[arg(long)]
        calldata: String,
        /// Native value in wei
        #[arg(long, default_value = "0")]
        value: String,
        /// Estimate gas even when a limit is configured
        #[arg(long)]
        simulate: bool,
    },
    /// Watch contract logs and print what was observed on exit
    EvmWatch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ChainioConfig::default(),
    };

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

    match cli.command {
        Commands::EvmQuery { contract, calldata } => {
            let client = EvmClient::new(&config.evm)?;
            let output = EvmQuerier::new(client)
                .query(&contract, &hex::decode(calldata)?)
                .await?;
            println!("{}", hex::encode_prefixed(output));
        }
        Commands::WasmQuery { contract, query } => {
            let client = CosmosClient::from_config(&config.cosmos)?;
            let output = CosmosQuerier::new(client)
                .query(&contract, query.as_bytes())
                .await?;
            println!("{}", String::from_utf8_lossy(&output));
        }
        Commands::EvmStatus { tx } => {
            let poller = EvmPoller::new(EvmClient::new(&config.evm)?);
            print_status(poller.status(&SubmissionHandle::new(tx)).await?)?;
        }
        Commands::WasmStatus { tx } => {
            let poller = CosmosPoller::new(CosmosClient::from_config(&config.cosmos)?);
            print_status(poller.status(&SubmissionHandle::new(tx)).await?)?;
        }
        Commands::EvmExecute {
            contract,
            calldata,
            value,
            simulate,
        } => {
            let engine = evm_engine(&config).await?;
            let request = TxRequest::new(contract, hex::decode(calldata)?)
                .with_funds(Funds::Native(value.parse::<U256>()?))
                .with_simulate(simulate);

            let cancel = cancel_on_ctrl_c();
            let receipt = engine
                .submit(&request, FeeParams::Evm(config.evm.fee()), &cancel)
                .await?;
            println!("{}", serde_json::to_string_pretty(&receipt)?);
        }
        Commands::EvmWatch => {
            let client = EvmClient::connect(&config.evm).await?;
            let cache = ObservedValueCache::new();
            let watcher = EventWatcher::new(client, &config.events, raw_log_decoder(), cache.clone())?;

            watcher.run(cancel_on_ctrl_c()).await;
            println!("{}", serde_json::to_string_pretty(&cache.snapshot())?);
        }
    }

    Ok(())
}

async fn evm_engine(config: &ChainioConfig) -> Result<TxEngine, Box<dyn std::error::Error>> {
    let client = EvmClient::connect(&config.evm).await?;
    let wallet = Wallet::from_env(&config.signer.private_key_env, config.evm.chain_id)?;

    let engine = TxEngine::new(
        Arc::new(EvmBroadcaster::new(
            client.clone(),
            wallet,
            config.evm.max_gas_price_gwei,
        )),
        Arc::new(EvmPoller::new(client.clone())),
        Arc::new(EvmQuerier::new(client)),
        config.tx_manager.to_params(),
    )?;
    Ok(engine)
}

/// Key each log by transaction hash and log index; the value is the hex data.
fn raw_log_decoder() -> EventDecoder {
    Arc::new(|log: &Log| {
        let tx_hash = log.transaction_hash?;
        let index = log.log_index.unwrap_or_default();
        Some((
            format!("{}:{}", tx_hash, index),
            hex::encode_prefixed(&log.inner.data.data),
        ))
    })
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling");
            trigger.cancel();
        }
    });
    cancel
}

fn print_status(receipt: Option<TxReceipt>) -> Result<(), Box<dyn std::error::Error>> {
    match receipt {
        Some(receipt) => println!("{}", serde_json::to_string_pretty(&receipt)?),
        None => println!("pending"),
    }
    Ok(())
}
