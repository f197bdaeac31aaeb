//! EVM JSON-RPC client with timeout and failover.
//!
//! # Responsibilities
//! - Connect to the primary endpoint plus any failover endpoints
//! - Query chain state (chain ID, block number, nonces, receipts, logs)
//! - Estimate EIP-1559 fees and gas, run `eth_call`
//! - Submit raw signed transactions
//! - Provide health check for RPC connectivity
//!
//! # Design Decisions
//! - Every call tries providers in order; the first answer wins
//! - Each provider gets the full per-call timeout before the next is tried
//! - Errors are reported with the last provider's message for context

use std::future::Future;
use std::time::Duration;

use alloy::eips::eip1559::Eip1559Estimation;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log, TransactionReceipt, TransactionRequest};
use alloy::transports::TransportResult;
use thiserror::Error;
use tokio::time::timeout;

use crate::config::EvmConfig;
use crate::observability::metrics;

/// Errors raised by [`EvmClient`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    /// URL could not be parsed.
    #[error("Invalid RPC URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Every provider failed or timed out.
    #[error("All RPC providers failed to {op}: {last_error}")]
    Exhausted { op: &'static str, last_error: String },

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

/// EVM RPC client wrapper with failover support.
#[derive(Clone)]
pub struct EvmClient {
    /// Providers in priority order (primary first).
    providers: Vec<DynProvider>,
    urls: Vec<String>,
    chain_id: u64,
    timeout_duration: Duration,
}

impl EvmClient {
    /// Build a client without touching the network.
    ///
    /// An invalid primary URL is an error; invalid failover URLs are skipped
    /// with a warning.
    pub fn new(config: &EvmConfig) -> Result<Self, RpcError> {
        let mut providers = Vec::new();
        let mut urls = Vec::new();

        let primary: url::Url = config.rpc_url.parse().map_err(|e: url::ParseError| {
            RpcError::InvalidUrl {
                url: config.rpc_url.clone(),
                reason: e.to_string(),
            }
        })?;
        providers.push(ProviderBuilder::new().connect_http(primary).erased());
        urls.push(config.rpc_url.clone());

        for url_str in &config.failover_urls {
            match url_str.parse::<url::Url>() {
                Ok(url) => {
                    providers.push(ProviderBuilder::new().connect_http(url).erased());
                    urls.push(url_str.clone());
                }
                Err(_) => tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL"),
            }
        }

        Ok(Self {
            providers,
            urls,
            chain_id: config.chain_id,
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
        })
    }

    /// Build a client and check that it points at the configured chain.
    ///
    /// A failed check is logged, not returned, so an unreachable node at
    /// startup does not prevent the client from being created.
    pub async fn connect(config: &EvmConfig) -> Result<Self, RpcError> {
        let client = Self::new(config)?;

        match client.verify_chain_id().await {
            Ok(()) => {
                tracing::info!(
                    rpc_url = %config.rpc_url,
                    chain_id = config.chain_id,
                    failovers = client.providers.len() - 1,
                    "EVM client initialized"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "EVM client initialized but chain verification failed"
                );
            }
        }

        Ok(client)
    }

    /// Configured chain ID.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> Result<(), RpcError> {
        let actual = self.get_chain_id().await?;
        if actual != self.chain_id {
            return Err(RpcError::ChainMismatch {
                expected: self.chain_id,
                actual,
            });
        }
        Ok(())
    }

    /// Run `call` against each provider in turn until one answers.
    async fn with_failover<T, F, Fut>(&self, op: &'static str, call: F) -> Result<T, RpcError>
    where
        F: Fn(DynProvider) -> Fut,
        Fut: Future<Output = TransportResult<T>>,
    {
        let mut last_error = String::from("no providers configured");

        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, call(provider.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, op, error = %e, "RPC error, trying next provider");
                    last_error = e.to_string();
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, op, "RPC timeout, trying next provider");
                    last_error = format!("timed out after {:?}", self.timeout_duration);
                }
            }
        }

        Err(RpcError::Exhausted { op, last_error })
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> Result<u64, RpcError> {
        self.with_failover("get chain id", |p| async move { p.get_chain_id().await })
            .await
    }

    /// Get the latest block number.
    pub async fn get_block_number(&self) -> Result<u64, RpcError> {
        self.with_failover("get block number", |p| async move {
            p.get_block_number().await
        })
        .await
    }

    /// Get the pending transaction count (next nonce) for an address.
    pub async fn get_transaction_count(&self, address: Address) -> Result<u64, RpcError> {
        self.with_failover("get transaction count", |p| async move {
            p.get_transaction_count(address).pending().await
        })
        .await
    }

    /// Get a transaction receipt by hash.
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, RpcError> {
        self.with_failover("get receipt", |p| async move {
            p.get_transaction_receipt(tx_hash).await
        })
        .await
    }

    /// Current EIP-1559 fee estimate in wei.
    pub async fn estimate_eip1559_fees(&self) -> Result<Eip1559Estimation, RpcError> {
        self.with_failover("estimate fees", |p| async move {
            p.estimate_eip1559_fees().await
        })
        .await
    }

    /// Estimate gas for a transaction.
    pub async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, RpcError> {
        self.with_failover("estimate gas", |p| {
            let tx = tx.clone();
            async move { p.estimate_gas(tx).await }
        })
        .await
    }

    /// Execute a read-only call against the latest block.
    pub async fn call(&self, tx: &TransactionRequest) -> Result<Bytes, RpcError> {
        self.with_failover("call", |p| {
            let tx = tx.clone();
            async move { p.call(tx).await }
        })
        .await
    }

    /// Submit an EIP-2718 encoded signed transaction.
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash, RpcError> {
        self.with_failover("send raw transaction", |p| async move {
            let pending = p.send_raw_transaction(raw).await?;
            Ok(*pending.tx_hash())
        })
        .await
    }

    /// Fetch logs matching a filter.
    pub async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, RpcError> {
        self.with_failover("get logs", |p| async move { p.get_logs(filter).await })
            .await
    }

    /// Check if the chain is reachable.
    ///
    /// Returns true if we can query the block number.
    pub async fn is_healthy(&self) -> bool {
        let healthy = self.get_block_number().await.is_ok();
        metrics::record_rpc_health(&self.urls[0], healthy);
        healthy
    }
}

impl std::fmt::Debug for EvmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmClient")
            .field("rpc_urls", &self.urls)
            .field("chain_id", &self.chain_id)
            .field("timeout", &self.timeout_duration)
            .finish()
    }
}
