//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the SDK.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::types::{CosmosFee, DecCoin, EvmFee, TxManagerParams};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ChainioConfig {
    /// CosmWasm chain connection.
    pub cosmos: CosmosConfig,

    /// EVM chain connection.
    pub evm: EvmConfig,

    /// Key storage settings.
    pub signer: SignerConfig,

    /// Retry and confirmation settings.
    pub tx_manager: TxManagerConfig,

    /// Contract event watcher.
    pub events: EventsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Cosmos SDK chain configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CosmosConfig {
    /// REST (gRPC-gateway) endpoint, e.g. "http://localhost:1317".
    pub rest_url: String,

    /// Chain ID (e.g., "osmosis-1").
    pub chain_id: String,

    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Default gas limit when simulation is off.
    pub gas_limit: u64,

    /// Multiplier applied to simulated gas.
    pub gas_adjustment: f64,

    /// Gas price denom.
    pub gas_price_denom: String,

    /// Gas price amount per unit of gas.
    pub gas_price_amount: f64,
}

impl Default for CosmosConfig {
    fn default() -> Self {
        Self {
            rest_url: "http://localhost:1317".to_string(),
            chain_id: "localnet-1".to_string(),
            request_timeout_secs: 10,
            gas_limit: 200_000,
            gas_adjustment: 1.3,
            gas_price_denom: "stake".to_string(),
            gas_price_amount: 0.025,
        }
    }
}

impl CosmosConfig {
    /// Starting fee parameters for a submission.
    pub fn fee(&self) -> CosmosFee {
        CosmosFee {
            gas_limit: self.gas_limit,
            gas_adjustment: self.gas_adjustment,
            gas_price: DecCoin::new(self.gas_price_denom.clone(), self.gas_price_amount),
        }
    }
}

/// EVM chain configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EvmConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    #[serde(default)]
    pub failover_urls: Vec<String>,

    /// Chain ID (e.g., 1 for Ethereum mainnet, 31337 for local Anvil).
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Fixed gas limit; estimated per attempt when absent.
    pub gas_limit: Option<u64>,

    /// Multiplier on the estimated fee cap (1.0 = estimated).
    pub fee_cap_adjustment: f64,

    /// Headroom on estimated gas (1.2 = 20% buffer).
    pub gas_limit_adjustment: f64,

    /// Maximum fee cap in gwei (protection against spikes).
    pub max_gas_price_gwei: u64,
}

impl Default for EvmConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: 31337,
            rpc_timeout_secs: 10,
            gas_limit: None,
            fee_cap_adjustment: 1.0,
            gas_limit_adjustment: 1.2,
            max_gas_price_gwei: 500,
        }
    }
}

impl EvmConfig {
    /// Starting fee parameters for a submission.
    pub fn fee(&self) -> EvmFee {
        EvmFee {
            gas_limit: self.gas_limit,
            fee_cap_adjustment: self.fee_cap_adjustment,
            gas_limit_adjustment: self.gas_limit_adjustment,
            nonce: None,
        }
    }
}

/// Where signing keys come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyBackend {
    /// Hex private key in an environment variable.
    Env,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SignerConfig {
    pub backend: KeyBackend,

    /// Environment variable holding the private key.
    pub private_key_env: String,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            backend: KeyBackend::Env,
            private_key_env: "CHAINIO_PRIVATE_KEY".to_string(),
        }
    }
}

/// Retry and confirmation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TxManagerConfig {
    /// Total broadcast attempts, including the first.
    pub max_retries: u32,

    /// Delay between failed broadcasts in milliseconds.
    pub retry_interval_ms: u64,

    /// Confirmation polling window in seconds.
    pub confirmation_timeout_secs: u64,

    /// Delay between confirmation lookups in milliseconds.
    pub poll_interval_ms: u64,

    /// Fee multiplier applied after each failed broadcast.
    pub gas_price_adjustment_rate: f64,
}

impl Default for TxManagerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_interval_ms: 1000,
            confirmation_timeout_secs: 60,
            poll_interval_ms: 1000,
            gas_price_adjustment_rate: 1.1,
        }
    }
}

impl TxManagerConfig {
    pub fn to_params(&self) -> TxManagerParams {
        TxManagerParams {
            max_retries: self.max_retries,
            retry_interval: Duration::from_millis(self.retry_interval_ms),
            confirmation_timeout: Duration::from_secs(self.confirmation_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            gas_price_adjustment_rate: self.gas_price_adjustment_rate,
        }
    }
}

/// EVM contract event watcher configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Enable the watcher.
    pub enabled: bool,

    /// Address of the watched contract.
    pub contract_address: String,

    /// Polling interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Blocks to stay behind the head before reading logs.
    pub confirmation_blocks: u64,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            contract_address: String::new(),
            poll_interval_ms: 5000,
            confirmation_blocks: 2,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
