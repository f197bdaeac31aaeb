//! REST gateway client for a Cosmos SDK node.
//!
//! # Responsibilities
//! - Broadcast signed `TxRaw` bytes in sync mode (CheckTx only)
//! - Look up transactions by hash
//! - Simulate transactions for gas estimation
//! - Run CosmWasm smart queries
//!
//! # Design Decisions
//! - One `reqwest::Client` per node, shared by clones
//! - Every request carries the configured timeout
//! - A 404 on tx lookup means "not indexed yet", not an error

use std::time::Duration;

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine as _;
use reqwest::{Response, StatusCode};

use crate::config::CosmosConfig;
use crate::cosmos::types::{
    BroadcastTxRequest, GatewayError, SimulateRequest, SimulateResponse, SmartQueryResponse,
    TxResponse, TxResponseEnvelope,
};
use crate::engine::error::{EngineError, EngineResult};

const BROADCAST_MODE_SYNC: &str = "BROADCAST_MODE_SYNC";

/// Cosmos REST client.
#[derive(Clone)]
pub struct CosmosClient {
    http: reqwest::Client,
    base_url: String,
    chain_id: String,
}

impl CosmosClient {
    /// Create a client for `rest_url`.
    ///
    /// # Arguments
    /// * `rest_url` - Gateway base URL, e.g. `http://localhost:1317`
    /// * `chain_id` - Chain ID placed into every unsigned transaction
    /// * `timeout` - Per-request timeout
    pub fn new(rest_url: &str, chain_id: impl Into<String>, timeout: Duration) -> EngineResult<Self> {
        let parsed: url::Url = rest_url.parse().map_err(|e| {
            EngineError::Configuration(format!("Invalid REST URL '{}': {}", rest_url, e))
        })?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            chain_id: chain_id.into(),
        })
    }

    pub fn from_config(config: &CosmosConfig) -> EngineResult<Self> {
        Self::new(
            &config.rest_url,
            config.chain_id.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// Submit signed bytes and wait for CheckTx only.
    ///
    /// The returned response may carry a nonzero code; interpreting it is
    /// left to the caller.
    pub async fn broadcast_sync(&self, tx_bytes: &[u8]) -> EngineResult<TxResponse> {
        let encoded = STANDARD.encode(tx_bytes);
        let body = BroadcastTxRequest {
            tx_bytes: &encoded,
            mode: BROADCAST_MODE_SYNC,
        };

        let response = self
            .http
            .post(self.url("/cosmos/tx/v1beta1/txs"))
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Broadcast(format!("broadcast request failed: {}", e)))?;

        let response = ensure_success(response).await.map_err(EngineError::Broadcast)?;
        let envelope: TxResponseEnvelope = response
            .json()
            .await
            .map_err(|e| EngineError::Broadcast(format!("invalid broadcast response: {}", e)))?;
        Ok(envelope.tx_response)
    }

    /// Look up an included transaction. `Ok(None)` while the node does not
    /// know the hash.
    pub async fn get_tx(&self, tx_hash: &str) -> EngineResult<Option<TxResponse>> {
        let response = self
            .http
            .get(self.url(&format!("/cosmos/tx/v1beta1/txs/{}", tx_hash)))
            .send()
            .await
            .map_err(|e| EngineError::Query(format!("tx lookup failed: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = ensure_success(response).await.map_err(EngineError::Query)?;
        let envelope: TxResponseEnvelope = response
            .json()
            .await
            .map_err(|e| EngineError::Query(format!("invalid tx response: {}", e)))?;
        Ok(Some(envelope.tx_response))
    }

    /// Simulate signed bytes and return the gas used.
    pub async fn simulate(&self, tx_bytes: &[u8]) -> EngineResult<u64> {
        let encoded = STANDARD.encode(tx_bytes);
        let response = self
            .http
            .post(self.url("/cosmos/tx/v1beta1/simulate"))
            .json(&SimulateRequest { tx_bytes: &encoded })
            .send()
            .await
            .map_err(|e| EngineError::Broadcast(format!("simulation request failed: {}", e)))?;

        let response = ensure_success(response)
            .await
            .map_err(|e| EngineError::Broadcast(format!("simulation failed: {}", e)))?;
        let simulated: SimulateResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Broadcast(format!("invalid simulate response: {}", e)))?;
        Ok(simulated.gas_info.gas_used)
    }

    /// Run a CosmWasm smart query and return the JSON-encoded result.
    pub async fn smart_query(&self, contract: &str, query: &[u8]) -> EngineResult<Vec<u8>> {
        let encoded = URL_SAFE.encode(query);
        let response = self
            .http
            .get(self.url(&format!(
                "/cosmwasm/wasm/v1/contract/{}/smart/{}",
                contract, encoded
            )))
            .send()
            .await
            .map_err(|e| EngineError::Query(format!("smart query failed: {}", e)))?;

        let response = ensure_success(response).await.map_err(EngineError::Query)?;
        let result: SmartQueryResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Query(format!("invalid smart query response: {}", e)))?;

        serde_json::to_vec(&result.data).map_err(|e| EngineError::Encoding(e.to_string()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Turn a non-2xx response into a readable message, preferring the gateway's
/// own error text.
async fn ensure_success(response: Response) -> Result<Response, String> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<GatewayError>(&body) {
        Ok(err) if !err.message.is_empty() => err.message,
        _ => body,
    };
    Err(format!("HTTP {}: {}", status.as_u16(), message))
}

impl std::fmt::Debug for CosmosClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CosmosClient")
            .field("rest_url", &self.base_url)
            .field("chain_id", &self.chain_id)
            .finish()
    }
}
