//! Read-only contract queries.

use async_trait::async_trait;

use crate::engine::error::EngineResult;

/// Single request/response contract read. No retry, no confirmation.
#[async_trait]
pub trait ContractQuerier: Send + Sync {
    /// Query `address` with opaque bytes (a JSON query message for CosmWasm,
    /// ABI calldata for EVM) and return the raw response bytes.
    async fn query(&self, address: &str, query: &[u8]) -> EngineResult<Vec<u8>>;
}
