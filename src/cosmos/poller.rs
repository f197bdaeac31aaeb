//! Transaction lookup and contract queries over the REST gateway.

use alloy::primitives::hex;
use async_trait::async_trait;

use crate::cosmos::client::CosmosClient;
use crate::cosmos::types::TxResponse;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::poller::ConfirmationPoller;
use crate::engine::query::ContractQuerier;
use crate::engine::types::{SubmissionHandle, TxReceipt};

/// Polls `/cosmos/tx/v1beta1/txs/{hash}`.
#[derive(Debug, Clone)]
pub struct CosmosPoller {
    client: CosmosClient,
}

impl CosmosPoller {
    pub fn new(client: CosmosClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ConfirmationPoller for CosmosPoller {
    async fn status(&self, handle: &SubmissionHandle) -> EngineResult<Option<TxReceipt>> {
        let tx = self.client.get_tx(handle.as_str()).await?;
        Ok(tx.map(|tx| receipt_from(handle, tx)))
    }
}

fn receipt_from(handle: &SubmissionHandle, tx: TxResponse) -> TxReceipt {
    // Older nodes return raw bytes instead of hex here.
    let data = hex::decode(&tx.data).unwrap_or_else(|_| tx.data.into_bytes());
    let tx_hash = if tx.txhash.is_empty() {
        handle.to_string()
    } else {
        tx.txhash
    };

    TxReceipt {
        tx_hash,
        height: tx.height,
        code: tx.code,
        log: tx.raw_log,
        data,
        gas_used: tx.gas_used,
    }
}

/// CosmWasm smart queries.
#[derive(Debug, Clone)]
pub struct CosmosQuerier {
    client: CosmosClient,
}

impl CosmosQuerier {
    pub fn new(client: CosmosClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContractQuerier for CosmosQuerier {
    async fn query(&self, address: &str, query: &[u8]) -> EngineResult<Vec<u8>> {
        serde_json::from_slice::<serde_json::Value>(query)
            .map_err(|e| EngineError::Encoding(format!("query is not JSON: {}", e)))?;
        self.client.smart_query(address, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_decodes_hex_data() {
        let tx = TxResponse {
            height: 42,
            txhash: "HASH".to_string(),
            code: 0,
            data: "0a0b".to_string(),
            gas_used: 1000,
            ..Default::default()
        };
        let receipt = receipt_from(&SubmissionHandle::new("HASH"), tx);
        assert_eq!(receipt.data, vec![0x0a, 0x0b]);
        assert_eq!(receipt.height, 42);
        assert!(receipt.is_success());
    }

    #[test]
    fn test_receipt_keeps_failure_code() {
        let tx = TxResponse {
            height: 9,
            code: 5,
            raw_log: "insufficient funds".to_string(),
            ..Default::default()
        };
        let receipt = receipt_from(&SubmissionHandle::new("H"), tx);
        assert_eq!(receipt.tx_hash, "H");
        assert_eq!(receipt.code, 5);
        assert_eq!(receipt.log, "insufficient funds");
    }
}
