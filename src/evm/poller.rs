//! Receipt polling and `eth_call` queries.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use async_trait::async_trait;

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::poller::ConfirmationPoller;
use crate::engine::query::ContractQuerier;
use crate::engine::types::{SubmissionHandle, TxReceipt};
use crate::evm::client::EvmClient;

/// Code reported for reverted transactions.
pub const REVERTED_CODE: u32 = 1;

/// Polls `eth_getTransactionReceipt`.
#[derive(Debug, Clone)]
pub struct EvmPoller {
    client: EvmClient,
}

impl EvmPoller {
    pub fn new(client: EvmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ConfirmationPoller for EvmPoller {
    async fn status(&self, handle: &SubmissionHandle) -> EngineResult<Option<TxReceipt>> {
        let tx_hash: TxHash = handle
            .as_str()
            .parse()
            .map_err(|e| EngineError::Query(format!("invalid tx hash '{}': {}", handle, e)))?;

        let receipt = self
            .client
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| EngineError::Query(e.to_string()))?;

        Ok(receipt.map(|r| receipt_from(handle, &r)))
    }
}

fn receipt_from(handle: &SubmissionHandle, receipt: &TransactionReceipt) -> TxReceipt {
    let (code, log) = if receipt.status() {
        (0, String::new())
    } else {
        (REVERTED_CODE, "execution reverted".to_string())
    };

    TxReceipt {
        tx_hash: handle.to_string(),
        height: receipt.block_number.unwrap_or_default(),
        code,
        log,
        data: Vec::new(),
        gas_used: receipt.gas_used,
    }
}

/// Read-only contract calls.
#[derive(Debug, Clone)]
pub struct EvmQuerier {
    client: EvmClient,
}

impl EvmQuerier {
    pub fn new(client: EvmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContractQuerier for EvmQuerier {
    async fn query(&self, address: &str, query: &[u8]) -> EngineResult<Vec<u8>> {
        let to: Address = address.parse().map_err(|e| {
            EngineError::Encoding(format!("invalid contract address '{}': {}", address, e))
        })?;

        let tx = TransactionRequest::default()
            .with_to(to)
            .with_input(Bytes::copy_from_slice(query));

        let output = self
            .client
            .call(&tx)
            .await
            .map_err(|e| EngineError::Query(e.to_string()))?;
        Ok(output.to_vec())
    }
}
