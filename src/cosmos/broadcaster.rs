//! CosmWasm execute broadcasting.
//!
//! # Data Flow
//! ```text
//! TxRequest + CosmosFee
//!     → ExecuteMsg (payload must be JSON)
//!     → [simulate] sign with provisional gas → /simulate → gas_used × adjustment
//!     → sign with final gas and fee = ceil(gas_limit × gas_price)
//!     → broadcast (sync) → txhash
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::cosmos::client::CosmosClient;
use crate::cosmos::signer::CosmosSigner;
use crate::cosmos::types::{ExecuteMsg, Fee, UnsignedTx};
use crate::engine::broadcaster::Broadcaster;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::types::{Coin, CosmosFee, FeeParams, Funds, SubmissionHandle, TxRequest};

pub struct CosmosBroadcaster {
    client: CosmosClient,
    signer: Arc<dyn CosmosSigner>,
}

impl CosmosBroadcaster {
    pub fn new(client: CosmosClient, signer: Arc<dyn CosmosSigner>) -> Self {
        Self { client, signer }
    }

    fn execute_msg(&self, request: &TxRequest) -> EngineResult<ExecuteMsg> {
        let msg: serde_json::Value = serde_json::from_slice(&request.payload)
            .map_err(|e| EngineError::Encoding(format!("execute message is not JSON: {}", e)))?;

        let funds = match &request.funds {
            None => Vec::new(),
            Some(Funds::Coins(coins)) => coins.clone(),
            Some(Funds::Native(_)) => {
                return Err(EngineError::Configuration(
                    "native wei value cannot be attached to a CosmWasm call".to_string(),
                ))
            }
        };

        Ok(ExecuteMsg {
            sender: self.signer.address().to_string(),
            contract: request.target.clone(),
            msg,
            funds,
        })
    }

    async fn sign(
        &self,
        msg: &ExecuteMsg,
        memo: &str,
        fee: &CosmosFee,
        gas_limit: u64,
    ) -> EngineResult<Vec<u8>> {
        let tx = UnsignedTx {
            chain_id: self.client.chain_id().to_string(),
            msg: msg.clone(),
            memo: memo.to_string(),
            fee: Fee {
                amount: vec![Coin::new(
                    fee.gas_price.denom.clone(),
                    fee.fee_amount(gas_limit),
                )],
                gas_limit,
            },
        };
        self.signer.sign(&tx).await
    }
}

#[async_trait]
impl Broadcaster for CosmosBroadcaster {
    fn backend(&self) -> &'static str {
        "cosmos"
    }

    async fn send(
        &self,
        request: &TxRequest,
        fee: &mut FeeParams,
    ) -> EngineResult<SubmissionHandle> {
        let FeeParams::Cosmos(fee) = &*fee else {
            return Err(EngineError::Configuration(format!(
                "{} fee parameters given to the cosmos backend",
                fee.backend()
            )));
        };

        let msg = self.execute_msg(request)?;

        let mut gas_limit = fee.gas_limit;
        if request.simulate {
            let provisional = self.sign(&msg, &request.memo, fee, gas_limit).await?;
            let gas_used = self.client.simulate(&provisional).await?;
            gas_limit = fee.adjusted_gas(gas_used);
            tracing::debug!(gas_used, gas_limit, "Simulated execute message");
        }

        let tx_bytes = self.sign(&msg, &request.memo, fee, gas_limit).await?;
        let response = self.client.broadcast_sync(&tx_bytes).await?;

        if response.code != 0 {
            return Err(EngineError::Broadcast(format!(
                "CheckTx rejected (code {}): {}",
                response.code, response.raw_log
            )));
        }

        Ok(SubmissionHandle::new(response.txhash))
    }
}
