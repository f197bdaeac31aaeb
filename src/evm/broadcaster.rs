//! Transaction building, signing and submission.
//!
//! # Responsibilities
//! - Take the nonce from the chain's pending count on the first attempt and
//!   reuse it on every retry of the same submission
//! - Price the attempt from the node's EIP-1559 estimate, scaled by the
//!   escalated fee-cap adjustment
//! - Refuse attempts above the configured fee ceiling
//! - Estimate gas with headroom when asked to, or when no limit is fixed

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;

use crate::engine::broadcaster::Broadcaster;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::gas::{apply_headroom, scale_wei};
use crate::engine::types::{EvmFee, FeeParams, Funds, SubmissionHandle, TxRequest};
use crate::evm::client::EvmClient;
use crate::evm::wallet::Wallet;

const WEI_PER_GWEI: u128 = 1_000_000_000;

pub struct EvmBroadcaster {
    client: EvmClient,
    wallet: Wallet,
    /// Fee cap ceiling in wei; `None` disables the check.
    max_fee_per_gas: Option<u128>,
}

impl EvmBroadcaster {
    /// Create a broadcaster. A `max_gas_price_gwei` of zero disables the
    /// ceiling.
    pub fn new(client: EvmClient, wallet: Wallet, max_gas_price_gwei: u64) -> Self {
        let max_fee_per_gas =
            (max_gas_price_gwei > 0).then(|| max_gas_price_gwei as u128 * WEI_PER_GWEI);
        Self {
            client,
            wallet,
            max_fee_per_gas,
        }
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// Build the unpriced call: destination, value and calldata.
    fn base_request(&self, request: &TxRequest) -> EngineResult<TransactionRequest> {
        let to: Address = request.target.parse().map_err(|e| {
            EngineError::Encoding(format!("invalid contract address '{}': {}", request.target, e))
        })?;

        let value = match &request.funds {
            None => U256::ZERO,
            Some(Funds::Native(value)) => *value,
            Some(Funds::Coins(_)) => {
                return Err(EngineError::Configuration(
                    "bank coins cannot be attached to an EVM call".to_string(),
                ))
            }
        };

        Ok(TransactionRequest::default()
            .with_from(self.wallet.address())
            .with_to(to)
            .with_value(value)
            .with_input(Bytes::copy_from_slice(&request.payload))
            .with_chain_id(self.wallet.chain_id()))
    }

    /// EIP-1559 fee cap and tip for this attempt.
    async fn price(&self, fee: &EvmFee) -> EngineResult<(u128, u128)> {
        let estimate = self
            .client
            .estimate_eip1559_fees()
            .await
            .map_err(|e| EngineError::Broadcast(e.to_string()))?;

        let max_fee = scale_wei(estimate.max_fee_per_gas, fee.fee_cap_adjustment);
        let priority = scale_wei(estimate.max_priority_fee_per_gas, fee.fee_cap_adjustment)
            .min(max_fee);

        if let Some(ceiling) = self.max_fee_per_gas {
            if max_fee > ceiling {
                return Err(EngineError::Broadcast(format!(
                    "fee cap {} gwei exceeds maximum {} gwei",
                    max_fee / WEI_PER_GWEI,
                    ceiling / WEI_PER_GWEI
                )));
            }
        }

        Ok((max_fee, priority))
    }

    async fn gas_limit(
        &self,
        request: &TxRequest,
        fee: &EvmFee,
        tx: &TransactionRequest,
    ) -> EngineResult<u64> {
        match fee.gas_limit {
            Some(limit) if !request.simulate => Ok(limit),
            _ => {
                let estimate = self
                    .client
                    .estimate_gas(tx)
                    .await
                    .map_err(|e| EngineError::Broadcast(format!("gas estimation: {}", e)))?;
                let limit = apply_headroom(estimate, fee.gas_limit_adjustment);
                tracing::debug!(estimate, gas_limit = limit, "Estimated gas");
                Ok(limit)
            }
        }
    }
}

#[async_trait]
impl Broadcaster for EvmBroadcaster {
    fn backend(&self) -> &'static str {
        "evm"
    }

    async fn send(
        &self,
        request: &TxRequest,
        fee: &mut FeeParams,
    ) -> EngineResult<SubmissionHandle> {
        let backend = fee.backend();
        let FeeParams::Evm(fee) = fee else {
            return Err(EngineError::Configuration(format!(
                "{} fee parameters given to the evm backend",
                backend
            )));
        };

        let tx = self.base_request(request)?;

        let nonce = match fee.nonce {
            Some(nonce) => nonce,
            None => {
                let chain_nonce = self
                    .client
                    .get_transaction_count(self.wallet.address())
                    .await
                    .map_err(|e| EngineError::Broadcast(e.to_string()))?;
                self.wallet.set_nonce(chain_nonce);
                let nonce = self.wallet.get_and_increment_nonce();
                fee.nonce = Some(nonce);
                nonce
            }
        };

        let (max_fee, priority) = self.price(fee).await?;
        let gas_limit = self.gas_limit(request, fee, &tx).await?;

        let tx = tx
            .with_nonce(nonce)
            .with_gas_limit(gas_limit)
            .with_max_fee_per_gas(max_fee)
            .with_max_priority_fee_per_gas(priority);

        tracing::debug!(nonce, gas_limit, max_fee, priority, "Signing transaction");
        let raw = self.wallet.sign_transaction(tx).await?;

        let tx_hash = self
            .client
            .send_raw_transaction(&raw)
            .await
            .map_err(|e| EngineError::Broadcast(e.to_string()))?;

        Ok(SubmissionHandle::new(tx_hash.to_string()))
    }
}
