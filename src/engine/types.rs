//! Backend-agnostic request, fee and result types.

use std::fmt;
use std::time::Duration;

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

use crate::engine::error::{EngineError, EngineResult};

/// A single contract call, independent of the chain it targets.
///
/// The request is immutable once built. Fees live in [`FeeParams`] so the
/// coordinator can escalate them between attempts without touching the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    /// Contract address (bech32 for CosmWasm, hex for EVM).
    pub target: String,
    /// Opaque message body: JSON for CosmWasm, ABI-encoded calldata for EVM.
    pub payload: Vec<u8>,
    /// Funds or native value attached to the call.
    pub funds: Option<Funds>,
    /// Human readable memo. Ignored by the EVM backend.
    pub memo: String,
    /// Estimate gas before sending instead of trusting the configured limit.
    pub simulate: bool,
}

impl TxRequest {
    /// Create a request with no funds, an empty memo and simulation off.
    pub fn new(target: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            target: target.into(),
            payload: payload.into(),
            funds: None,
            memo: String::new(),
            simulate: false,
        }
    }

    pub fn with_funds(mut self, funds: Funds) -> Self {
        self.funds = Some(funds);
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    pub fn with_simulate(mut self, simulate: bool) -> Self {
        self.simulate = simulate;
        self
    }
}

/// Value attached to a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Funds {
    /// Bank coins sent along with a CosmWasm execute message.
    Coins(Vec<Coin>),
    /// Native value in wei for an EVM call.
    Native(U256),
}

/// An integer coin amount.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: u128,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

/// A decimal coin, used for gas prices such as `0.025uatom`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecCoin {
    pub denom: String,
    pub amount: f64,
}

impl DecCoin {
    pub fn new(denom: impl Into<String>, amount: f64) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

/// Fee settings for a Cosmos SDK chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CosmosFee {
    /// Gas limit used when simulation is off, and as the provisional limit
    /// for the simulation round-trip.
    pub gas_limit: u64,
    /// Multiplier applied to simulated gas usage.
    pub gas_adjustment: f64,
    /// Price per unit of gas. Escalated on retry.
    pub gas_price: DecCoin,
}

impl Default for CosmosFee {
    fn default() -> Self {
        Self {
            gas_limit: 200_000,
            gas_adjustment: 1.3,
            gas_price: DecCoin::new("stake", 0.025),
        }
    }
}

/// Fee settings for an EVM chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvmFee {
    /// Fixed gas limit. `None` means estimate on every attempt.
    pub gas_limit: Option<u64>,
    /// Multiplier applied to the estimated EIP-1559 fee cap and tip.
    /// Escalated on retry.
    pub fee_cap_adjustment: f64,
    /// Headroom multiplier applied to estimated gas.
    pub gas_limit_adjustment: f64,
    /// Nonce taken by the first attempt of a submission. Later attempts
    /// reuse it, so a retry replaces rather than duplicates.
    #[serde(default)]
    pub nonce: Option<u64>,
}

impl Default for EvmFee {
    fn default() -> Self {
        Self {
            gas_limit: None,
            fee_cap_adjustment: 1.0,
            gas_limit_adjustment: 1.2,
            nonce: None,
        }
    }
}

/// Backend-specific fee description for one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeeParams {
    Cosmos(CosmosFee),
    Evm(EvmFee),
}

impl FeeParams {
    /// Name of the backend these fees belong to.
    pub fn backend(&self) -> &'static str {
        match self {
            FeeParams::Cosmos(_) => "cosmos",
            FeeParams::Evm(_) => "evm",
        }
    }
}

/// Retry and confirmation settings for the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TxManagerParams {
    /// Total number of broadcast attempts, including the first.
    pub max_retries: u32,
    /// Pause between a failed broadcast and the next attempt.
    pub retry_interval: Duration,
    /// Bound on confirmation polling after a successful broadcast.
    pub confirmation_timeout: Duration,
    /// Interval between confirmation lookups.
    pub poll_interval: Duration,
    /// Factor applied to the fee price after each failed broadcast.
    pub gas_price_adjustment_rate: f64,
}

impl Default for TxManagerParams {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_interval: Duration::from_secs(1),
            confirmation_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(1),
            gas_price_adjustment_rate: 1.1,
        }
    }
}

impl TxManagerParams {
    /// Reject settings the coordinator cannot honour.
    pub fn validate(&self) -> EngineResult<()> {
        if self.max_retries < 1 {
            return Err(EngineError::Configuration(
                "max_retries must be at least 1".to_string(),
            ));
        }
        if self.confirmation_timeout.is_zero() {
            return Err(EngineError::Configuration(
                "confirmation_timeout must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(EngineError::Configuration(
                "poll_interval must be greater than zero".to_string(),
            ));
        }
        if !self.gas_price_adjustment_rate.is_finite() || self.gas_price_adjustment_rate < 1.0 {
            return Err(EngineError::Configuration(format!(
                "gas_price_adjustment_rate must be >= 1.0, got {}",
                self.gas_price_adjustment_rate
            )));
        }
        Ok(())
    }
}

/// Transaction hash returned by a node that accepted a broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionHandle(String);

impl SubmissionHandle {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmissionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SubmissionHandle {
    fn from(hash: String) -> Self {
        Self(hash)
    }
}

/// An included transaction as reported by the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub height: u64,
    /// Execution code. Zero means success on both backends; reverted EVM
    /// transactions are reported as code 1.
    pub code: u32,
    /// Raw log (Cosmos) or a short status description (EVM).
    pub log: String,
    /// Data returned by the execution, if any.
    pub data: Vec<u8>,
    pub gas_used: u64,
}

impl TxReceipt {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// Terminal outcome of a submission.
pub type TxResult = Result<TxReceipt, EngineError>;
