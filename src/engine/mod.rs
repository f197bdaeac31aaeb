//! Transaction broadcast and confirmation engine.
//!
//! # Data Flow
//! ```text
//! caller (per-contract message builders)
//!     → TxEngine::submit(TxRequest, FeeParams)
//!     → coordinator.rs (bounded retry loop)
//!         → broadcaster.rs (simulate, sign, submit; backend specific)
//!         → gas.rs (escalate fees after a failed broadcast)
//!     → poller.rs (poll by hash until receipt, failure, timeout)
//!     → TxReceipt | EngineError
//!
//! caller
//!     → TxEngine::query(address, bytes)
//!     → query.rs (single request/response)
//! ```
//!
//! # Design Decisions
//! - The coordinator is backend-agnostic; Cosmos and EVM differ only in
//!   their Broadcaster / ConfirmationPoller / ContractQuerier implementations
//! - Every suspension point honours a `CancellationToken`
//! - Fees are owned per submission; nothing mutable is shared between calls

pub mod broadcaster;
pub mod coordinator;
pub mod error;
pub mod gas;
pub mod poller;
pub mod query;
pub mod types;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

pub use broadcaster::Broadcaster;
pub use coordinator::RetryCoordinator;
pub use error::{EngineError, EngineResult};
pub use poller::ConfirmationPoller;
pub use query::ContractQuerier;
pub use types::{
    Coin, CosmosFee, DecCoin, EvmFee, FeeParams, Funds, SubmissionHandle, TxManagerParams,
    TxReceipt, TxRequest, TxResult,
};

/// Entry point for one chain: submit transactions and query contracts.
///
/// Cheap to clone and safe to share between tasks.
#[derive(Clone)]
pub struct TxEngine {
    coordinator: RetryCoordinator,
    poller: Arc<dyn ConfirmationPoller>,
    querier: Arc<dyn ContractQuerier>,
    params: TxManagerParams,
}

impl TxEngine {
    /// Assemble an engine from backend parts.
    ///
    /// Fails with a configuration error if `params` are invalid, so a bad
    /// setup surfaces before any transaction is attempted.
    pub fn new(
        broadcaster: Arc<dyn Broadcaster>,
        poller: Arc<dyn ConfirmationPoller>,
        querier: Arc<dyn ContractQuerier>,
        params: TxManagerParams,
    ) -> EngineResult<Self> {
        params.validate()?;
        Ok(Self {
            coordinator: RetryCoordinator::new(broadcaster, poller.clone()),
            poller,
            querier,
            params,
        })
    }

    /// Default retry and confirmation settings.
    pub fn params(&self) -> &TxManagerParams {
        &self.params
    }

    /// Submit with the engine's default settings.
    pub async fn submit(
        &self,
        request: &TxRequest,
        fee: FeeParams,
        cancel: &CancellationToken,
    ) -> TxResult {
        self.coordinator
            .submit(request, fee, &self.params, cancel)
            .await
    }

    /// Submit with per-call settings.
    pub async fn submit_with(
        &self,
        request: &TxRequest,
        fee: FeeParams,
        params: &TxManagerParams,
        cancel: &CancellationToken,
    ) -> TxResult {
        self.coordinator.submit(request, fee, params, cancel).await
    }

    /// Query contract state.
    pub async fn query(&self, address: &str, query: &[u8]) -> EngineResult<Vec<u8>> {
        self.querier.query(address, query).await
    }

    /// One status lookup without waiting, for resolving a
    /// [`EngineError::ConfirmationTimeout`] out of band.
    pub async fn status(&self, tx_hash: &str) -> EngineResult<Option<TxReceipt>> {
        self.poller.status(&SubmissionHandle::new(tx_hash)).await
    }
}
