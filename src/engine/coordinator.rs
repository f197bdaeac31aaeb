//! Retry coordination across broadcast attempts.
//!
//! # State Transitions
//! ```text
//! Idle → Broadcasting: submit()
//! Broadcasting → Broadcasting: broadcast failed, attempts left
//!                              (escalate fees, sleep retry_interval)
//! Broadcasting → Done(Failure): attempts exhausted → MaxRetriesExceeded
//!                               or a non-retryable error
//! Broadcasting → Confirming: node accepted the transaction
//! Confirming → Done(Success | Failure): receipt, on-chain failure,
//!                                       timeout or cancellation
//! ```
//!
//! # Design Decisions
//! - The attempt counter only governs broadcasting
//! - Never re-broadcast once a handle exists: the first submission may still land,
//!   and a re-priced duplicate could execute twice
//! - Cancellation interrupts sleeps, never a broadcast in flight. After a
//!   handle exists it is reported with the hash, as an unknown outcome
//! - Concurrent submits share nothing but the backend clients

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::engine::broadcaster::Broadcaster;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::gas;
use crate::engine::poller::{await_confirmation, ConfirmationPoller};
use crate::engine::types::{FeeParams, SubmissionHandle, TxManagerParams, TxRequest, TxResult};
use crate::observability::metrics;

/// Drives one submission from broadcast to a terminal result.
#[derive(Clone)]
pub struct RetryCoordinator {
    broadcaster: Arc<dyn Broadcaster>,
    poller: Arc<dyn ConfirmationPoller>,
}

impl RetryCoordinator {
    pub fn new(broadcaster: Arc<dyn Broadcaster>, poller: Arc<dyn ConfirmationPoller>) -> Self {
        Self {
            broadcaster,
            poller,
        }
    }

    /// Broadcast `request`, retrying with escalating fees, then wait for the
    /// transaction to be confirmed.
    ///
    /// # Arguments
    /// * `request` - The call to submit
    /// * `fee` - Fees for the first attempt; each retry escalates a private copy
    /// * `params` - Retry and confirmation bounds
    /// * `cancel` - Aborts retry sleeps and confirmation polling; an accepted
    ///   transaction's hash is carried in the cancellation error
    pub async fn submit(
        &self,
        request: &TxRequest,
        fee: FeeParams,
        params: &TxManagerParams,
        cancel: &CancellationToken,
    ) -> TxResult {
        let backend = self.broadcaster.backend();
        let span = tracing::info_span!(
            "submit",
            submission_id = %Uuid::new_v4(),
            backend,
            target = %request.target,
        );

        async move {
            params.validate()?;

            let _in_flight = metrics::InFlightGuard::new(backend);
            let result = self.run(request, fee, params, cancel).await;

            let outcome = match &result {
                Ok(_) => "success",
                Err(e) => e.kind(),
            };
            metrics::record_outcome(backend, outcome);
            result
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        request: &TxRequest,
        fee: FeeParams,
        params: &TxManagerParams,
        cancel: &CancellationToken,
    ) -> TxResult {
        let handle = self.broadcast_with_retries(request, fee, params, cancel).await?;

        let started = Instant::now();
        let result = await_confirmation(
            self.poller.as_ref(),
            &handle,
            params.confirmation_timeout,
            params.poll_interval,
            cancel,
        )
        .await;
        metrics::record_confirmation_latency(self.broadcaster.backend(), started.elapsed());
        result
    }

    async fn broadcast_with_retries(
        &self,
        request: &TxRequest,
        mut fee: FeeParams,
        params: &TxManagerParams,
        cancel: &CancellationToken,
    ) -> EngineResult<SubmissionHandle> {
        let backend = self.broadcaster.backend();
        let mut attempt: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(EngineError::cancelled());
            }
            attempt += 1;
            metrics::record_broadcast_attempt(backend);

            let started = Instant::now();
            // An in-flight send runs to completion: once the node may have the
            // transaction, cancellation has to report its hash.
            let sent = self.broadcaster.send(request, &mut fee).await;

            let error = match sent {
                Ok(handle) => {
                    metrics::record_broadcast_latency(backend, started.elapsed());
                    tracing::info!(tx_hash = %handle, attempt, "Transaction broadcast");
                    return Ok(handle);
                }
                Err(e) if !e.is_retryable() => {
                    tracing::warn!(attempt, error = %e, "Broadcast failed permanently");
                    return Err(e);
                }
                Err(e) => e,
            };

            metrics::record_broadcast_failure(backend);
            if attempt >= params.max_retries {
                tracing::warn!(attempts = attempt, error = %error, "Giving up on broadcast");
                return Err(EngineError::MaxRetriesExceeded {
                    attempts: attempt,
                    last_error: error.to_string(),
                });
            }

            fee = gas::escalate(&fee, params.gas_price_adjustment_rate);
            metrics::record_speedup(backend);
            tracing::warn!(
                attempt,
                max_retries = params.max_retries,
                error = %error,
                next_price = fee.price_level(),
                retry_in = ?params.retry_interval,
                "Broadcast failed, retrying with higher fee"
            );

            pause(params.retry_interval, cancel).await?;
        }
    }
}

async fn pause(duration: Duration, cancel: &CancellationToken) -> EngineResult<()> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(EngineError::cancelled()),
        _ = sleep(duration) => Ok(()),
    }
}
