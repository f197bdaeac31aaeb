//! Confirmation polling.
//!
//! # Responsibilities
//! - Look up a submitted transaction by hash at a fixed interval
//! - Stop at the first terminal observation: success, on-chain failure,
//!   timeout or cancellation
//!
//! # Design Decisions
//! - Polling, not subscriptions: nothing outlives the submit call
//! - A failed lookup means "not indexed yet", never a terminal error
//! - The deadline is checked after every lookup, so a timeout is reported no
//!   earlier than the configured window and at most one interval late

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::types::{SubmissionHandle, TxReceipt, TxResult};

/// Looks up the on-chain status of a submitted transaction.
#[async_trait]
pub trait ConfirmationPoller: Send + Sync {
    /// Return the receipt once the transaction is included, `None` while it
    /// is unknown. Errors are treated by the caller as "unknown" too.
    async fn status(&self, handle: &SubmissionHandle) -> EngineResult<Option<TxReceipt>>;
}

/// Poll until the transaction reaches a terminal state.
pub async fn await_confirmation(
    poller: &dyn ConfirmationPoller,
    handle: &SubmissionHandle,
    timeout: Duration,
    poll_interval: Duration,
    cancel: &CancellationToken,
) -> TxResult {
    let deadline = Instant::now() + timeout;
    let mut lookups: u32 = 0;

    loop {
        let lookup = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(handle)),
            result = poller.status(handle) => Some(result),
            _ = sleep_until(deadline) => None,
        };
        lookups += 1;

        match lookup {
            Some(Ok(Some(receipt))) => return into_result(receipt),
            Some(Ok(None)) => {
                tracing::trace!(tx_hash = %handle, lookups, "Transaction pending");
            }
            Some(Err(e)) => {
                tracing::debug!(
                    tx_hash = %handle,
                    error = %e,
                    "Status lookup failed, treating transaction as not yet indexed"
                );
            }
            None => {}
        }

        let now = Instant::now();
        if now >= deadline {
            tracing::warn!(
                tx_hash = %handle,
                lookups,
                timeout = ?timeout,
                "Transaction not confirmed in time"
            );
            return Err(EngineError::ConfirmationTimeout {
                tx_hash: handle.to_string(),
                timeout,
            });
        }

        let nap = poll_interval.min(deadline - now);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(handle)),
            _ = sleep(nap) => {}
        }
    }
}

fn cancelled(handle: &SubmissionHandle) -> EngineError {
    tracing::info!(tx_hash = %handle, "Confirmation polling cancelled");
    EngineError::Cancelled {
        tx_hash: Some(handle.to_string()),
    }
}

fn into_result(receipt: TxReceipt) -> TxResult {
    if receipt.is_success() {
        tracing::info!(
            tx_hash = %receipt.tx_hash,
            height = receipt.height,
            gas_used = receipt.gas_used,
            "Transaction confirmed"
        );
        Ok(receipt)
    } else {
        tracing::warn!(
            tx_hash = %receipt.tx_hash,
            height = receipt.height,
            code = receipt.code,
            log = %receipt.log,
            "Transaction failed on-chain"
        );
        Err(EngineError::OnChainExecution {
            tx_hash: receipt.tx_hash,
            height: receipt.height,
            code: receipt.code,
            log: receipt.log,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Finds the transaction on the `found_at`-th lookup with `code`.
    struct CountingPoller {
        calls: AtomicU32,
        found_at: Option<u32>,
        code: u32,
    }

    impl CountingPoller {
        fn new(found_at: Option<u32>, code: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                found_at,
                code,
            }
        }
    }

    #[async_trait]
    impl ConfirmationPoller for CountingPoller {
        async fn status(&self, handle: &SubmissionHandle) -> EngineResult<Option<TxReceipt>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            match self.found_at {
                Some(n) if call >= n => Ok(Some(TxReceipt {
                    tx_hash: handle.to_string(),
                    height: 7,
                    code: self.code,
                    log: "log".to_string(),
                    data: Vec::new(),
                    gas_used: 1,
                })),
                _ if call % 2 == 0 => Err(EngineError::Query("tx not found".to_string())),
                _ => Ok(None),
            }
        }
    }

    fn handle() -> SubmissionHandle {
        SubmissionHandle::new("H")
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_misses() {
        let poller = CountingPoller::new(Some(3), 0);
        let cancel = CancellationToken::new();
        let receipt = await_confirmation(
            &poller,
            &handle(),
            Duration::from_secs(5),
            Duration::from_millis(10),
            &cancel,
        )
        .await
        .unwrap();
        assert_eq!(receipt.height, 7);
        assert_eq!(poller.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nonzero_code_is_immediate() {
        let poller = CountingPoller::new(Some(1), 5);
        let cancel = CancellationToken::new();
        let start = Instant::now();
        let err = await_confirmation(
            &poller,
            &handle(),
            Duration::from_secs(30),
            Duration::from_secs(1),
            &cancel,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::OnChainExecution { code: 5, .. }));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_window() {
        let poller = CountingPoller::new(None, 0);
        let cancel = CancellationToken::new();
        let start = Instant::now();
        let err = await_confirmation(
            &poller,
            &handle(),
            Duration::from_millis(50),
            Duration::from_millis(10),
            &cancel,
        )
        .await
        .unwrap_err();
        let elapsed = start.elapsed();
        assert!(matches!(err, EngineError::ConfirmationTimeout { .. }));
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed <= Duration::from_millis(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_mid_poll() {
        let poller = CountingPoller::new(None, 0);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(25)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let err = await_confirmation(
            &poller,
            &handle(),
            Duration::from_secs(60),
            Duration::from_millis(10),
            &cancel,
        )
        .await
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::Cancelled {
                tx_hash: Some("H".to_string())
            }
        );
        assert!(start.elapsed() <= Duration::from_millis(35));
    }
}
