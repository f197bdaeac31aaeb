//! Contract event watcher.
//!
//! # Responsibilities
//! - Poll `eth_getLogs` for one contract behind the confirmed head
//! - Decode logs into `(key, value)` pairs with a caller-supplied decoder
//! - Record decoded pairs into an [`ObservedValueCache`]
//!
//! # Design Decisions
//! - Polling only; a failed round is logged and retried on the next tick
//! - The block cursor only advances after a round is fully recorded
//! - Without a resume point the cursor starts at the confirmed head seen by
//!   the first successful round; history before it is not replayed
//! - One round spans at most `MAX_BLOCK_SPAN` blocks
//! - Logs the decoder does not recognise are skipped

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, B256};
use alloy::rpc::types::{Filter, Log};
use alloy::sol_types::SolEvent;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::config::EventsConfig;
use crate::engine::error::{EngineError, EngineResult};
use crate::events::cache::ObservedValueCache;
use crate::evm::client::{EvmClient, RpcError};

/// Largest block range requested in one `eth_getLogs` call.
pub const MAX_BLOCK_SPAN: u64 = 2_000;

/// Maps a raw log to a cache entry, or `None` to skip it.
pub type EventDecoder = Arc<dyn Fn(&Log) -> Option<(String, String)> + Send + Sync>;

/// Build a decoder for one Solidity event type.
pub fn sol_event_decoder<E, F>(map: F) -> EventDecoder
where
    E: SolEvent + 'static,
    F: Fn(&E) -> (String, String) + Send + Sync + 'static,
{
    Arc::new(move |log: &Log| {
        log.log_decode::<E>()
            .ok()
            .map(|decoded| map(&decoded.inner.data))
    })
}

/// Service to watch a contract for events.
pub struct EventWatcher {
    client: EvmClient,
    contract_address: Address,
    event_signature: Option<B256>,
    decoder: EventDecoder,
    cache: ObservedValueCache,
    poll_interval: Duration,
    confirmation_blocks: u64,
    last_block: Option<u64>,
}

impl EventWatcher {
    /// Create a new watcher.
    pub fn new(
        client: EvmClient,
        config: &EventsConfig,
        decoder: EventDecoder,
        cache: ObservedValueCache,
    ) -> EngineResult<Self> {
        let contract_address: Address = config.contract_address.parse().map_err(|e| {
            EngineError::Configuration(format!("Invalid contract address: {}", e))
        })?;

        Ok(Self {
            client,
            contract_address,
            event_signature: None,
            decoder,
            cache,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            confirmation_blocks: config.confirmation_blocks,
            last_block: None,
        })
    }

    /// Only request logs whose first topic is `signature`.
    pub fn with_event_signature(mut self, signature: B256) -> Self {
        self.event_signature = Some(signature);
        self
    }

    /// Resume after `block` instead of starting at the current head.
    pub fn starting_after(mut self, block: u64) -> Self {
        self.last_block = Some(block);
        self
    }

    /// Last block whose logs have been recorded, `None` until the first
    /// successful round.
    pub fn last_block(&self) -> Option<u64> {
        self.last_block
    }

    /// Run the watch loop until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!(contract = %self.contract_address, "Starting event watcher");

        loop {
            match self.poll_once().await {
                Ok(0) => {}
                Ok(recorded) => {
                    tracing::debug!(recorded, block = ?self.last_block, "Recorded contract events")
                }
                Err(e) => tracing::error!(error = %e, "Error polling contract events"),
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = sleep(self.poll_interval) => {}
            }
        }

        tracing::info!(contract = %self.contract_address, "Event watcher stopped");
    }

    /// Fetch and record one batch of confirmed logs. Returns how many
    /// entries were written to the cache.
    pub async fn poll_once(&mut self) -> Result<usize, RpcError> {
        let current_block = self.client.get_block_number().await?;
        let confirmed = current_block.saturating_sub(self.confirmation_blocks);

        let Some(last_block) = self.last_block else {
            self.last_block = Some(confirmed);
            tracing::info!(block = confirmed, "Initialized event watcher");
            return Ok(0);
        };
        if confirmed <= last_block {
            return Ok(0);
        }

        let from_block = last_block + 1;
        let target_block = confirmed.min(last_block + MAX_BLOCK_SPAN);
        let mut filter = Filter::new()
            .address(self.contract_address)
            .from_block(from_block)
            .to_block(target_block);
        if let Some(signature) = self.event_signature {
            filter = filter.event_signature(signature);
        }

        let logs = self.client.get_logs(&filter).await?;

        let mut recorded = 0;
        for log in &logs {
            if let Some((key, value)) = (self.decoder)(log) {
                self.cache.record(key, value);
                recorded += 1;
            }
        }

        self.last_block = Some(target_block);
        Ok(recorded)
    }
}
