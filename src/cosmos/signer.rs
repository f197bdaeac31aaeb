//! Signing seam for Cosmos transactions.
//!
//! Key handling and protobuf `TxRaw` encoding stay outside the engine. A
//! signer receives the fully priced [`UnsignedTx`] for every attempt, so a
//! re-signed retry always carries the escalated fee.

use async_trait::async_trait;

use crate::cosmos::types::UnsignedTx;
use crate::engine::error::EngineResult;

#[async_trait]
pub trait CosmosSigner: Send + Sync {
    /// Bech32 account address used as the message sender.
    fn address(&self) -> &str;

    /// Produce broadcast-ready `TxRaw` bytes.
    ///
    /// Errors are surfaced as-is; return [`crate::engine::EngineError::Broadcast`]
    /// for conditions worth retrying, such as a failed account lookup.
    async fn sign(&self, tx: &UnsignedTx) -> EngineResult<Vec<u8>>;
}
