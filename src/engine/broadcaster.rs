//! Broadcast seam shared by both backends.

use async_trait::async_trait;

use crate::engine::error::EngineResult;
use crate::engine::types::{FeeParams, SubmissionHandle, TxRequest};

/// Turns a request plus fees into a transaction accepted by a node.
///
/// An implementation estimates gas when the request asks for it, has its
/// signer produce an envelope, and submits the raw bytes. A returned handle
/// means mempool acceptance, not finality.
///
/// `fee` belongs to one submission. An implementation may record choices
/// there that every attempt must share; the EVM backend pins its nonce.
///
/// Error contract:
/// - [`EngineError::Broadcast`](crate::engine::EngineError::Broadcast) for
///   anything worth another attempt: transport failures, signer failures,
///   node rejections (bad sequence, insufficient fee, ...).
/// - [`EngineError::Encoding`](crate::engine::EngineError::Encoding) or
///   [`EngineError::Configuration`](crate::engine::EngineError::Configuration)
///   when retrying cannot help.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Backend name used in logs and metric labels.
    fn backend(&self) -> &'static str;

    async fn send(&self, request: &TxRequest, fee: &mut FeeParams)
        -> EngineResult<SubmissionHandle>;
}
