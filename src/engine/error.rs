//! Engine error taxonomy.

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the broadcast and confirmation engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Invalid engine settings or a missing signer binding. Raised before any
    /// network activity.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The payload could not be serialized. Retrying reproduces the failure.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// One broadcast attempt failed (network error, signer failure or node
    /// rejection).
    #[error("Broadcast failed: {0}")]
    Broadcast(String),

    /// Every broadcast attempt failed.
    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },

    /// The transaction was included but execution failed.
    #[error("Transaction {tx_hash} failed on-chain at height {height} with code {code}: {log}")]
    OnChainExecution {
        tx_hash: String,
        height: u64,
        code: u32,
        log: String,
    },

    /// The transaction was not seen within the confirmation window. It may
    /// still be included later.
    #[error("Transaction {tx_hash} not confirmed within {timeout:?}; outcome unknown")]
    ConfirmationTimeout { tx_hash: String, timeout: Duration },

    /// The caller cancelled the submission. `tx_hash` is set when a
    /// broadcast was accepted first, in which case the transaction may still
    /// be included.
    #[error("Submission cancelled{}", cancelled_suffix(.tx_hash))]
    Cancelled { tx_hash: Option<String> },

    /// A read-only query failed.
    #[error("Query failed: {0}")]
    Query(String),
}

impl EngineError {
    /// Cancellation before anything reached the node.
    pub fn cancelled() -> Self {
        EngineError::Cancelled { tx_hash: None }
    }

    /// Whether the coordinator may try the broadcast again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Broadcast(_))
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Configuration(_) => "configuration",
            EngineError::Encoding(_) => "encoding",
            EngineError::Broadcast(_) => "broadcast",
            EngineError::MaxRetriesExceeded { .. } => "max_retries_exceeded",
            EngineError::OnChainExecution { .. } => "on_chain_failure",
            EngineError::ConfirmationTimeout { .. } => "confirmation_timeout",
            EngineError::Cancelled { .. } => "cancelled",
            EngineError::Query(_) => "query",
        }
    }
}

fn cancelled_suffix(tx_hash: &Option<String>) -> String {
    match tx_hash {
        Some(hash) => format!(" after broadcast of {}; outcome unknown", hash),
        None => String::new(),
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
