//! chainio: transaction broadcast and confirmation for CosmWasm and EVM chains.
//!
//! Contract clients build a [`TxRequest`] and hand it to a [`TxEngine`],
//! which signs, broadcasts with bounded fee-escalating retries and polls for
//! a receipt. The engine is the same for both chain families; only the
//! backend parts in [`cosmos`] and [`evm`] differ.

pub mod config;
pub mod cosmos;
pub mod engine;
pub mod events;
pub mod evm;
pub mod observability;

pub use config::ChainioConfig;
pub use engine::{EngineError, FeeParams, TxEngine, TxReceipt, TxRequest};
