//! EVM backend over JSON-RPC.
//!
//! # Data Flow
//! ```text
//! Environment Variables (private key)
//!     → wallet.rs (key loading, nonce tracking, EIP-1559 signing)
//! EvmConfig (RPC URLs, chain ID, fee ceiling)
//!     → client.rs (failover providers with timeouts)
//!     → broadcaster.rs (nonce, fees, gas, sign, eth_sendRawTransaction)
//!     → poller.rs (receipts by hash, eth_call)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod broadcaster;
pub mod client;
pub mod poller;
pub mod wallet;

pub use broadcaster::EvmBroadcaster;
pub use client::{EvmClient, RpcError};
pub use poller::{EvmPoller, EvmQuerier};
pub use wallet::Wallet;
