//! CosmWasm backend over the Cosmos SDK REST gateway.
//!
//! # Data Flow
//! ```text
//! CosmosConfig (REST URL, chain ID, gas price)
//!     → client.rs (reqwest, per-request timeout)
//!     → broadcaster.rs (simulate, sign via CosmosSigner, broadcast sync)
//!     → poller.rs (tx lookup by hash, smart queries)
//! ```
//!
//! # Design Decisions
//! - Key management and protobuf encoding live behind `CosmosSigner`
//! - A CheckTx rejection is a retryable broadcast failure
//! - All nonzero DeliverTx codes surface as one on-chain failure carrying the code

pub mod broadcaster;
pub mod client;
pub mod poller;
pub mod signer;
pub mod types;

pub use broadcaster::CosmosBroadcaster;
pub use client::CosmosClient;
pub use poller::{CosmosPoller, CosmosQuerier};
pub use signer::CosmosSigner;
pub use types::{ExecuteMsg, Fee, UnsignedTx};
