//! Observed contract state.
//!
//! # Data Flow
//! ```text
//! EVM node (eth_getLogs, behind confirmed head)
//!     → watcher.rs (poll, decode with EventDecoder)
//!     → cache.rs (last-write-wins string map)
//!     → readers (any clone of ObservedValueCache)
//! ```
//!
//! The cache is owned by the caller and handed to the watcher; nothing here
//! is global.

pub mod cache;
pub mod watcher;

pub use cache::ObservedValueCache;
pub use watcher::{sol_event_decoder, EventDecoder, EventWatcher, MAX_BLOCK_SPAN};
