//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ChainioConfig (validated, immutable)
//!     → converted into engine parameters and backend clients at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ChainioConfig, CosmosConfig, EventsConfig, EvmConfig, KeyBackend, ObservabilityConfig,
    SignerConfig, TxManagerConfig,
};
pub use validation::{validate_config, ValidationError};
