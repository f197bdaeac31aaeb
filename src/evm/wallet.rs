//! Wallet management and transaction signing.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use alloy::eips::eip2718::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::Address;
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;

use crate::engine::error::{EngineError, EngineResult};

/// Wallet for transaction signing with nonce management.
#[derive(Debug, Clone)]
pub struct Wallet {
    address: Address,
    /// Signs EIP-1559 envelopes.
    signer: EthereumWallet,
    /// Next nonce to hand out. Shared between clones.
    nonce: Arc<AtomicU64>,
    /// Chain ID for EIP-155 replay protection.
    chain_id: u64,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    /// * `chain_id` - Chain ID for transaction signing
    pub fn from_private_key(private_key_hex: &str, chain_id: u64) -> EngineResult<Self> {
        let key_hex = private_key_hex
            .trim()
            .strip_prefix("0x")
            .unwrap_or(private_key_hex.trim());

        let signer: PrivateKeySigner = key_hex.parse().map_err(|e| {
            EngineError::Configuration(format!("Invalid private key format: {}", e))
        })?;
        let address = signer.address();

        tracing::info!(address = %address, chain_id, "Wallet initialized");

        Ok(Self {
            address,
            signer: EthereumWallet::from(signer),
            nonce: Arc::new(AtomicU64::new(0)),
            chain_id,
        })
    }

    /// Load wallet from the environment variable `var`.
    pub fn from_env(var: &str, chain_id: u64) -> EngineResult<Self> {
        let private_key = std::env::var(var).map_err(|_| {
            EngineError::Configuration(format!("Environment variable {} not set", var))
        })?;

        Self::from_private_key(&private_key, chain_id)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Get and increment the nonce atomically.
    pub fn get_and_increment_nonce(&self) -> u64 {
        self.nonce.fetch_add(1, Ordering::SeqCst)
    }

    /// Set the nonce to a specific value (e.g., after querying from chain).
    pub fn set_nonce(&self, nonce: u64) {
        self.nonce.store(nonce, Ordering::SeqCst);
    }

    /// Get current nonce without incrementing.
    pub fn current_nonce(&self) -> u64 {
        self.nonce.load(Ordering::SeqCst)
    }

    /// Sign a fully populated request and return the EIP-2718 encoding.
    pub async fn sign_transaction(&self, tx: TransactionRequest) -> EngineResult<Vec<u8>> {
        let envelope = tx
            .with_chain_id(self.chain_id)
            .build(&self.signer)
            .await
            .map_err(|e| EngineError::Broadcast(format!("Signing failed: {}", e)))?;
        Ok(envelope.encoded_2718())
    }
}
