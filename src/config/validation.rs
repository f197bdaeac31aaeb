//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (retries ≥ 1, timeouts > 0, rates ≥ 1.0)
//! - Check URLs and addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ChainioConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use alloy::primitives::Address;
use thiserror::Error;

use crate::config::schema::ChainioConfig;

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Check a parsed configuration.
pub fn validate_config(config: &ChainioConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let tx = &config.tx_manager;
    if tx.max_retries < 1 {
        errors.push(ValidationError::new("tx_manager.max_retries", "must be at least 1"));
    }
    if tx.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "tx_manager.confirmation_timeout_secs",
            "must be greater than zero",
        ));
    }
    if tx.poll_interval_ms == 0 {
        errors.push(ValidationError::new(
            "tx_manager.poll_interval_ms",
            "must be greater than zero",
        ));
    }
    check_rate(&mut errors, "tx_manager.gas_price_adjustment_rate", tx.gas_price_adjustment_rate);

    let cosmos = &config.cosmos;
    check_url(&mut errors, "cosmos.rest_url", &cosmos.rest_url);
    if cosmos.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "cosmos.request_timeout_secs",
            "must be greater than zero",
        ));
    }
    if cosmos.gas_price_denom.trim().is_empty() {
        errors.push(ValidationError::new("cosmos.gas_price_denom", "must not be empty"));
    }
    if !cosmos.gas_price_amount.is_finite() || cosmos.gas_price_amount < 0.0 {
        errors.push(ValidationError::new(
            "cosmos.gas_price_amount",
            "must be a non-negative number",
        ));
    }
    check_rate(&mut errors, "cosmos.gas_adjustment", cosmos.gas_adjustment);

    let evm = &config.evm;
    check_url(&mut errors, "evm.rpc_url", &evm.rpc_url);
    for (i, url) in evm.failover_urls.iter().enumerate() {
        check_url(&mut errors, &format!("evm.failover_urls[{}]", i), url);
    }
    if evm.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("evm.rpc_timeout_secs", "must be greater than zero"));
    }
    check_rate(&mut errors, "evm.fee_cap_adjustment", evm.fee_cap_adjustment);
    check_rate(&mut errors, "evm.gas_limit_adjustment", evm.gas_limit_adjustment);

    if config.signer.private_key_env.trim().is_empty() {
        errors.push(ValidationError::new("signer.private_key_env", "must not be empty"));
    }

    let events = &config.events;
    if events.enabled {
        if events.contract_address.parse::<Address>().is_err() {
            errors.push(ValidationError::new(
                "events.contract_address",
                format!("invalid address '{}'", events.contract_address),
            ));
        }
        if events.poll_interval_ms == 0 {
            errors.push(ValidationError::new(
                "events.poll_interval_ms",
                "must be greater than zero",
            ));
        }
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if let Err(e) = url::Url::parse(value) {
        errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", value, e)));
    }
}

fn check_rate(errors: &mut Vec<ValidationError>, field: &str, value: f64) {
    if !value.is_finite() || value < 1.0 {
        errors.push(ValidationError::new(field, format!("must be >= 1.0, got {}", value)));
    }
}
