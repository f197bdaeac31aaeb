//! Fee escalation between broadcast attempts.
//!
//! # Rules
//! - Escalation only follows a failed broadcast. A transaction that reached
//!   the mempool is never resubmitted with different fees.
//! - Prices never go down: a rate below 1.0 is treated as 1.0, so a cheaper
//!   duplicate can never be rejected as "replacement underpriced".
//! - Integer wei/gas math uses basis points and rounds up.

use crate::engine::types::{CosmosFee, EvmFee, FeeParams};

const BPS: u128 = 10_000;
const FEE_PRECISION: f64 = 1_000_000.0;

/// Return the fee parameters for the next attempt.
///
/// Cosmos fees scale the gas price amount (denom unchanged). EVM fees scale
/// the fee-cap adjustment that the broadcaster applies to its estimates.
pub fn escalate(current: &FeeParams, rate: f64) -> FeeParams {
    let rate = effective_rate(rate);
    match current {
        FeeParams::Cosmos(fee) => {
            let mut next = fee.clone();
            next.gas_price.amount = fee.gas_price.amount * rate;
            FeeParams::Cosmos(next)
        }
        FeeParams::Evm(fee) => FeeParams::Evm(EvmFee {
            fee_cap_adjustment: fee.fee_cap_adjustment * rate,
            ..fee.clone()
        }),
    }
}

impl FeeParams {
    /// The quantity escalation acts on: gas price amount for Cosmos, fee-cap
    /// adjustment for EVM.
    pub fn price_level(&self) -> f64 {
        match self {
            FeeParams::Cosmos(fee) => fee.gas_price.amount,
            FeeParams::Evm(fee) => fee.fee_cap_adjustment,
        }
    }
}

impl CosmosFee {
    /// Fee amount owed for `gas_limit` at the current gas price, rounded up
    /// to a whole unit.
    ///
    /// The product is first rounded to micro-units so binary float noise
    /// (`200000 * 0.0375 = 7500.000000000001`) does not add a unit.
    pub fn fee_amount(&self, gas_limit: u64) -> u128 {
        let exact = gas_limit as f64 * self.gas_price.amount;
        ((exact * FEE_PRECISION).round() / FEE_PRECISION).ceil() as u128
    }

    /// Gas limit derived from a simulation result.
    pub fn adjusted_gas(&self, gas_used: u64) -> u64 {
        apply_headroom(gas_used, self.gas_adjustment)
    }
}

fn effective_rate(rate: f64) -> f64 {
    if rate.is_finite() && rate > 1.0 {
        rate
    } else {
        1.0
    }
}

/// Multiply an estimate by a headroom factor, rounding up. Factors below 1.0
/// leave the estimate unchanged.
pub fn apply_headroom(estimate: u64, factor: f64) -> u64 {
    let scaled = scale_u128(estimate as u128, factor);
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

/// Scale a wei amount by `factor`, rounding up.
pub fn scale_wei(wei: u128, factor: f64) -> u128 {
    scale_u128(wei, factor)
}

fn scale_u128(value: u128, factor: f64) -> u128 {
    let factor_bps = (effective_rate(factor) * BPS as f64).round() as u128;
    let scaled = value.saturating_mul(factor_bps);
    scaled / BPS + u128::from(scaled % BPS != 0)
}
