//! Accrual primitives and the per-transfer settlement step.
//!
//! Every division of elapsed time by a window or a custody period is rounded
//! to [`ACCRUAL_DIVISION_SCALE`] fractional digits, midpoint away from zero
//! (HALF_UP). Each sub-interval of the report window must be accrued exactly
//! once; the settlement helpers below are the only callers inside the crate.
//!
//! All arithmetic is checked. Values that do not fit an `i64` or a `Decimal`
//! surface as [`CustodyError::AccrualOverflow`].

use rust_decimal::{Decimal, RoundingStrategy};

use super::custody_model::{AssetAccrualContext, CustodyWindow};
use crate::constants::ACCRUAL_DIVISION_SCALE;
use crate::errors::{CustodyError, Result};

fn overflow(operation: &str) -> CustodyError {
    CustodyError::AccrualOverflow(operation.to_string())
}

fn scaled_ratio(numerator: i64, denominator: i64) -> Result<Decimal> {
    let ratio = Decimal::from(numerator)
        .checked_div(Decimal::from(denominator))
        .ok_or_else(|| overflow("time ratio"))?;
    Ok(ratio.round_dp_with_strategy(ACCRUAL_DIVISION_SCALE, RoundingStrategy::MidpointAwayFromZero))
}

/// Fails unless `0 < fee_fraction <= 1`.
pub fn validate_fee_fraction(fee_fraction: Decimal) -> Result<()> {
    if fee_fraction <= Decimal::ZERO || fee_fraction > Decimal::ONE {
        return Err(CustodyError::InvalidFeeFraction(fee_fraction).into());
    }
    Ok(())
}

/// Adds `balance * elapsed / total_window` to the cumulative AUC.
pub fn accrue_auc(
    context: &AssetAccrualContext,
    total_window: i64,
    elapsed: i64,
    balance: Decimal,
) -> Result<AssetAccrualContext> {
    if total_window <= 0 || elapsed < 0 {
        return Err(CustodyError::InvalidAccrualInterval {
            total_window,
            elapsed,
        }
        .into());
    }
    let accrued = balance
        .checked_mul(scaled_ratio(elapsed, total_window)?)
        .ok_or_else(|| overflow("AUC increment"))?;
    Ok(AssetAccrualContext {
        cumulative_auc: context
            .cumulative_auc
            .checked_add(accrued)
            .ok_or_else(|| overflow("cumulative AUC"))?,
        ..*context
    })
}

/// Adds the fee owed on the running balance between the control point and
/// `settle_at`. The control point itself is left untouched.
pub fn accrue_fee(
    context: &AssetAccrualContext,
    settle_at: i64,
    fee_fraction: Decimal,
    custody_period_ms: i64,
) -> Result<AssetAccrualContext> {
    validate_fee_fraction(fee_fraction)?;
    if custody_period_ms <= 0 {
        return Err(CustodyError::InvalidAccrualInterval {
            total_window: custody_period_ms,
            elapsed: 0,
        }
        .into());
    }
    let elapsed = settle_at
        .checked_sub(context.control_timestamp)
        .ok_or_else(|| overflow("elapsed time"))?;
    if elapsed < 0 {
        return Err(CustodyError::ControlPointRegression {
            control_timestamp: context.control_timestamp,
            settle_at,
        }
        .into());
    }
    let accrued = fee_fraction
        .checked_mul(scaled_ratio(elapsed, custody_period_ms)?)
        .and_then(|period_multiplier| period_multiplier.checked_mul(context.running_balance))
        .ok_or_else(|| overflow("fee increment"))?;
    Ok(AssetAccrualContext {
        cumulative_fee: context
            .cumulative_fee
            .checked_add(accrued)
            .ok_or_else(|| overflow("cumulative fee"))?,
        ..*context
    })
}

/// Settles the gap between the control point and `settle_at` and moves the
/// control point there. A `settle_at` at or before the control point leaves
/// the context unchanged.
pub fn settle(
    context: &AssetAccrualContext,
    window: &CustodyWindow,
    settle_at: i64,
    fee_fraction: Decimal,
    custody_period_ms: i64,
) -> Result<AssetAccrualContext> {
    if settle_at <= context.control_timestamp {
        return Ok(*context);
    }
    let elapsed = settle_at
        .checked_sub(context.control_timestamp)
        .ok_or_else(|| overflow("elapsed time"))?;
    let next = accrue_auc(context, window.length()?, elapsed, context.running_balance)?;
    let next = accrue_fee(&next, settle_at, fee_fraction, custody_period_ms)?;
    Ok(next.advance_to(settle_at))
}
