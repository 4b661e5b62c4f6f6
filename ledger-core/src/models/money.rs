//! Money arithmetic helpers.
//!
//! Everything here operates on [`rust_decimal::Decimal`] so monetary values
//! carry no binary-float representation error. All outward-facing amounts
//! are rounded half-up to two decimals before comparison or display;
//! `f64` only appears at the coercion boundary.
//!
//! The helpers in this module deliberately do not fail on degenerate
//! numeric input (non-finite floats): they sit deep inside aggregate
//! computations where one bad entry must not abort an otherwise valid sum.
//! They degrade to zero and log instead. The two exceptions, which concern
//! caller-supplied arguments rather than aggregate entries, are
//! [`price_with_margin`] and the coercion helpers when no default is given.

use super::LedgerFailure;
use rust_decimal::{Decimal, RoundingStrategy, prelude::FromPrimitive};
use tracing::warn;

/// Number of decimal places used for all currency amounts.
pub const CURRENCY_SCALE: u32 = 2;

/// Tolerance used by [`approx_eq`] to absorb rounding noise during
/// reconciliation checks.
pub const DEFAULT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2); // 0.01

/// Round to the currency scale, half-up. Idempotent.
pub fn round(value: Decimal) -> Decimal {
    round_dp(value, CURRENCY_SCALE)
}

/// Round to an arbitrary number of decimals, half-up.
pub fn round_dp(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a float to a rounded amount. Non-finite input degrades to zero
/// with a warning, never a panic or an error.
pub fn round_f64(value: f64) -> Decimal {
    match Decimal::from_f64(value) {
        Some(decimal) => round(decimal),
        None => {
            warn!(value, "non-finite amount degraded to zero");
            Decimal::ZERO
        }
    }
}

/// Sum a series of optional amounts, skipping the absent ones, and round
/// the final total.
pub fn sum<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Option<Decimal>>,
{
    round(values.into_iter().flatten().sum())
}

/// Sum a series of floats, skipping non-finite entries (with a warning),
/// and round the final total.
pub fn sum_f64<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = f64>,
{
    let mut total = Decimal::ZERO;
    for value in values {
        match Decimal::from_f64(value) {
            Some(decimal) => total += decimal,
            None => warn!(value, "non-finite entry skipped in sum"),
        }
    }
    round(total)
}

/// Apply a percentage to a base amount: `round(base * pct / 100)`.
pub fn apply_percentage(base: Decimal, pct: Decimal) -> Decimal {
    round(base * pct / Decimal::ONE_HUNDRED)
}

/// Price a cost with a margin on top: `round(cost * (1 + margin_pct/100))`.
///
/// Unlike the aggregate helpers, a negative cost or margin here is a
/// caller error and is rejected.
pub fn price_with_margin(cost: Decimal, margin_pct: Decimal) -> Result<Decimal, LedgerFailure> {
    if cost < Decimal::ZERO {
        return Err(LedgerFailure::invalid(format!(
            "cost must be non-negative, got {cost}"
        )));
    }
    if margin_pct < Decimal::ZERO {
        return Err(LedgerFailure::invalid(format!(
            "margin percentage must be non-negative, got {margin_pct}"
        )));
    }
    Ok(round(cost * (Decimal::ONE + margin_pct / Decimal::ONE_HUNDRED)))
}

/// Predicate applied at every input boundary before money enters the ledger.
pub fn is_valid_amount(value: Decimal, allow_zero: bool, allow_negative: bool) -> bool {
    if value.is_zero() {
        allow_zero
    } else if value.is_sign_negative() {
        allow_negative
    } else {
        true
    }
}

/// Coerce a loosely-typed float into a finite amount.
///
/// A non-finite input falls back to `default`; with no default to fall
/// back on, the coercion fails.
pub fn coerce_decimal(value: f64, default: Option<Decimal>) -> Result<Decimal, LedgerFailure> {
    match Decimal::from_f64(value) {
        Some(decimal) => Ok(decimal),
        None => default.ok_or_else(|| {
            LedgerFailure::invalid(format!("cannot coerce {value} to a finite amount"))
        }),
    }
}

/// String-boundary variant of [`coerce_decimal`] with the same fallback
/// contract.
pub fn parse_decimal(value: &str, default: Option<Decimal>) -> Result<Decimal, LedgerFailure> {
    match value.trim().parse::<Decimal>() {
        Ok(decimal) => Ok(decimal),
        Err(_) => default.ok_or_else(|| {
            LedgerFailure::invalid(format!("cannot parse {value:?} as an amount"))
        }),
    }
}

/// Tolerance-based equality with the default reconciliation tolerance.
pub fn approx_eq(a: Decimal, b: Decimal) -> bool {
    approx_eq_tol(a, b, DEFAULT_TOLERANCE)
}

/// Tolerance-based equality: `|a - b| <= tolerance`.
pub fn approx_eq_tol(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    (a - b).abs() <= tolerance
}
