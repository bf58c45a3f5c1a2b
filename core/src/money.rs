//! Decimal rounding rules for report amounts.
//!
//! Two rules exist and they are not interchangeable:
//! - indicator averages (monthly income/cost, per-transaction) round
//!   half-up to 2 decimals;
//! - category averages truncate toward zero at 2 decimals, because the
//!   upstream aggregation always did and persisted reports depend on it.

use bigdecimal::{BigDecimal, RoundingMode, Zero};

/// Exactly `0.00`, never `-0.00`.
pub fn zero_amount() -> BigDecimal {
    BigDecimal::zero().with_scale(2)
}

pub fn round_half_up(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(2, RoundingMode::HalfUp)
}

pub fn truncate_cents(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(2, RoundingMode::Down)
}
