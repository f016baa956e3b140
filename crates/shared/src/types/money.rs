//! Money rounding helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All monetary values are `rust_decimal::Decimal`; these helpers pin the
//! scale at every persistence and comparison boundary.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places for cash amounts (movement amounts, payments, totals).
pub const CASH_SCALE: u32 = 2;

/// Decimal places for per-unit costs (weighted averages keep extra precision).
pub const COST_SCALE: u32 = 4;

/// Rounds a cash amount to 2 decimal places, half away from zero.
///
/// Half away from zero means `0.005` rounds to `0.01` and `-0.005` rounds
/// to `-0.01`. Applied to every amount before it is persisted or compared.
#[must_use]
pub fn round_cash(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CASH_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a per-unit cost to 4 decimal places, half away from zero.
///
/// Unit costs keep two extra places so that repeated weighted-average
/// recomputations do not drift; they are rounded to cash scale only when
/// they become a cash amount.
#[must_use]
pub fn round_cost(cost: Decimal) -> Decimal {
    cost.round_dp_with_strategy(COST_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_cash_half_away_from_zero() {
        assert_eq!(round_cash(dec!(10.005)), dec!(10.01));
        assert_eq!(round_cash(dec!(-10.005)), dec!(-10.01));
        assert_eq!(round_cash(dec!(10.004)), dec!(10.00));
        assert_eq!(round_cash(dec!(2.5)), dec!(2.50));
    }

    #[test]
    fn test_round_cash_is_idempotent() {
        let amount = round_cash(dec!(7.4999));
        assert_eq!(round_cash(amount), amount);
    }

    #[test]
    fn test_round_cost_keeps_four_places() {
        assert_eq!(round_cost(dec!(6.66666)), dec!(6.6667));
        assert_eq!(round_cost(dec!(5)), dec!(5));
    }
}
