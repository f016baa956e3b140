//! Cost snapshot resolution for document lines.

use rust_decimal::Decimal;

use bodega_shared::types::round_cost;

/// Resolves the unit cost to freeze into a document line.
///
/// Fallback chain: current weighted average, then the unit's default cost,
/// then the product's default cost, then zero. Each candidate is used only
/// if strictly positive; a zero result is a legal snapshot for items that
/// have never carried a cost.
#[must_use]
pub fn snapshot_cost(
    average_cost: Decimal,
    unit_default: Option<Decimal>,
    product_default: Option<Decimal>,
) -> Decimal {
    let candidates = [Some(average_cost), unit_default, product_default];
    for candidate in candidates.into_iter().flatten() {
        if candidate > Decimal::ZERO {
            return round_cost(candidate);
        }
    }
    Decimal::ZERO
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_average_wins_when_positive() {
        assert_eq!(
            snapshot_cost(dec!(6.00), Some(dec!(4.00)), Some(dec!(3.00))),
            dec!(6.00)
        );
    }

    #[test]
    fn test_unit_default_when_average_is_zero() {
        assert_eq!(
            snapshot_cost(Decimal::ZERO, Some(dec!(4.00)), Some(dec!(3.00))),
            dec!(4.00)
        );
    }

    #[test]
    fn test_product_default_when_unit_default_missing() {
        assert_eq!(
            snapshot_cost(Decimal::ZERO, None, Some(dec!(3.00))),
            dec!(3.00)
        );
        assert_eq!(
            snapshot_cost(Decimal::ZERO, Some(Decimal::ZERO), Some(dec!(3.00))),
            dec!(3.00)
        );
    }

    #[test]
    fn test_chain_bottoms_out_at_zero() {
        assert_eq!(snapshot_cost(Decimal::ZERO, None, None), Decimal::ZERO);
    }
}
