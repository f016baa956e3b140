//! Per-unit stock level with weighted-average cost.

use rust_decimal::Decimal;
use uuid::Uuid;

use bodega_shared::types::round_cost;

use super::error::StockError;

/// The stock position of one sellable unit.
///
/// Mirrors the persisted stock row: on-hand quantity plus the running
/// weighted-average cost. All level math is pure; repositories load a
/// level, apply a movement, and persist the result in one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevel {
    /// The unit this level tracks.
    pub unit_id: Uuid,
    /// Quantity currently on hand.
    pub on_hand: i32,
    /// Weighted-average unit cost, recomputed on every inbound.
    pub average_cost: Decimal,
}

impl StockLevel {
    /// Creates an empty level for a unit never moved before.
    #[must_use]
    pub const fn empty(unit_id: Uuid) -> Self {
        Self {
            unit_id,
            on_hand: 0,
            average_cost: Decimal::ZERO,
        }
    }

    /// Applies an inbound movement, recomputing the weighted average.
    ///
    /// new_avg = (avg·on_hand + cost·qty) / (on_hand + qty)
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveQuantity` or `NegativeCost` on invalid input.
    pub fn apply_inbound(&self, quantity: i32, unit_cost: Decimal) -> Result<Self, StockError> {
        if quantity <= 0 {
            return Err(StockError::NonPositiveQuantity);
        }
        if unit_cost.is_sign_negative() {
            return Err(StockError::NegativeCost);
        }

        let old_qty = Decimal::from(self.on_hand);
        let new_qty = Decimal::from(self.on_hand + quantity);
        let weighted =
            self.average_cost * old_qty + unit_cost * Decimal::from(quantity);

        Ok(Self {
            unit_id: self.unit_id,
            on_hand: self.on_hand + quantity,
            average_cost: round_cost(weighted / new_qty),
        })
    }

    /// Applies an outbound movement, charging the current average cost.
    ///
    /// The average is NOT recomputed on the way out; the returned cost is
    /// the one the calling line must freeze.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientStock` when the quantity exceeds what is on
    /// hand, `NonPositiveQuantity` on invalid input.
    pub fn apply_outbound(&self, quantity: i32) -> Result<(Self, Decimal), StockError> {
        if quantity <= 0 {
            return Err(StockError::NonPositiveQuantity);
        }
        if quantity > self.on_hand {
            return Err(StockError::InsufficientStock {
                unit_id: self.unit_id,
                requested: quantity,
                available: self.on_hand,
            });
        }

        let level = Self {
            unit_id: self.unit_id,
            on_hand: self.on_hand - quantity,
            average_cost: self.average_cost,
        };
        Ok((level, self.average_cost))
    }

    /// Applies a signed adjustment, mirroring inbound/outbound by sign.
    ///
    /// Positive adjustments enter at the current average so the average is
    /// preserved; negative adjustments must not drive the quantity below
    /// zero. Returns the new level and the cost the movement records.
    ///
    /// # Errors
    ///
    /// Returns `ZeroAdjustment` or `InsufficientStock`.
    pub fn apply_adjustment(&self, quantity: i32) -> Result<(Self, Decimal), StockError> {
        if quantity == 0 {
            return Err(StockError::ZeroAdjustment);
        }
        if quantity > 0 {
            let level = self.apply_inbound(quantity, self.average_cost)?;
            Ok((level, self.average_cost))
        } else {
            self.apply_outbound(-quantity)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn unit() -> Uuid {
        Uuid::new_v4()
    }

    #[test]
    fn test_inbound_sets_average_from_empty() {
        // qty=0 avg=0; inbound 10 @ 5.00 -> qty=10, avg=5.00
        let level = StockLevel::empty(unit()).apply_inbound(10, dec!(5.00)).unwrap();
        assert_eq!(level.on_hand, 10);
        assert_eq!(level.average_cost, dec!(5.00));
    }

    #[test]
    fn test_inbound_recomputes_weighted_average() {
        // 10 @ 5.00 then 10 @ 7.00 -> qty=20, avg=6.00
        let level = StockLevel::empty(unit())
            .apply_inbound(10, dec!(5.00))
            .unwrap()
            .apply_inbound(10, dec!(7.00))
            .unwrap();
        assert_eq!(level.on_hand, 20);
        assert_eq!(level.average_cost, dec!(6.00));
    }

    #[test]
    fn test_outbound_charges_average_without_recomputing() {
        let level = StockLevel::empty(unit())
            .apply_inbound(10, dec!(5.00))
            .unwrap()
            .apply_inbound(10, dec!(7.00))
            .unwrap();

        let (level, charged) = level.apply_outbound(5).unwrap();
        assert_eq!(charged, dec!(6.00));
        assert_eq!(level.on_hand, 15);
        assert_eq!(level.average_cost, dec!(6.00));
    }

    #[test]
    fn test_outbound_beyond_on_hand_is_rejected() {
        let id = unit();
        let level = StockLevel::empty(id).apply_inbound(3, dec!(2.00)).unwrap();
        let err = level.apply_outbound(5).unwrap_err();
        match err {
            StockError::InsufficientStock {
                unit_id,
                requested,
                available,
            } => {
                assert_eq!(unit_id, id);
                assert_eq!(requested, 5);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_void_replays_frozen_cost_after_average_drift() {
        // Sell 4 at a frozen cost of 5.00, let the average drift to 6.25,
        // then void: the goods come back at 5.00, not at the new average.
        let level = StockLevel::empty(unit())
            .apply_inbound(10, dec!(5.00))
            .unwrap();
        let (level, frozen) = level.apply_outbound(4).unwrap();
        assert_eq!(frozen, dec!(5.00));

        let level = level.apply_inbound(10, dec!(7.00)).unwrap();
        assert_eq!(level.average_cost, dec!(6.25));

        let level = level.apply_inbound(4, frozen).unwrap();
        assert_eq!(level.on_hand, 20);
        assert_eq!(level.average_cost, dec!(6.00));
    }

    #[test]
    fn test_positive_adjustment_preserves_average() {
        let level = StockLevel::empty(unit())
            .apply_inbound(10, dec!(4.00))
            .unwrap();
        let (level, cost) = level.apply_adjustment(5).unwrap();
        assert_eq!(level.on_hand, 15);
        assert_eq!(level.average_cost, dec!(4.00));
        assert_eq!(cost, dec!(4.00));
    }

    #[test]
    fn test_negative_adjustment_cannot_go_below_zero() {
        let level = StockLevel::empty(unit())
            .apply_inbound(2, dec!(4.00))
            .unwrap();
        assert!(matches!(
            level.apply_adjustment(-3),
            Err(StockError::InsufficientStock { .. })
        ));
    }

    #[test]
    fn test_zero_adjustment_is_rejected() {
        let level = StockLevel::empty(unit());
        assert!(matches!(
            level.apply_adjustment(0),
            Err(StockError::ZeroAdjustment)
        ));
    }

    #[test]
    fn test_inbound_validation() {
        let level = StockLevel::empty(unit());
        assert!(matches!(
            level.apply_inbound(0, dec!(1.00)),
            Err(StockError::NonPositiveQuantity)
        ));
        assert!(matches!(
            level.apply_inbound(1, dec!(-1.00)),
            Err(StockError::NegativeCost)
        ));
    }
}
