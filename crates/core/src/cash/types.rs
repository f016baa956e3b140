//! Cash movement domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of a cash register movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Cash placed in the drawer when a session opens.
    OpeningDeposit,
    /// Cash removed from the drawer when a session closes.
    ClosingWithdrawal,
    /// Generic cash received.
    Inflow,
    /// Generic cash paid out.
    Outflow,
    /// Cash collected for a sale or an order payment.
    SaleCollection,
    /// Cash paid to a supplier.
    SupplierPayment,
    /// Manual correction; the only kind whose amount may be negative.
    Adjustment,
}

impl MovementKind {
    /// Returns true for the manual correction kind.
    #[must_use]
    pub const fn is_adjustment(self) -> bool {
        matches!(self, Self::Adjustment)
    }

    /// Classifies a movement into its cash flow direction.
    ///
    /// Every consumer of the ledger derives direction through this single
    /// function; an adjustment splits on the sign of its own amount and the
    /// returned flow always carries a non-negative magnitude.
    #[must_use]
    pub fn flow(self, amount: Decimal) -> Flow {
        match self {
            Self::OpeningDeposit | Self::Inflow | Self::SaleCollection => Flow::Inflow(amount),
            Self::ClosingWithdrawal | Self::Outflow | Self::SupplierPayment => {
                Flow::Outflow(amount)
            }
            Self::Adjustment => {
                if amount.is_sign_negative() {
                    Flow::Outflow(-amount)
                } else {
                    Flow::Inflow(amount)
                }
            }
        }
    }
}

/// A cash movement classified by direction, with a non-negative magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Cash entering the drawer.
    Inflow(Decimal),
    /// Cash leaving the drawer.
    Outflow(Decimal),
}

/// A movement as seen by the balance calculator.
///
/// Repositories map persisted rows into this shape; the amount keeps the
/// sign it was stored with (negative only for adjustments).
#[derive(Debug, Clone, Copy)]
pub struct CashMovement {
    /// The movement kind.
    pub kind: MovementKind,
    /// The movement amount.
    pub amount: Decimal,
}

impl CashMovement {
    /// Creates a movement for balance calculation.
    #[must_use]
    pub const fn new(kind: MovementKind, amount: Decimal) -> Self {
        Self { kind, amount }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_inflow_kinds_classify_as_inflow() {
        for kind in [
            MovementKind::OpeningDeposit,
            MovementKind::Inflow,
            MovementKind::SaleCollection,
        ] {
            assert_eq!(kind.flow(dec!(10)), Flow::Inflow(dec!(10)));
        }
    }

    #[test]
    fn test_outflow_kinds_classify_as_outflow() {
        for kind in [
            MovementKind::ClosingWithdrawal,
            MovementKind::Outflow,
            MovementKind::SupplierPayment,
        ] {
            assert_eq!(kind.flow(dec!(10)), Flow::Outflow(dec!(10)));
        }
    }

    #[test]
    fn test_adjustment_splits_on_sign() {
        assert_eq!(
            MovementKind::Adjustment.flow(dec!(5)),
            Flow::Inflow(dec!(5))
        );
        assert_eq!(
            MovementKind::Adjustment.flow(dec!(-5)),
            Flow::Outflow(dec!(5))
        );
        assert_eq!(
            MovementKind::Adjustment.flow(Decimal::ZERO),
            Flow::Inflow(Decimal::ZERO)
        );
    }
}
