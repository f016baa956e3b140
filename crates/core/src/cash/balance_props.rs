//! Property tests for session balance calculation.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::balance::{check_outflow, session_balance};
use super::types::{CashMovement, Flow, MovementKind};

/// Strategy for a cash amount with two decimal places, 0.01..=1000.00.
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=100_000).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for a signed adjustment amount, -500.00..=500.00 excluding zero.
fn adjustment_strategy() -> impl Strategy<Value = Decimal> {
    (-50_000i64..=50_000)
        .prop_filter("non-zero", |n| *n != 0)
        .prop_map(|n| Decimal::new(n, 2))
}

fn movement_strategy() -> impl Strategy<Value = CashMovement> {
    prop_oneof![
        amount_strategy().prop_map(|a| CashMovement::new(MovementKind::Inflow, a)),
        amount_strategy().prop_map(|a| CashMovement::new(MovementKind::SaleCollection, a)),
        amount_strategy().prop_map(|a| CashMovement::new(MovementKind::Outflow, a)),
        amount_strategy().prop_map(|a| CashMovement::new(MovementKind::SupplierPayment, a)),
        adjustment_strategy().prop_map(|a| CashMovement::new(MovementKind::Adjustment, a)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// *For any* movement history, the balance equals the opening float
    /// plus the signed sum of classified flows.
    #[test]
    fn prop_balance_equals_signed_sum(
        opening in amount_strategy(),
        movements in prop::collection::vec(movement_strategy(), 0..30),
    ) {
        let expected: Decimal = movements
            .iter()
            .map(|m| match m.kind.flow(m.amount) {
                Flow::Inflow(a) => a,
                Flow::Outflow(a) => -a,
            })
            .sum();

        prop_assert_eq!(session_balance(opening, &movements), opening + expected);
    }

    /// *For any* balance, an outflow that passes the overdraft check leaves
    /// a non-negative remainder.
    #[test]
    fn prop_checked_outflow_never_overdraws(
        opening in amount_strategy(),
        movements in prop::collection::vec(movement_strategy(), 0..30),
        requested in amount_strategy(),
    ) {
        let balance = session_balance(opening, &movements);
        if check_outflow(balance, requested).is_ok() {
            prop_assert!(balance - requested >= Decimal::ZERO);
        } else {
            prop_assert!(requested > balance);
        }
    }

    /// Movement order never changes the resulting balance.
    #[test]
    fn prop_balance_is_order_independent(
        opening in amount_strategy(),
        movements in prop::collection::vec(movement_strategy(), 0..20),
    ) {
        let mut reversed = movements.clone();
        reversed.reverse();
        prop_assert_eq!(
            session_balance(opening, &movements),
            session_balance(opening, &reversed)
        );
    }
}
