//! Session balance calculation and overdraft checks.

use rust_decimal::Decimal;

use bodega_shared::types::round_cash;

use super::error::CashError;
use super::types::{CashMovement, Flow, MovementKind};

/// Computes a session balance from its opening float and movement history.
///
/// Balance = opening float + Σinflows − Σoutflows, with every movement
/// classified through [`MovementKind::flow`].
#[must_use]
pub fn session_balance<'a, I>(opening_float: Decimal, movements: I) -> Decimal
where
    I: IntoIterator<Item = &'a CashMovement>,
{
    let mut balance = opening_float;
    for movement in movements {
        match movement.kind.flow(movement.amount) {
            Flow::Inflow(amount) => balance += amount,
            Flow::Outflow(amount) => balance -= amount,
        }
    }
    round_cash(balance)
}

/// Validates and rounds a movement amount before it is recorded.
///
/// Non-adjustment kinds must be strictly positive. Adjustments may carry
/// either sign but not zero.
///
/// # Errors
///
/// Returns `NonPositiveAmount` or `ZeroAdjustment` on invalid input.
pub fn validate_amount(kind: MovementKind, amount: Decimal) -> Result<Decimal, CashError> {
    let rounded = round_cash(amount);
    if kind.is_adjustment() {
        if rounded.is_zero() {
            return Err(CashError::ZeroAdjustment);
        }
    } else if rounded <= Decimal::ZERO {
        return Err(CashError::NonPositiveAmount);
    }
    Ok(rounded)
}

/// Checks that an outflow-like amount does not overdraw the session.
///
/// # Errors
///
/// Returns `InsufficientFunds` carrying the available balance and the
/// requested amount.
pub fn check_outflow(available: Decimal, requested: Decimal) -> Result<(), CashError> {
    if requested > available {
        return Err(CashError::InsufficientFunds {
            available,
            requested,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn movement(kind: MovementKind, amount: Decimal) -> CashMovement {
        CashMovement::new(kind, amount)
    }

    #[test]
    fn test_balance_sums_inflows_and_outflows() {
        let movements = vec![
            movement(MovementKind::SaleCollection, dec!(50.00)),
            movement(MovementKind::Outflow, dec!(20.00)),
            movement(MovementKind::Adjustment, dec!(-5.00)),
            movement(MovementKind::Adjustment, dec!(2.50)),
        ];
        let balance = session_balance(dec!(100.00), &movements);
        assert_eq!(balance, dec!(127.50));
    }

    #[test]
    fn test_balance_of_empty_history_is_opening_float() {
        assert_eq!(session_balance(dec!(100.00), &[]), dec!(100.00));
    }

    #[test]
    fn test_outflow_beyond_balance_is_rejected() {
        // Opening float 100.00, outflow 150.00 leaves the balance untouched.
        let balance = session_balance(dec!(100.00), &[]);
        let err = check_outflow(balance, dec!(150.00)).unwrap_err();
        match err {
            CashError::InsufficientFunds {
                available,
                requested,
            } => {
                assert_eq!(available, dec!(100.00));
                assert_eq!(requested, dec!(150.00));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_outflow_up_to_balance_is_allowed() {
        assert!(check_outflow(dec!(100.00), dec!(100.00)).is_ok());
    }

    #[test]
    fn test_validate_amount_rounds_half_away_from_zero() {
        let amount = validate_amount(MovementKind::Inflow, dec!(10.005)).unwrap();
        assert_eq!(amount, dec!(10.01));
    }

    #[test]
    fn test_validate_amount_rejects_non_positive() {
        assert!(matches!(
            validate_amount(MovementKind::Outflow, Decimal::ZERO),
            Err(CashError::NonPositiveAmount)
        ));
        assert!(matches!(
            validate_amount(MovementKind::Inflow, dec!(-1)),
            Err(CashError::NonPositiveAmount)
        ));
    }

    #[test]
    fn test_validate_amount_allows_signed_adjustment() {
        assert_eq!(
            validate_amount(MovementKind::Adjustment, dec!(-3.00)).unwrap(),
            dec!(-3.00)
        );
        assert!(matches!(
            validate_amount(MovementKind::Adjustment, dec!(0.001)),
            Err(CashError::ZeroAdjustment)
        ));
    }
}
