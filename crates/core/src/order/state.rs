//! Order state machine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LifecycleError;

/// Lifecycle state of a customer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    /// Being edited; holds no stock.
    Draft,
    /// Accepted; lines are held against availability.
    Confirmed,
    /// Being picked or assembled.
    InPreparation,
    /// Ready for hand-over.
    Ready,
    /// Goods delivered; stock debited. Terminal.
    Delivered,
    /// Abandoned; may be reactivated.
    Cancelled,
}

impl OrderState {
    /// Returns true when lines in this state hold stock via reservations.
    #[must_use]
    pub const fn is_reservable(self) -> bool {
        matches!(self, Self::Confirmed | Self::InPreparation | Self::Ready)
    }

    /// Returns true for states no transition can leave.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Side effect a transition requires, executed by the repository inside the
/// same transaction as the state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEffect {
    /// Bring reservation rows in line with the order's lines.
    SyncReservations,
    /// Delete all of the order's reservation rows.
    ReleaseReservations,
    /// Debit stock per line and delete the reservation rows they supersede.
    DeliverStock,
}

/// Resolves a requested state change against the transition table.
///
/// Returns the entry effects of the target state. `net_paid` gates
/// reactivation from `Cancelled`: funds still held force at least
/// `Confirmed`.
///
/// # Errors
///
/// Returns `InvalidTransition` for any pair not in the table.
pub fn plan_transition(
    from: OrderState,
    to: OrderState,
    net_paid: Decimal,
) -> Result<Vec<TransitionEffect>, LifecycleError> {
    use OrderState::{Cancelled, Confirmed, Delivered, Draft, InPreparation, Ready};

    let invalid = || LifecycleError::InvalidTransition { from, to };

    match (from, to) {
        (Draft, Confirmed) => Ok(vec![TransitionEffect::SyncReservations]),
        (Confirmed, InPreparation) | (InPreparation, Ready) => Ok(vec![]),
        (Ready, Delivered) => Ok(vec![TransitionEffect::DeliverStock]),
        (Draft | Confirmed | InPreparation | Ready, Cancelled) => {
            Ok(vec![TransitionEffect::ReleaseReservations])
        }
        (Cancelled, Draft) => {
            if net_paid > Decimal::ZERO {
                Err(invalid())
            } else {
                Ok(vec![])
            }
        }
        (Cancelled, Confirmed) => Ok(vec![TransitionEffect::SyncReservations]),
        _ => Err(invalid()),
    }
}

/// Explicit transition applied when a collection lands on a `Draft` order.
///
/// Returns the new state and its entry effects, or `None` when the order
/// is already past `Draft`.
#[must_use]
pub fn payment_auto_advance(state: OrderState) -> Option<(OrderState, Vec<TransitionEffect>)> {
    match state {
        OrderState::Draft => Some((
            OrderState::Confirmed,
            vec![TransitionEffect::SyncReservations],
        )),
        _ => None,
    }
}

/// Explicit transition applied when a refund brings `net_paid` to zero.
///
/// A `Confirmed` order with nothing paid reverts to `Draft`, releasing its
/// holds. Orders further along keep their state.
#[must_use]
pub fn refund_auto_revert(
    state: OrderState,
    net_paid: Decimal,
) -> Option<(OrderState, Vec<TransitionEffect>)> {
    if state == OrderState::Confirmed && net_paid <= Decimal::ZERO {
        Some((
            OrderState::Draft,
            vec![TransitionEffect::ReleaseReservations],
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(OrderState::Draft, OrderState::Confirmed)]
    #[case(OrderState::Confirmed, OrderState::InPreparation)]
    #[case(OrderState::InPreparation, OrderState::Ready)]
    #[case(OrderState::Ready, OrderState::Delivered)]
    #[case(OrderState::Draft, OrderState::Cancelled)]
    #[case(OrderState::Confirmed, OrderState::Cancelled)]
    #[case(OrderState::InPreparation, OrderState::Cancelled)]
    #[case(OrderState::Ready, OrderState::Cancelled)]
    #[case(OrderState::Cancelled, OrderState::Confirmed)]
    fn allowed_transitions(#[case] from: OrderState, #[case] to: OrderState) {
        assert!(plan_transition(from, to, Decimal::ZERO).is_ok());
    }

    #[rstest]
    #[case(OrderState::Draft, OrderState::Ready)]
    #[case(OrderState::Draft, OrderState::Delivered)]
    #[case(OrderState::Confirmed, OrderState::Ready)]
    #[case(OrderState::Confirmed, OrderState::Draft)]
    #[case(OrderState::InPreparation, OrderState::Confirmed)]
    #[case(OrderState::Ready, OrderState::InPreparation)]
    #[case(OrderState::Delivered, OrderState::Cancelled)]
    #[case(OrderState::Delivered, OrderState::Draft)]
    #[case(OrderState::Cancelled, OrderState::Ready)]
    #[case(OrderState::Draft, OrderState::Draft)]
    fn rejected_transitions(#[case] from: OrderState, #[case] to: OrderState) {
        assert!(matches!(
            plan_transition(from, to, Decimal::ZERO),
            Err(LifecycleError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_confirming_syncs_reservations() {
        let effects =
            plan_transition(OrderState::Draft, OrderState::Confirmed, Decimal::ZERO).unwrap();
        assert_eq!(effects, vec![TransitionEffect::SyncReservations]);
    }

    #[test]
    fn test_cancelling_releases_reservations() {
        let effects =
            plan_transition(OrderState::Ready, OrderState::Cancelled, Decimal::ZERO).unwrap();
        assert_eq!(effects, vec![TransitionEffect::ReleaseReservations]);
    }

    #[test]
    fn test_delivery_debits_stock() {
        let effects =
            plan_transition(OrderState::Ready, OrderState::Delivered, Decimal::ZERO).unwrap();
        assert_eq!(effects, vec![TransitionEffect::DeliverStock]);
    }

    #[test]
    fn test_reactivation_with_funds_held_forces_confirmed() {
        // Net paid above zero: Draft is off the table, Confirmed re-syncs.
        assert!(matches!(
            plan_transition(OrderState::Cancelled, OrderState::Draft, dec!(10.00)),
            Err(LifecycleError::InvalidTransition { .. })
        ));
        let effects =
            plan_transition(OrderState::Cancelled, OrderState::Confirmed, dec!(10.00)).unwrap();
        assert_eq!(effects, vec![TransitionEffect::SyncReservations]);
    }

    #[test]
    fn test_reactivation_to_draft_without_funds() {
        let effects =
            plan_transition(OrderState::Cancelled, OrderState::Draft, Decimal::ZERO).unwrap();
        assert!(effects.is_empty());
    }

    #[test]
    fn test_payment_auto_advance_only_from_draft() {
        let (state, effects) = payment_auto_advance(OrderState::Draft).unwrap();
        assert_eq!(state, OrderState::Confirmed);
        assert_eq!(effects, vec![TransitionEffect::SyncReservations]);

        assert!(payment_auto_advance(OrderState::Confirmed).is_none());
        assert!(payment_auto_advance(OrderState::Ready).is_none());
    }

    #[test]
    fn test_refund_auto_revert_on_zeroed_confirmed_order() {
        let (state, effects) =
            refund_auto_revert(OrderState::Confirmed, Decimal::ZERO).unwrap();
        assert_eq!(state, OrderState::Draft);
        assert_eq!(effects, vec![TransitionEffect::ReleaseReservations]);

        assert!(refund_auto_revert(OrderState::Confirmed, dec!(1.00)).is_none());
        assert!(refund_auto_revert(OrderState::Ready, Decimal::ZERO).is_none());
    }

    #[test]
    fn test_reservable_states() {
        assert!(!OrderState::Draft.is_reservable());
        assert!(OrderState::Confirmed.is_reservable());
        assert!(OrderState::InPreparation.is_reservable());
        assert!(OrderState::Ready.is_reservable());
        assert!(!OrderState::Delivered.is_reservable());
        assert!(!OrderState::Cancelled.is_reservable());
    }
}
