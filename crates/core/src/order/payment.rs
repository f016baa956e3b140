//! Payment and refund invariants.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bodega_shared::types::round_cash;

use super::error::LifecycleError;

/// Kind of a payment event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    /// Money received against the order.
    Collection,
    /// Money returned; optionally linked to one collection.
    Refund,
}

/// One entry of an order's append-only payment history.
#[derive(Debug, Clone, Copy)]
pub struct PaymentEvent {
    /// Event id.
    pub id: Uuid,
    /// Collection or refund.
    pub kind: PaymentKind,
    /// Positive amount in both directions.
    pub amount: Decimal,
    /// For refunds, the collection being unwound.
    pub refund_of: Option<Uuid>,
}

/// Cumulative collections minus cumulative refunds.
#[must_use]
pub fn net_paid(events: &[PaymentEvent]) -> Decimal {
    let total = events
        .iter()
        .map(|e| match e.kind {
            PaymentKind::Collection => e.amount,
            PaymentKind::Refund => -e.amount,
        })
        .sum();
    round_cash(total)
}

/// Unrefunded remainder of one collection.
#[must_use]
pub fn collection_remaining(events: &[PaymentEvent], collection_id: Uuid) -> Decimal {
    let collected: Decimal = events
        .iter()
        .filter(|e| e.kind == PaymentKind::Collection && e.id == collection_id)
        .map(|e| e.amount)
        .sum();
    let refunded: Decimal = events
        .iter()
        .filter(|e| e.kind == PaymentKind::Refund && e.refund_of == Some(collection_id))
        .map(|e| e.amount)
        .sum();
    round_cash(collected - refunded)
}

/// Validates a new collection against the order total.
///
/// Returns the rounded amount to record.
///
/// # Errors
///
/// Returns `NonPositiveAmount` or `PaymentExceedsTotal`.
pub fn validate_collection(
    order_total: Decimal,
    events: &[PaymentEvent],
    amount: Decimal,
) -> Result<Decimal, LifecycleError> {
    let amount = round_cash(amount);
    if amount <= Decimal::ZERO {
        return Err(LifecycleError::NonPositiveAmount);
    }

    let paid = net_paid(events);
    if paid + amount > round_cash(order_total) {
        return Err(LifecycleError::PaymentExceedsTotal {
            total: round_cash(order_total),
            net_paid: paid,
            requested: amount,
        });
    }
    Ok(amount)
}

/// Validates a new refund against the payment history.
///
/// A refund may not exceed the net paid amount; a linked refund may also
/// not exceed its collection's unrefunded remainder. Returns the rounded
/// amount to record.
///
/// # Errors
///
/// Returns `NonPositiveAmount`, `RefundExceedsCollected`,
/// `LinkedCollectionNotFound`, or `RefundExceedsCollection`.
pub fn validate_refund(
    events: &[PaymentEvent],
    amount: Decimal,
    refund_of: Option<Uuid>,
) -> Result<Decimal, LifecycleError> {
    let amount = round_cash(amount);
    if amount <= Decimal::ZERO {
        return Err(LifecycleError::NonPositiveAmount);
    }

    let paid = net_paid(events);
    if amount > paid {
        return Err(LifecycleError::RefundExceedsCollected {
            available: paid,
            requested: amount,
        });
    }

    if let Some(collection_id) = refund_of {
        if !events
            .iter()
            .any(|e| e.kind == PaymentKind::Collection && e.id == collection_id)
        {
            return Err(LifecycleError::LinkedCollectionNotFound(collection_id));
        }
        let remaining = collection_remaining(events, collection_id);
        if amount > remaining {
            return Err(LifecycleError::RefundExceedsCollection {
                available: remaining,
                requested: amount,
            });
        }
    }

    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn collection(amount: Decimal) -> PaymentEvent {
        PaymentEvent {
            id: Uuid::new_v4(),
            kind: PaymentKind::Collection,
            amount,
            refund_of: None,
        }
    }

    fn refund(amount: Decimal, refund_of: Option<Uuid>) -> PaymentEvent {
        PaymentEvent {
            id: Uuid::new_v4(),
            kind: PaymentKind::Refund,
            amount,
            refund_of,
        }
    }

    #[test]
    fn test_net_paid_subtracts_refunds() {
        let events = vec![
            collection(dec!(150.00)),
            refund(dec!(40.00), None),
            collection(dec!(10.00)),
        ];
        assert_eq!(net_paid(&events), dec!(120.00));
    }

    #[test]
    fn test_collection_cannot_exceed_total() {
        // Total 200.00, paid 150.00: another 60.00 does not fit.
        let events = vec![collection(dec!(150.00))];
        let err = validate_collection(dec!(200.00), &events, dec!(60.00)).unwrap_err();
        match err {
            LifecycleError::PaymentExceedsTotal {
                total,
                net_paid,
                requested,
            } => {
                assert_eq!(total, dec!(200.00));
                assert_eq!(net_paid, dec!(150.00));
                assert_eq!(requested, dec!(60.00));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_collection_up_to_total_is_allowed() {
        let events = vec![collection(dec!(150.00))];
        assert_eq!(
            validate_collection(dec!(200.00), &events, dec!(50.00)).unwrap(),
            dec!(50.00)
        );
    }

    #[test]
    fn test_refund_cannot_exceed_net_paid() {
        // Paid 150.00: refunding 200.00 fails with both quantities.
        let events = vec![collection(dec!(150.00))];
        let err = validate_refund(&events, dec!(200.00), None).unwrap_err();
        match err {
            LifecycleError::RefundExceedsCollected {
                available,
                requested,
            } => {
                assert_eq!(available, dec!(150.00));
                assert_eq!(requested, dec!(200.00));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_linked_refund_capped_by_collection_remainder() {
        let first = collection(dec!(100.00));
        let first_id = first.id;
        let events = vec![
            first,
            collection(dec!(50.00)),
            refund(dec!(80.00), Some(first_id)),
        ];

        // 20.00 left on the linked collection even though net paid is 70.00.
        assert_eq!(collection_remaining(&events, first_id), dec!(20.00));
        assert_eq!(
            validate_refund(&events, dec!(20.00), Some(first_id)).unwrap(),
            dec!(20.00)
        );
        assert!(matches!(
            validate_refund(&events, dec!(30.00), Some(first_id)),
            Err(LifecycleError::RefundExceedsCollection {
                available,
                requested,
            }) if available == dec!(20.00) && requested == dec!(30.00)
        ));
    }

    #[test]
    fn test_linked_refund_requires_existing_collection() {
        let events = vec![collection(dec!(50.00))];
        let missing = Uuid::new_v4();
        assert!(matches!(
            validate_refund(&events, dec!(10.00), Some(missing)),
            Err(LifecycleError::LinkedCollectionNotFound(id)) if id == missing
        ));
    }

    #[test]
    fn test_amounts_must_be_positive() {
        assert!(matches!(
            validate_collection(dec!(100.00), &[], Decimal::ZERO),
            Err(LifecycleError::NonPositiveAmount)
        ));
        assert!(matches!(
            validate_refund(&[collection(dec!(10.00))], dec!(-5.00), None),
            Err(LifecycleError::NonPositiveAmount)
        ));
    }

    #[test]
    fn test_full_refund_zeroes_net_paid() {
        // Total 100.00 paid in full, then refunded in full.
        let paid = vec![collection(dec!(100.00))];
        let amount = validate_refund(&paid, dec!(100.00), None).unwrap();
        let events = vec![paid[0], refund(amount, None)];
        assert_eq!(net_paid(&events), Decimal::ZERO);
    }
}
