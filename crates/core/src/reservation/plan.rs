//! Reservation sync planning.

use uuid::Uuid;

use super::availability::available_quantity;
use super::error::ReservationError;

/// Quantity of one unit demanded by an order's lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineDemand {
    /// The demanded unit.
    pub unit_id: Uuid,
    /// Quantity to hold.
    pub quantity: i32,
}

/// Availability of one unit as loaded inside the deciding transaction.
///
/// `reserved_other_orders` excludes the syncing order's own rows, which is
/// how the order's prior holds are added back before comparing.
#[derive(Debug, Clone, Copy)]
pub struct UnitAvailability {
    /// The unit.
    pub unit_id: Uuid,
    /// Quantity on hand.
    pub on_hand: i32,
    /// Quantity held by reservations of other active orders.
    pub reserved_other_orders: i32,
}

/// The row changes that make an order's reservations match its lines.
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    /// One entry per demanded unit; insert or update to this quantity.
    pub upserts: Vec<LineDemand>,
    /// Units whose existing reservation rows must be deleted.
    pub releases: Vec<Uuid>,
}

/// Plans the reservation changes for a reserving order entering or staying
/// in a reservable state.
///
/// Line demands for the same unit are aggregated. Every demand is compared
/// against `on_hand − reserved_other_orders`; the first shortfall aborts
/// planning so the caller persists nothing. Units currently held but no
/// longer demanded are released.
///
/// # Errors
///
/// Returns `InsufficientAvailable` on the first shortfall, or
/// `NonPositiveQuantity` for an invalid demand.
pub fn plan_sync(
    demanded: &[LineDemand],
    existing_own: &[LineDemand],
    availability: &[UnitAvailability],
) -> Result<SyncPlan, ReservationError> {
    let mut aggregated: Vec<LineDemand> = Vec::with_capacity(demanded.len());
    for line in demanded {
        if line.quantity <= 0 {
            return Err(ReservationError::NonPositiveQuantity);
        }
        match aggregated.iter_mut().find(|d| d.unit_id == line.unit_id) {
            Some(existing) => existing.quantity += line.quantity,
            None => aggregated.push(*line),
        }
    }

    for demand in &aggregated {
        let available = availability
            .iter()
            .find(|a| a.unit_id == demand.unit_id)
            .map_or(0, |a| {
                available_quantity(a.on_hand, a.reserved_other_orders)
            });

        if demand.quantity > available {
            return Err(ReservationError::InsufficientAvailable {
                unit_id: demand.unit_id,
                requested: demand.quantity,
                available,
            });
        }
    }

    let releases = existing_own
        .iter()
        .filter(|held| !aggregated.iter().any(|d| d.unit_id == held.unit_id))
        .map(|held| held.unit_id)
        .collect();

    Ok(SyncPlan {
        upserts: aggregated,
        releases,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demand(unit_id: Uuid, quantity: i32) -> LineDemand {
        LineDemand { unit_id, quantity }
    }

    fn avail(unit_id: Uuid, on_hand: i32, reserved: i32) -> UnitAvailability {
        UnitAvailability {
            unit_id,
            on_hand,
            reserved_other_orders: reserved,
        }
    }

    #[test]
    fn test_plan_holds_exactly_the_demand() {
        let unit = Uuid::new_v4();
        let plan = plan_sync(&[demand(unit, 5)], &[], &[avail(unit, 5, 0)]).unwrap();
        assert_eq!(plan.upserts, vec![demand(unit, 5)]);
        assert!(plan.releases.is_empty());
    }

    #[test]
    fn test_shortfall_against_other_orders_holds() {
        // On hand 5, another order holds all 5: a new 1-unit order fails.
        let unit = Uuid::new_v4();
        let err = plan_sync(&[demand(unit, 1)], &[], &[avail(unit, 5, 5)]).unwrap_err();
        match err {
            ReservationError::InsufficientAvailable {
                unit_id,
                requested,
                available,
            } => {
                assert_eq!(unit_id, unit);
                assert_eq!(requested, 1);
                assert_eq!(available, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_own_holds_are_added_back() {
        // The order already holds 5 of 5 on hand; raising to 5 again passes
        // because its own rows are not counted against it.
        let unit = Uuid::new_v4();
        let plan = plan_sync(
            &[demand(unit, 5)],
            &[demand(unit, 5)],
            &[avail(unit, 5, 0)],
        )
        .unwrap();
        assert_eq!(plan.upserts, vec![demand(unit, 5)]);
    }

    #[test]
    fn test_dropped_lines_are_released() {
        let kept = Uuid::new_v4();
        let dropped = Uuid::new_v4();
        let plan = plan_sync(
            &[demand(kept, 2)],
            &[demand(kept, 1), demand(dropped, 3)],
            &[avail(kept, 10, 0)],
        )
        .unwrap();
        assert_eq!(plan.upserts, vec![demand(kept, 2)]);
        assert_eq!(plan.releases, vec![dropped]);
    }

    #[test]
    fn test_duplicate_lines_aggregate() {
        let unit = Uuid::new_v4();
        let plan = plan_sync(
            &[demand(unit, 2), demand(unit, 3)],
            &[],
            &[avail(unit, 5, 0)],
        )
        .unwrap();
        assert_eq!(plan.upserts, vec![demand(unit, 5)]);
    }

    #[test]
    fn test_unknown_unit_counts_as_unavailable() {
        let unit = Uuid::new_v4();
        assert!(matches!(
            plan_sync(&[demand(unit, 1)], &[], &[]),
            Err(ReservationError::InsufficientAvailable { available: 0, .. })
        ));
    }

    #[test]
    fn test_non_positive_demand_is_rejected() {
        let unit = Uuid::new_v4();
        assert!(matches!(
            plan_sync(&[demand(unit, 0)], &[], &[avail(unit, 10, 0)]),
            Err(ReservationError::NonPositiveQuantity)
        ));
    }
}
