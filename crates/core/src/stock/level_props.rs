//! Property tests for weighted-average level math.

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::level::StockLevel;

/// Strategy for an inbound batch: quantity 1..=500, cost 0.00..=100.00.
fn batch_strategy() -> impl Strategy<Value = (i32, Decimal)> {
    (1i32..=500, 0i64..=10_000).prop_map(|(q, c)| (q, Decimal::new(c, 2)))
}

fn inbound_history() -> impl Strategy<Value = Vec<(i32, Decimal)>> {
    prop::collection::vec(batch_strategy(), 1..15)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// *For any* inbound history, on-hand equals the quantity sum and the
    /// average stays within the range of received costs.
    #[test]
    fn prop_average_bounded_by_input_costs(batches in inbound_history()) {
        let mut level = StockLevel::empty(Uuid::new_v4());
        for (qty, cost) in &batches {
            level = level.apply_inbound(*qty, *cost).unwrap();
        }

        let total: i32 = batches.iter().map(|(q, _)| q).sum();
        prop_assert_eq!(level.on_hand, total);

        let min = batches.iter().map(|(_, c)| *c).min().unwrap();
        let max = batches.iter().map(|(_, c)| *c).max().unwrap();
        prop_assert!(level.average_cost >= min);
        prop_assert!(level.average_cost <= max);
    }

    /// *For any* level, an outbound changes the quantity but never the
    /// average, and the charged cost is the average at the time.
    #[test]
    fn prop_outbound_freezes_average(
        batches in inbound_history(),
        take_ratio in 1u32..=100,
    ) {
        let mut level = StockLevel::empty(Uuid::new_v4());
        for (qty, cost) in &batches {
            level = level.apply_inbound(*qty, *cost).unwrap();
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let take = ((i64::from(level.on_hand) * i64::from(take_ratio)) / 100).max(1) as i32;
        prop_assume!(take <= level.on_hand);

        let before = level.average_cost;
        let (after, charged) = level.apply_outbound(take).unwrap();

        prop_assert_eq!(charged, before);
        prop_assert_eq!(after.average_cost, before);
        prop_assert_eq!(after.on_hand, level.on_hand - take);
    }

    /// *For any* sequence of checked movements, the on-hand quantity equals
    /// the signed sum of applied movements and never goes negative.
    #[test]
    fn prop_on_hand_equals_signed_movement_sum(
        batches in inbound_history(),
        outs in prop::collection::vec(1i32..=50, 0..10),
    ) {
        let mut level = StockLevel::empty(Uuid::new_v4());
        let mut signed_sum = 0i32;

        for (qty, cost) in &batches {
            level = level.apply_inbound(*qty, *cost).unwrap();
            signed_sum += qty;
        }
        for qty in &outs {
            if let Ok((next, _)) = level.apply_outbound(*qty) {
                level = next;
                signed_sum -= qty;
            }
        }

        prop_assert_eq!(level.on_hand, signed_sum);
        prop_assert!(level.on_hand >= 0);
    }
}
