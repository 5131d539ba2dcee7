//! Property tests for identity-ordered acquisition.
//!
//! - Pair order: `lock_pair(a, b)` and `lock_pair(b, a)` take the same guard first
//! - Release: after any acquisition, every guard is free again
//! - N-way: participants are acquired sorted and deduplicated

use palisade_core::{lock_many, lock_pair, Guard, Guardable, Lockable, SlotStatus};
use proptest::prelude::*;

fn pool(size: usize, guarded_mask: u8) -> Vec<Lockable<u16>> {
    (0..size)
        .map(|i| {
            let mut entity = Lockable::named("Gauge");
            entity.initialize().unwrap();
            if guarded_mask & (1 << i) != 0 {
                entity.enable_thread_safety().unwrap();
            }
            entity
        })
        .collect()
}

fn all_free(entities: &[Lockable<u16>]) -> bool {
    entities
        .iter()
        .all(|e| !e.guard().map_or(false, Guard::is_locked))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_pair_order_ignores_argument_order(
        guarded_mask in any::<u8>(),
        i in 0usize..6,
        j in 0usize..6,
    ) {
        let entities = pool(6, guarded_mask);
        let (a, b) = (&entities[i], &entities[j]);

        let forward = lock_pair(a, b).unwrap();
        let forward_order = (forward.lower_id(), forward.upper_id());
        drop(forward);
        let backward = lock_pair(b, a).unwrap();
        let backward_order = (backward.lower_id(), backward.upper_id());
        drop(backward);

        prop_assert_eq!(forward_order, backward_order);
        prop_assert_eq!(forward_order.0, a.id().min(b.id()));
        prop_assert_eq!(forward_order.1, a.id().max(b.id()));
        prop_assert!(all_free(&entities));
    }

    #[test]
    fn prop_self_pair_reports_second_not_held(guarded_mask in any::<u8>(), i in 0usize..4) {
        let entities = pool(4, guarded_mask);
        let pair = lock_pair(&entities[i], &entities[i]).unwrap();
        prop_assert_eq!(pair.second_slot(), SlotStatus::NotHeld);
        prop_assert!(pair.first_held());
        drop(pair);
        prop_assert!(all_free(&entities));
    }

    #[test]
    fn prop_lock_many_sorted_and_released(
        guarded_mask in any::<u8>(),
        picks in proptest::collection::vec(0usize..8, 0..16),
    ) {
        let entities = pool(8, guarded_mask);
        let chosen: Vec<&dyn Guardable> = picks.iter().map(|&i| &entities[i] as &dyn Guardable).collect();

        let many = lock_many(&chosen).unwrap();
        let ids = many.ids();
        prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));

        let mut expected: Vec<_> = picks.iter().map(|&i| entities[i].id()).collect();
        expected.sort();
        expected.dedup();
        prop_assert_eq!(ids, expected);

        drop(many);
        prop_assert!(all_free(&entities));
    }
}
