//! Property tests for port allocation.

use std::collections::BTreeSet;

use proptest::prelude::*;

use docklift::domain::services::{allocate, BASE_PORT};

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: The allocated port is free, at or above the base, and the
    /// lowest such port.
    #[test]
    fn property_allocates_lowest_free_port(
        taken in proptest::collection::btree_set(2990u16..3050, 0..40)
    ) {
        let port = allocate(None, &taken).unwrap();
        prop_assert!(port >= BASE_PORT);
        prop_assert!(!taken.contains(&port));
        prop_assert!((BASE_PORT..port).all(|p| taken.contains(&p)));
    }

    /// PROPERTY: An explicit port always wins.
    #[test]
    fn property_explicit_port_wins(
        explicit in 1u16..,
        taken in proptest::collection::btree_set(any::<u16>(), 0..20)
    ) {
        prop_assert_eq!(allocate(Some(explicit), &taken), Ok(explicit));
    }

    /// PROPERTY: Allocation depends only on the set, not on insertion order.
    #[test]
    fn property_allocation_is_order_independent(
        mut ports in proptest::collection::vec(3000u16..3020, 0..20)
    ) {
        let forward: BTreeSet<u16> = ports.iter().copied().collect();
        ports.reverse();
        let backward: BTreeSet<u16> = ports.into_iter().collect();
        prop_assert_eq!(allocate(None, &forward), allocate(None, &backward));
    }
}
