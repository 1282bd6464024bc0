//! Property-based tests for nebula-record-validator.

use nebula_record_validator::prelude::*;
use nebula_record_validator::validators::IpBlock;
use proptest::prelude::*;
use std::net::Ipv4Addr;

fn hosts_rule() -> RuleSet {
    RuleSet::new()
        .validates(
            &["hosts"],
            &Options::new().nested(
                "hash_values",
                Options::new()
                    .with("multiple_errors", true)
                    .with("hostname", true)
                    .with("presence", true),
            ),
        )
        .unwrap()
}

// ============================================================================
// IDEMPOTENCY: validate(r) == validate(r)
// ============================================================================

proptest! {
    #[test]
    fn hostname_idempotent(s in ".{0,40}") {
        let rules = RuleSet::new()
            .validates(&["host"], &Options::new().with("hostname", true))
            .unwrap();
        let record = MemoryRecord::new().with_attribute("host", s);
        let first = rules.validate(&record).unwrap();
        let second = rules.validate(&record).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn email_idempotent(s in ".{0,40}") {
        let rules = RuleSet::new()
            .validates(&["email"], &Options::new().with("email", true))
            .unwrap();
        let record = MemoryRecord::new().with_attribute("email", s);
        prop_assert_eq!(rules.validate(&record).unwrap(), rules.validate(&record).unwrap());
    }

    #[test]
    fn hash_values_idempotent_and_key_free_between_passes(
        entries in proptest::collection::vec(("[a-z]{1,8}", "[a-z.-]{0,12}"), 0..8)
    ) {
        let rules = hosts_rule();
        let record = MemoryRecord::new()
            .with_attribute("hosts", Value::map(entries))
            .with_attribute("other", "");
        let first = rules.validate(&record).unwrap();
        let second = rules.validate(&record).unwrap();
        prop_assert_eq!(&first, &second);

        // a different attribute validated afterwards never sees a stale key
        let follow_up = RuleSet::new()
            .validates(&["other"], &Options::new().with("presence", true))
            .unwrap();
        let later = follow_up.validate(&record).unwrap();
        prop_assert!(later.iter().all(|e| e.element_key.is_none()));
    }
}

// ============================================================================
// COMPOSITE BOUNDS
// ============================================================================

proptest! {
    #[test]
    fn default_composite_emits_at_most_one_error_per_sub_rule(
        items in proptest::collection::vec("[a-z-]{0,6}(\\.[a-z]{0,3})?", 0..12)
    ) {
        let rules = RuleSet::new()
            .validates(
                &["domains"],
                &Options::new().nested(
                    "array",
                    Options::new().with("hostname", true).with("presence", true),
                ),
            )
            .unwrap();
        let record = MemoryRecord::new().with_attribute("domains", Value::list(items));
        prop_assert!(rules.validate(&record).unwrap().len() <= 2);
    }

    #[test]
    fn multiple_errors_matches_per_element_count(
        items in proptest::collection::vec("[a-z ]{0,4}", 0..12)
    ) {
        let rules = RuleSet::new()
            .validates(
                &["names"],
                &Options::new().nested(
                    "array",
                    Options::new().with("multiple_errors", true).with("presence", true),
                ),
            )
            .unwrap();
        let blanks = items.iter().filter(|s| s.trim().is_empty()).count();
        let record = MemoryRecord::new().with_attribute("names", Value::list(items));
        prop_assert_eq!(rules.validate(&record).unwrap().len(), blanks);
    }
}

// ============================================================================
// IP BLOCKS: containment follows the masked range
// ============================================================================

proptest! {
    #[test]
    fn block_contains_its_own_addresses(addr in any::<u32>(), prefix in 0u8..=32, offset in any::<u32>()) {
        let block = IpBlock::parse(&format!("{}/{prefix}", Ipv4Addr::from(addr))).unwrap();
        let host_bits = if prefix == 0 { u32::MAX } else { (1u64 << (32 - u32::from(prefix))) as u32 - 1 };
        let inside = (addr & !host_bits) | (offset & host_bits);
        let host = IpBlock::parse(&Ipv4Addr::from(inside).to_string()).unwrap();
        prop_assert!(block.contains(&host));
    }

    #[test]
    fn masked_block_round_trips_through_display(addr in any::<u32>(), prefix in 0u8..=32) {
        let block = IpBlock::parse(&format!("{}/{prefix}", Ipv4Addr::from(addr))).unwrap();
        let reparsed = IpBlock::parse(&block.to_string()).unwrap();
        prop_assert_eq!(block, reparsed);
    }
}
