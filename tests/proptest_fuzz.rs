//! Property-based tests for search session building blocks.
//!
//! Uses proptest to generate random terms, filter sets and cache workloads
//! and verify the invariants hold for all of them.
//!
//! Run with: `cargo test --test proptest_fuzz`

use std::collections::VecDeque;
use std::time::Duration;

use proptest::prelude::*;
use serde_json::{json, Value};

use search_session::session::navigate;
use search_session::{
    build_key, validate, Direction, FilterSet, KeyParts, PaginationMode, ResultCache, ValidationRule,
};

// =============================================================================
// Strategies for generating test data
// =============================================================================

fn filter_pairs_strategy() -> impl Strategy<Value = Vec<(String, Value)>> {
    prop::collection::vec(
        (
            "[a-z]{1,8}",
            prop_oneof![
                any::<i64>().prop_map(Value::from),
                "[a-zA-Z0-9 ]{0,12}".prop_map(Value::from),
                any::<bool>().prop_map(Value::from),
            ],
        ),
        0..8,
    )
}

fn dedup_by_key(pairs: Vec<(String, Value)>) -> Vec<(String, Value)> {
    let mut seen = std::collections::HashSet::new();
    pairs.into_iter().filter(|(k, _)| seen.insert(k.clone())).collect()
}

// =============================================================================
// Validation
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Same input always gives the same messages in the same order
    #[test]
    fn prop_validate_deterministic(term in ".{0,40}", min in 0usize..10, max in 0usize..50) {
        let rules = vec![
            ValidationRule::new("no digits", |t: &str| !t.chars().any(|c| c.is_ascii_digit())),
            ValidationRule::new("no bang", |t: &str| !t.contains('!')),
        ];
        let first = validate(&term, &rules, min, max);
        let second = validate(&term, &rules, min, max);
        prop_assert_eq!(&first, &second);

        // Custom rule messages keep declaration order
        let digits = first.iter().position(|m| m == "no digits");
        let bang = first.iter().position(|m| m == "no bang");
        if let (Some(d), Some(b)) = (digits, bang) {
            prop_assert!(d < b);
        }
    }

    /// Terms within bounds never report length problems
    #[test]
    fn prop_validate_length_bounds(term in "[a-z]{1,20}") {
        let len = term.chars().count();
        prop_assert!(validate(&term, &[], len, len).is_empty());
        prop_assert!(!validate(&term, &[], len + 1, 100).is_empty());
    }
}

// =============================================================================
// Canonical keys
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Insertion order of filters never changes the key
    #[test]
    fn prop_key_filter_order_independent(pairs in filter_pairs_strategy(), term in "[a-z ]{0,16}") {
        let pairs = dedup_by_key(pairs);
        let forward: FilterSet = pairs.iter().cloned().collect();
        let reverse: FilterSet = pairs.iter().rev().cloned().collect();

        let key = |filters: &FilterSet| build_key(KeyParts {
            session_id: "s",
            mode: PaginationMode::Pagination,
            term: &term,
            filters,
            page: 1,
            page_size: 20,
            cursor: None,
        });
        prop_assert_eq!(key(&forward), key(&reverse));
    }

    /// Keys are valid JSON arrays of the expected arity
    #[test]
    fn prop_key_is_json_array(term in ".{0,24}", page in 1u32..1000, cursor in proptest::option::of("[a-z0-9]{1,8}")) {
        let filters = FilterSet::new();
        for (mode, arity) in [(PaginationMode::Pagination, 6), (PaginationMode::Infinite, 5)] {
            let key = build_key(KeyParts {
                session_id: "s",
                mode,
                term: &term,
                filters: &filters,
                page,
                page_size: 20,
                cursor: cursor.as_deref(),
            });
            let parsed: Value = serde_json::from_str(&key).expect("key is JSON");
            prop_assert_eq!(parsed.as_array().map(|a| a.len()), Some(arity));
            prop_assert_eq!(&parsed[2], &json!(term));
        }
    }
}

// =============================================================================
// Result cache
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Size never exceeds capacity and eviction follows insertion order
    #[test]
    fn prop_cache_bounded_fifo(capacity in 0usize..8, keys in prop::collection::vec(0u8..12, 0..40)) {
        let cache = ResultCache::new(capacity, Duration::from_secs(3600));
        let mut model: VecDeque<String> = VecDeque::new();

        for k in keys {
            let key = format!("k{}", k);
            cache.insert(key.clone(), k);

            if capacity > 0 {
                model.retain(|existing| existing != &key);
                model.push_back(key);
                while model.len() > capacity {
                    model.pop_front();
                }
            }
            prop_assert!(cache.len() <= capacity);
        }

        let mut actual = cache.keys();
        let mut expected: Vec<String> = model.into_iter().collect();
        actual.sort();
        expected.sort();
        prop_assert_eq!(actual, expected);
    }
}

// =============================================================================
// Suggestion navigation
// =============================================================================

proptest! {
    /// Navigation always lands inside the list
    #[test]
    fn prop_navigate_stays_in_range(
        len in 1usize..20,
        start in proptest::option::of(0usize..20),
        moves in prop::collection::vec(any::<bool>(), 0..30),
    ) {
        let mut selected = start.map(|s| s % len);
        for down in moves {
            let direction = if down { Direction::Down } else { Direction::Up };
            selected = navigate(selected, len, true, direction);
            prop_assert!(selected.is_some_and(|i| i < len));
        }
    }

    /// A full cycle returns to the start
    #[test]
    fn prop_navigate_cycles(len in 1usize..20, start in 0usize..20) {
        let start = Some(start % len);
        let mut selected = start;
        for _ in 0..len {
            selected = navigate(selected, len, true, Direction::Down);
        }
        prop_assert_eq!(selected, start);
    }
}
