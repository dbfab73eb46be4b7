//! Property-based and concurrency tests.
//!
//! These check invariants that must hold for any input document.

use jmespath_engine::compile;
use proptest::prelude::*;
use serde_json::{Map, Value};

// ============================================================================
// Strategies
// ============================================================================

/// Strategy: arbitrary JSON documents of bounded size
fn json_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-z]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<String, Value>>())),
        ]
    })
}

fn int_array() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(-1000i64..1000, 0..20)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// `@` returns the document unchanged.
    #[test]
    fn prop_current_node_is_identity(doc in json_strategy()) {
        let expr = compile("@").unwrap();
        prop_assert_eq!(expr.search(&doc).unwrap(), doc);
    }

    /// Evaluating the same expression twice gives the same answer.
    #[test]
    fn prop_search_is_deterministic(doc in json_strategy()) {
        for text in ["*.*", "[*][0]", "values(@)", "sort(keys(@))", "[?@ != `null`] | length(@)"] {
            let expr = compile(text).unwrap();
            prop_assert_eq!(expr.search(&doc).unwrap(), expr.search(&doc).unwrap());
        }
    }

    /// List projections drop null elements and keep everything else in order.
    #[test]
    fn prop_list_projection_skips_nulls(items in prop::collection::vec(json_strategy(), 0..10)) {
        let expr = compile("[*]").unwrap();
        let expected: Vec<Value> = items.iter().filter(|v| !v.is_null()).cloned().collect();
        prop_assert_eq!(expr.search(&Value::Array(items)).unwrap(), Value::Array(expected));
    }

    /// `[:]` copies an array and `[::-1]` reverses it.
    #[test]
    fn prop_full_slices(items in int_array()) {
        let doc = Value::from(items.clone());
        prop_assert_eq!(compile("[:]").unwrap().search(&doc).unwrap(), doc.clone());
        let reversed: Vec<i64> = items.iter().rev().copied().collect();
        prop_assert_eq!(compile("[::-1]").unwrap().search(&doc).unwrap(), Value::from(reversed));
    }

    /// Positive-step slices agree with the equivalent range.
    #[test]
    fn prop_slice_matches_range(items in int_array(), start in 0usize..25, stop in 0usize..25) {
        let doc = Value::from(items.clone());
        let expr = compile(&format!("[{start}:{stop}]")).unwrap();
        let lo = start.min(items.len());
        let hi = stop.min(items.len()).max(lo);
        prop_assert_eq!(expr.search(&doc).unwrap(), Value::from(items[lo..hi].to_vec()));
    }

    /// Negative indices count from the end.
    #[test]
    fn prop_negative_index(items in int_array(), offset in 1usize..25) {
        let doc = Value::from(items.clone());
        let expr = compile(&format!("[-{offset}]")).unwrap();
        let expected = items
            .len()
            .checked_sub(offset)
            .map(|i| Value::from(items[i]))
            .unwrap_or(Value::Null);
        prop_assert_eq!(expr.search(&doc).unwrap(), expected);
    }

    /// `sort` orders numbers ascending.
    #[test]
    fn prop_sort_orders_numbers(items in int_array()) {
        let mut sorted = items.clone();
        sorted.sort();
        let result = compile("sort(@)").unwrap().search(&Value::from(items)).unwrap();
        prop_assert_eq!(result, Value::from(sorted));
    }
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn one_expression_many_threads() {
    let expr = compile("items[?n > `2`].n | sum(@)").unwrap();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8i64)
            .map(|t| {
                let expr = &expr;
                scope.spawn(move || {
                    let items: Vec<Value> =
                        (0..=t + 3).map(|n| serde_json::json!({"n": n})).collect();
                    let doc = serde_json::json!({"items": items});
                    let expected: i64 = (3..=t + 3).sum();
                    for _ in 0..50 {
                        assert_eq!(expr.search(&doc).unwrap(), Value::from(expected));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    });
}
