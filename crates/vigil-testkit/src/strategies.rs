//! Property test strategies for Vigil types
//!
//! Strategies are composable and shared by the property tests of every crate
//! above the core.

use proptest::collection::{btree_map, vec};
use proptest::prelude::*;
use vigil_core::DynamicValue;
use vigil_engine::{ExecutionRequest, ScenarioOutcome};

// Re-export proptest for convenience
pub use proptest;

/// Finite `f64` values, mixing integers and fractions
pub fn arb_number() -> impl Strategy<Value = f64> {
    prop_oneof![
        (-1_000_000i64..1_000_000).prop_map(|n| n as f64),
        (-1.0e12f64..1.0e12).prop_filter("finite", |n| n.is_finite()),
        Just(0.1),
        Just(-0.0),
    ]
}

/// Leaf values: null, strings, numbers and booleans
pub fn arb_scalar() -> impl Strategy<Value = DynamicValue> {
    prop_oneof![
        Just(DynamicValue::Null),
        "[a-zA-Z0-9 _.-]{0,12}".prop_map(DynamicValue::String),
        arb_number().prop_map(DynamicValue::Number),
        any::<bool>().prop_map(DynamicValue::Boolean),
    ]
}

/// Arbitrary value trees up to four levels deep
///
/// # Example
///
/// ```rust
/// use vigil_testkit::strategies::arb_dynamic_value;
/// use proptest::prelude::*;
///
/// proptest! {
///     #[test]
///     fn renders(value in arb_dynamic_value()) {
///         let _ = value.to_string();
///     }
/// }
/// ```
pub fn arb_dynamic_value() -> impl Strategy<Value = DynamicValue> {
    arb_scalar().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            vec(inner.clone(), 0..6).prop_map(DynamicValue::List),
            btree_map("[a-z][a-z0-9_]{0,7}", inner, 0..6).prop_map(DynamicValue::Map),
        ]
    })
}

/// Map-valued trees, the shape stored in key-value tables
pub fn arb_item() -> impl Strategy<Value = DynamicValue> {
    btree_map("[a-z][a-z0-9_]{0,7}", arb_dynamic_value(), 0..6).prop_map(DynamicValue::Map)
}

/// Tag labels from a small alphabet, with or without `@`
pub fn arb_tag() -> impl Strategy<Value = String> {
    (prop::sample::select(vec!["smoke", "s3", "dynamo", "sqs", "slow"]), any::<bool>())
        .prop_map(|(name, at)| if at { format!("@{name}") } else { name.to_string() })
}

/// Outcomes with unique ids `s0`, `s1`, ...
pub fn arb_outcomes() -> impl Strategy<Value = Vec<ScenarioOutcome>> {
    vec((any::<bool>(), 0u64..10_000, "[a-z ]{1,12}"), 0..40).prop_map(|entries| {
        entries
            .into_iter()
            .enumerate()
            .map(|(index, (passed, duration_ms, detail))| {
                let id = format!("s{index}");
                if passed {
                    ScenarioOutcome::passed(id, duration_ms)
                } else {
                    ScenarioOutcome::failed(id, detail, duration_ms)
                }
            })
            .collect()
    })
}

/// Requests with any mix of feature, tags and threads
pub fn arb_request(paths: Vec<String>) -> impl Strategy<Value = ExecutionRequest> {
    let feature = prop_oneof![
        Just(None),
        prop::sample::select(paths).prop_map(Some),
        Just(Some("missing.toml".to_string())),
    ];
    (
        feature,
        proptest::option::of(vec(arb_tag(), 0..3)),
        proptest::option::of(-5i64..50),
    )
        .prop_map(|(feature, tags, threads)| ExecutionRequest {
            feature,
            tags,
            threads,
            ..ExecutionRequest::default()
        })
}
