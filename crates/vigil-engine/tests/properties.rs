//! Properties of selection resolution and aggregation

use proptest::prelude::*;
use std::sync::Arc;
use vigil_engine::{aggregate, Scenario, ScenarioCatalog, SelectionError, SelectionResolver};
use vigil_testkit::strategies::{arb_outcomes, arb_request, arb_tag};

fn catalog_strategy() -> impl Strategy<Value = Arc<ScenarioCatalog>> {
    prop::collection::vec(prop::collection::vec(arb_tag(), 0..3), 1..8).prop_map(|tag_sets| {
        let scenarios = tag_sets
            .into_iter()
            .enumerate()
            .map(|(index, tags)| Scenario::tagged(format!("f{index}.toml"), tags));
        Arc::new(ScenarioCatalog::from_scenarios(scenarios).unwrap())
    })
}

fn catalog_and_request() -> impl Strategy<Value = (Arc<ScenarioCatalog>, vigil_engine::ExecutionRequest)> {
    catalog_strategy().prop_flat_map(|catalog| {
        let paths = catalog.paths();
        (Just(catalog), arb_request(paths))
    })
}

proptest! {
    #[test]
    fn feature_wins_over_tags((catalog, request) in catalog_and_request()) {
        let resolved = SelectionResolver::new(catalog.clone()).resolve(&request);

        match (&request.feature, &request.tags) {
            (Some(feature), _) if catalog.scenario_by_path(feature).is_some() => {
                let ids: Vec<String> = resolved.unwrap().iter().map(|s| s.id().to_string()).collect();
                prop_assert_eq!(ids, vec![feature.clone()]);
            }
            (Some(feature), _) => {
                prop_assert_eq!(resolved, Err(SelectionError::ScenarioNotFound(feature.clone())));
            }
            (None, Some(tags)) if !tags.is_empty() => {
                let resolved = resolved.unwrap();
                prop_assert!(resolved.iter().all(|s| tags.iter().any(|t| s.has_tag(t))));
                let expected = catalog
                    .all_scenarios()
                    .into_iter()
                    .filter(|s| tags.iter().any(|t| s.has_tag(t)))
                    .count();
                prop_assert_eq!(resolved.len(), expected);
            }
            (None, _) => {
                prop_assert_eq!(resolved.unwrap(), catalog.all_scenarios());
            }
        }
    }

    #[test]
    fn aggregate_counts_are_consistent(outcomes in arb_outcomes(), start in 0u64..1_000, span in 0u64..1_000) {
        let summary = aggregate(&outcomes, start, start + span, "reports/run");

        prop_assert_eq!(summary.total_scenarios, outcomes.len());
        prop_assert_eq!(summary.passed_scenarios + summary.failed_scenarios, summary.total_scenarios);
        prop_assert_eq!(summary.errors.len(), summary.failed_scenarios);
        prop_assert_eq!(summary.duration_ms, span);
        prop_assert_eq!(summary.timestamp, start + span);
    }

    #[test]
    fn aggregate_is_order_independent_and_pure(outcomes in arb_outcomes()) {
        let first = aggregate(&outcomes, 10, 20, "r");
        let again = aggregate(&outcomes, 10, 20, "r");
        prop_assert_eq!(&first, &again);

        let mut reversed = outcomes.clone();
        reversed.reverse();
        prop_assert_eq!(aggregate(&reversed, 10, 20, "r"), first);
    }
}
