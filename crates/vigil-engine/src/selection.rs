//! Selection resolution
//!
//! Priority: an explicit `feature` always wins, then a non-empty tag list,
//! then the whole catalog.

use crate::catalog::ScenarioCatalog;
use crate::error::SelectionError;
use crate::request::ExecutionRequest;
use crate::scenario::Scenario;
use std::sync::Arc;

/// Turns requests into ordered scenario lists
#[derive(Debug, Clone)]
pub struct SelectionResolver {
    catalog: Arc<ScenarioCatalog>,
}

impl SelectionResolver {
    /// Resolver over a shared catalog
    pub fn new(catalog: Arc<ScenarioCatalog>) -> Self {
        Self { catalog }
    }

    /// Resolve the request's selection criterion
    pub fn resolve(&self, request: &ExecutionRequest) -> Result<Vec<Arc<Scenario>>, SelectionError> {
        if let Some(feature) = &request.feature {
            if feature.trim().is_empty() {
                return Err(SelectionError::InvalidRequest(
                    "feature must not be empty".to_string(),
                ));
            }
            return self
                .catalog
                .scenario_by_path(feature)
                .map(|scenario| vec![scenario])
                .ok_or_else(|| SelectionError::ScenarioNotFound(feature.clone()));
        }

        match request.tags.as_deref() {
            Some(tags) if !tags.is_empty() => Ok(self.catalog.scenarios_matching_tags(tags)),
            _ => Ok(self.catalog.all_scenarios()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn resolver() -> SelectionResolver {
        let catalog = ScenarioCatalog::from_scenarios([
            Scenario::tagged("A", ["@smoke"]),
            Scenario::tagged("B", ["@s3"]),
            Scenario::tagged("C", ["@smoke", "@s3"]),
        ])
        .unwrap();
        SelectionResolver::new(Arc::new(catalog))
    }

    fn ids(selection: Vec<Arc<Scenario>>) -> Vec<String> {
        selection.iter().map(|s| s.id().to_string()).collect()
    }

    #[test]
    fn no_criteria_selects_everything() {
        let resolver = resolver();
        assert_eq!(ids(resolver.resolve(&ExecutionRequest::default()).unwrap()), ["A", "B", "C"]);
        let empty_tags = ExecutionRequest::with_tags(Vec::<String>::new());
        assert_eq!(ids(resolver.resolve(&empty_tags).unwrap()), ["A", "B", "C"]);
    }

    #[test]
    fn tags_select_by_intersection() {
        let resolver = resolver();
        let selection = resolver.resolve(&ExecutionRequest::with_tags(["smoke"])).unwrap();
        assert_eq!(ids(selection), ["A", "C"]);
    }

    #[test]
    fn feature_wins_over_tags() {
        let resolver = resolver();
        let request = ExecutionRequest {
            tags: Some(vec!["smoke".to_string()]),
            ..ExecutionRequest::with_feature("B")
        };
        assert_eq!(ids(resolver.resolve(&request).unwrap()), ["B"]);
    }

    #[test]
    fn unknown_feature_is_not_found() {
        let resolver = resolver();
        assert_matches!(
            resolver.resolve(&ExecutionRequest::with_feature("unknown/path.feature")),
            Err(SelectionError::ScenarioNotFound(path)) if path == "unknown/path.feature"
        );
        assert_matches!(
            resolver.resolve(&ExecutionRequest::with_feature(" ")),
            Err(SelectionError::InvalidRequest(_))
        );
    }

    #[test]
    fn unmatched_tags_select_nothing() {
        let resolver = resolver();
        let selection = resolver.resolve(&ExecutionRequest::with_tags(["nonexistent"])).unwrap();
        assert!(selection.is_empty());
    }
}
