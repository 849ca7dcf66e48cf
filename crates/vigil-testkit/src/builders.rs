//! Scenario, catalog and service builders

use crate::time::ControllableClock;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use vigil_core::ServiceConfig;
use vigil_engine::{
    ExecutionService, Scenario, ScenarioCatalog, ScenarioExecutor, ScenarioFile, Step,
};

/// Builder for in-memory scenarios
#[derive(Debug, Clone)]
pub struct ScenarioBuilder {
    id: String,
    file: ScenarioFile,
}

impl ScenarioBuilder {
    /// Start a scenario with identifier `id`
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            file: ScenarioFile::default(),
        }
    }

    /// Add a tag
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.file.tags.push(tag.into());
        self
    }

    /// Set the description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.file.description = description.into();
        self
    }

    /// Append a step
    pub fn step(mut self, step: Step) -> Self {
        self.file.steps.push(step);
        self
    }

    /// Finish the scenario
    pub fn build(self) -> Scenario {
        Scenario::new(self.id, self.file)
    }
}

/// Catalog over the given scenarios; panics on duplicate identifiers
pub fn catalog_from<I>(scenarios: I) -> Arc<ScenarioCatalog>
where
    I: IntoIterator<Item = Scenario>,
{
    Arc::new(ScenarioCatalog::from_scenarios(scenarios).expect("scenario ids are unique"))
}

/// Catalog of scenarios tagged as given, one `(id, tags)` pair each
pub fn tagged_catalog(entries: &[(&str, &[&str])]) -> Arc<ScenarioCatalog> {
    catalog_from(
        entries
            .iter()
            .map(|(id, tags)| Scenario::tagged(*id, tags.iter().copied())),
    )
}

/// Write scenario files under `root`, creating parent directories
pub fn write_scenario_files(root: &Path, files: &[(&str, &str)]) {
    for (relative, content) in files {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }
}

/// Fresh temporary catalog root holding `files`
pub fn scenario_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    write_scenario_files(dir.path(), files);
    dir
}

/// Service with default configuration, a clock frozen at 1 000 000 ms and
/// the given executor
pub fn service_with(
    catalog: Arc<ScenarioCatalog>,
    executor: impl ScenarioExecutor + 'static,
) -> ExecutionService {
    service_with_config(ServiceConfig::default(), catalog, executor)
}

/// Like [`service_with`], with an explicit configuration
pub fn service_with_config(
    config: ServiceConfig,
    catalog: Arc<ScenarioCatalog>,
    executor: impl ScenarioExecutor + 'static,
) -> ExecutionService {
    ExecutionService::new(
        Arc::new(config),
        catalog,
        Arc::new(executor),
        Arc::new(ControllableClock::new(1_000_000)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_tagged_scenarios() {
        let scenario = ScenarioBuilder::new("a.toml")
            .tag("@smoke")
            .description("demo")
            .step(Step::Sleep { ms: 1 })
            .build();

        assert!(scenario.has_tag("smoke"));
        assert_eq!(scenario.description(), "demo");
        assert_eq!(scenario.steps().len(), 1);
    }

    #[test]
    fn tagged_catalog_keeps_order() {
        let untagged: &[&str] = &[];
        let catalog = tagged_catalog(&[("b.toml", &["@x"]), ("a.toml", untagged)]);
        assert_eq!(catalog.paths(), vec!["b.toml", "a.toml"]);
    }
}
