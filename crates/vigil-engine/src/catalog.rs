//! Scenario catalog
//!
//! The catalog is read-only after construction and shared across concurrent
//! requests behind an `Arc`. Ordering is discovery order (sorted by path when
//! loaded from disk) and never changes for the catalog's lifetime.

use crate::error::CatalogError;
use crate::scenario::{normalize_tag, Scenario, ScenarioFile};
use std::collections::{HashMap, HashSet};
use std::path::{Component, Path};
use std::sync::Arc;
use tracing::{debug, info};

/// Immutable, ordered set of known scenarios
#[derive(Debug, Clone, Default)]
pub struct ScenarioCatalog {
    scenarios: Vec<Arc<Scenario>>,
    by_path: HashMap<String, usize>,
}

impl ScenarioCatalog {
    /// Build a catalog from scenarios in discovery order
    pub fn from_scenarios<I>(scenarios: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = Scenario>,
    {
        let mut catalog = Self::default();
        for scenario in scenarios {
            if catalog.by_path.contains_key(scenario.id()) {
                return Err(CatalogError::Duplicate(scenario.id().to_string()));
            }
            catalog
                .by_path
                .insert(scenario.id().to_string(), catalog.scenarios.len());
            catalog.scenarios.push(Arc::new(scenario));
        }
        Ok(catalog)
    }

    /// Discover `**/*.<extension>` files under `root`, sorted by relative path
    pub fn load(root: &Path, extension: &str) -> Result<Self, CatalogError> {
        if !root.is_dir() {
            return Err(CatalogError::MissingRoot {
                path: root.to_path_buf(),
            });
        }

        let pattern = root.join("**").join(format!("*.{extension}"));
        let pattern = pattern.to_string_lossy();
        let entries = glob::glob(&pattern).map_err(|e| CatalogError::Pattern(e.to_string()))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| CatalogError::Io {
                path: e.path().to_path_buf(),
                message: e.error().to_string(),
            })?;
            if path.is_file() {
                let id = scenario_id(root, &path);
                files.push((id, path));
            }
        }
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let mut scenarios = Vec::with_capacity(files.len());
        for (id, path) in files {
            let content = std::fs::read_to_string(&path).map_err(|e| CatalogError::Io {
                path: path.clone(),
                message: e.to_string(),
            })?;
            let file: ScenarioFile = toml::from_str(&content).map_err(|e| CatalogError::Parse {
                path: path.clone(),
                message: e.to_string(),
            })?;
            debug!(scenario = %id, steps = file.steps.len(), "loaded scenario");
            scenarios.push(Scenario::new(id, file));
        }

        let catalog = Self::from_scenarios(scenarios)?;
        info!(root = %root.display(), scenarios = catalog.len(), "scenario catalog loaded");
        Ok(catalog)
    }

    /// Scenarios carrying at least one of `tags`; an empty list matches nothing
    pub fn scenarios_matching_tags<S: AsRef<str>>(&self, tags: &[S]) -> Vec<Arc<Scenario>> {
        let wanted: HashSet<&str> = tags.iter().map(|t| normalize_tag(t.as_ref())).collect();
        if wanted.is_empty() {
            return Vec::new();
        }
        self.scenarios
            .iter()
            .filter(|scenario| {
                scenario
                    .tags()
                    .iter()
                    .any(|tag| wanted.contains(normalize_tag(tag)))
            })
            .cloned()
            .collect()
    }

    /// Every scenario in catalog order
    pub fn all_scenarios(&self) -> Vec<Arc<Scenario>> {
        self.scenarios.clone()
    }

    /// Scenario with exactly this path
    pub fn scenario_by_path(&self, path: &str) -> Option<Arc<Scenario>> {
        self.by_path
            .get(path)
            .and_then(|index| self.scenarios.get(*index))
            .cloned()
    }

    /// Scenario paths in catalog order
    pub fn paths(&self) -> Vec<String> {
        self.scenarios.iter().map(|s| s.id().to_string()).collect()
    }

    /// Number of scenarios
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

/// Relative path with `/` separators, independent of the host platform
fn scenario_id(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
