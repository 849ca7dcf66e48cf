//! Startup wiring
//!
//! Configuration is resolved once, in order: defaults, TOML file, `VIGIL_*`
//! environment variables, command line overrides. The validated record and
//! the collaborators built from it are then passed explicitly into the
//! execution service.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use vigil_core::effects::{ObjectStoreEffects, TimeEffects};
use vigil_core::{ServiceConfig, VigilConfig};
use vigil_effects::{
    FilesystemObjectStoreHandler, FunctionRegistryHandler, MemoryKeyValueHandler,
    MemoryObjectStoreHandler, MemoryPubSubHandler, MemoryQueueHandler, RealTimeHandler,
    StatementRegistryHandler,
};
use vigil_engine::{Capabilities, ExecutionService, ScenarioCatalog, StepInterpreter};

/// Command line values that override the loaded configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// `server.bind_address`
    pub bind_address: Option<String>,
    /// `catalog.root`
    pub catalog_root: Option<PathBuf>,
    /// `default_environment`
    pub default_environment: Option<String>,
}

impl ConfigOverrides {
    fn entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = Vec::new();
        if let Some(bind) = &self.bind_address {
            entries.push(("server.bind_address", bind.clone()));
        }
        if let Some(root) = &self.catalog_root {
            entries.push(("catalog.root", root.to_string_lossy().into_owned()));
        }
        if let Some(environment) = &self.default_environment {
            entries.push(("default_environment", environment.clone()));
        }
        entries
    }
}

/// Resolve and validate the service configuration
pub fn load_config(
    path: Option<&Path>,
    vars: impl IntoIterator<Item = (String, String)>,
    overrides: &ConfigOverrides,
) -> Result<ServiceConfig> {
    let mut config = match path {
        Some(path) => ServiceConfig::load_from_file(path)?,
        None => ServiceConfig::defaults(),
    };
    config.merge_with_vars(vars)?;
    for (key, value) in overrides.entries() {
        config.set_from_string(key, &value)?;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Collaborators backed by local, in-process handlers
///
/// Objects live under `object_root` when given and in memory otherwise.
pub fn local_capabilities(object_root: Option<&Path>) -> Capabilities {
    let object_store: Arc<dyn ObjectStoreEffects> = match object_root {
        Some(root) => Arc::new(FilesystemObjectStoreHandler::new(root)),
        None => Arc::new(MemoryObjectStoreHandler::new()),
    };
    Capabilities {
        object_store,
        key_value: Arc::new(MemoryKeyValueHandler::new()),
        functions: Arc::new(FunctionRegistryHandler::with_builtins()),
        queues: Arc::new(MemoryQueueHandler::new()),
        pubsub: Arc::new(MemoryPubSubHandler::new()),
        relational: Arc::new(StatementRegistryHandler::new()),
        time: Arc::new(RealTimeHandler::new()),
    }
}

/// Load the catalog and assemble the execution service
pub fn build_service(config: ServiceConfig, capabilities: Capabilities) -> Result<ExecutionService> {
    let catalog = ScenarioCatalog::load(&config.catalog.root, &config.catalog.extension)
        .with_context(|| format!("failed to load scenarios from {}", config.catalog.root.display()))?;
    info!(
        scenarios = catalog.len(),
        default_environment = %config.default_environment,
        "execution service ready"
    );

    let time: Arc<dyn TimeEffects> = capabilities.time.clone();
    Ok(ExecutionService::new(
        Arc::new(config),
        Arc::new(catalog),
        Arc::new(StepInterpreter::new(capabilities)),
        time,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn later_sources_win() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "default_environment = \"qa\"\n[server]\nbind_address = \"0.0.0.0:9000\""
        )
        .unwrap();

        let vars = vec![("VIGIL_BIND_ADDRESS".to_string(), "0.0.0.0:9100".to_string())];
        let overrides = ConfigOverrides {
            default_environment: Some("staging".to_string()),
            ..ConfigOverrides::default()
        };
        let config = load_config(Some(file.path()), vars, &overrides).unwrap();

        assert_eq!(config.server.bind_address, "0.0.0.0:9100");
        assert_eq!(config.default_environment, "staging");
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let overrides = ConfigOverrides {
            default_environment: Some("moon".to_string()),
            ..ConfigOverrides::default()
        };
        let err = load_config(None, Vec::new(), &overrides).unwrap_err();
        assert!(format!("{err:#}").contains("default_environment"));
    }

    #[test]
    fn missing_catalog_root_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServiceConfig::defaults();
        config.catalog.root = dir.path().join("absent");

        let err = build_service(config, local_capabilities(None)).unwrap_err();
        assert!(format!("{err:#}").contains("Catalog root not found"));
    }
}
