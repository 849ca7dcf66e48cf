//! Service configuration record

use super::traits::VigilConfig;
use super::validation::ConfigValidator;
use crate::VigilError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Hard upper bound on the worker pool of a single run
pub const MAX_WORKER_THREADS: u32 = 20;

/// Environments known when none are configured
pub const BUILTIN_ENVIRONMENTS: [&str; 4] = ["dev", "qa", "staging", "prod"];

/// Top-level configuration of the Vigil service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP listener settings
    pub server: ServerConfig,
    /// Where scenarios are discovered
    pub catalog: CatalogConfig,
    /// Scheduling defaults
    pub execution: ExecutionConfig,
    /// Environment used when a request names none or an unknown one
    pub default_environment: String,
    /// Known target environments
    pub environments: BTreeMap<String, EnvironmentProfile>,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `127.0.0.1:8080`
    pub bind_address: String,
    /// Path prefix for every route
    pub base_path: String,
}

/// Scenario discovery settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory scanned recursively for scenario files
    pub root: PathBuf,
    /// File extension of scenario files, without the dot
    pub extension: String,
}

/// Scheduling defaults for execution requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Worker count when a request does not specify one
    pub default_threads: u32,
    /// Upper clamp for requested worker counts
    pub max_threads: u32,
    /// Outer deadline applied when a request does not carry one
    pub default_timeout_ms: Option<u64>,
    /// Directory under which per-run report paths are allocated
    pub report_dir: PathBuf,
}

/// Per-environment settings handed to scenarios
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentProfile {
    /// Prefix applied to collaborator resource names (`<prefix>-<name>`)
    pub resource_prefix: String,
    /// Free-form variables exposed to scenarios
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

impl EnvironmentProfile {
    /// Profile whose prefix is the environment name itself
    pub fn named(name: &str) -> Self {
        Self {
            resource_prefix: name.to_string(),
            variables: BTreeMap::new(),
        }
    }

    /// Qualify a collaborator resource name with this environment's prefix
    pub fn qualify(&self, name: &str) -> String {
        if self.resource_prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}-{name}", self.resource_prefix)
        }
    }
}

/// Outcome of resolving a requested environment name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEnvironment {
    /// Name of the environment actually used
    pub name: String,
    /// Its profile
    pub profile: EnvironmentProfile,
    /// Set when the requested name was unknown and the default was used
    pub fell_back_from: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            catalog: CatalogConfig::default(),
            execution: ExecutionConfig::default(),
            default_environment: "dev".to_string(),
            environments: BUILTIN_ENVIRONMENTS
                .iter()
                .map(|name| (name.to_string(), EnvironmentProfile::named(name)))
                .collect(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            base_path: "/api".to_string(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("features"),
            extension: "toml".to_string(),
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            default_threads: 5,
            max_threads: MAX_WORKER_THREADS,
            default_timeout_ms: None,
            report_dir: PathBuf::from("target/vigil-reports"),
        }
    }
}

impl ServiceConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, VigilError> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve a requested environment name against the configured set.
    ///
    /// A missing or blank name selects the default environment. An unknown
    /// name also selects the default and records the fallback.
    pub fn resolve_environment(&self, requested: Option<&str>) -> Result<ResolvedEnvironment, VigilError> {
        let requested = requested.map(str::trim).filter(|name| !name.is_empty());

        if let Some(name) = requested {
            if let Some(profile) = self.environments.get(name) {
                return Ok(ResolvedEnvironment {
                    name: name.to_string(),
                    profile: profile.clone(),
                    fell_back_from: None,
                });
            }
            tracing::warn!(
                requested = name,
                default = %self.default_environment,
                "unknown environment, falling back to default"
            );
        }

        let profile = self
            .environments
            .get(&self.default_environment)
            .cloned()
            .ok_or_else(|| {
                VigilError::invalid(format!(
                    "default environment '{}' is not configured",
                    self.default_environment
                ))
            })?;

        Ok(ResolvedEnvironment {
            name: self.default_environment.clone(),
            profile,
            fell_back_from: requested.map(str::to_string),
        })
    }
}

impl VigilConfig for ServiceConfig {
    fn load_from_file(path: &Path) -> Result<Self, VigilError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            VigilError::internal(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    fn merge_with_vars<I>(&mut self, vars: I) -> Result<(), VigilError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            let key = match name.as_str() {
                "VIGIL_BIND_ADDRESS" => "server.bind_address",
                "VIGIL_BASE_PATH" => "server.base_path",
                "VIGIL_CATALOG_ROOT" => "catalog.root",
                "VIGIL_DEFAULT_ENVIRONMENT" => "default_environment",
                "VIGIL_REPORT_DIR" => "execution.report_dir",
                "VIGIL_DEFAULT_THREADS" => "execution.default_threads",
                "VIGIL_DEFAULT_TIMEOUT_MS" => "execution.default_timeout_ms",
                _ => continue,
            };
            self.set_from_string(key, &value)
                .map_err(|e| VigilError::invalid(format!("{name}: {e}")))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), VigilError> {
        let mut validator = ConfigValidator::new();

        let mut server = validator.for_field("server");
        server
            .non_empty("bind_address", &self.server.bind_address)
            .check(
                "bind_address",
                self.server.bind_address.parse::<SocketAddr>().is_ok(),
                "must be a socket address such as 127.0.0.1:8080",
            )
            .check(
                "base_path",
                self.server.base_path.is_empty() || self.server.base_path.starts_with('/'),
                "must start with '/'",
            );
        validator.absorb(server);

        let mut catalog = validator.for_field("catalog");
        catalog
            .non_empty("root", &self.catalog.root.to_string_lossy())
            .non_empty("extension", &self.catalog.extension)
            .check(
                "extension",
                !self.catalog.extension.starts_with('.'),
                "must not start with '.'",
            );
        validator.absorb(catalog);

        let mut execution = validator.for_field("execution");
        execution
            .range(
                "max_threads",
                self.execution.max_threads,
                Some(1),
                Some(MAX_WORKER_THREADS),
            )
            .range(
                "default_threads",
                self.execution.default_threads,
                Some(1),
                Some(self.execution.max_threads.max(1)),
            )
            .check(
                "default_timeout_ms",
                self.execution.default_timeout_ms != Some(0),
                "must be positive when set",
            )
            .non_empty("report_dir", &self.execution.report_dir.to_string_lossy());
        validator.absorb(execution);

        validator.non_empty("default_environment", &self.default_environment);
        validator.check(
            "default_environment",
            self.environments.contains_key(&self.default_environment),
            format!("'{}' is not a configured environment", self.default_environment),
        );

        validator.finish()
    }

    fn set_from_string(&mut self, key: &str, value: &str) -> Result<(), VigilError> {
        match key {
            "server.bind_address" => self.server.bind_address = value.to_string(),
            "server.base_path" => self.server.base_path = value.to_string(),
            "catalog.root" => self.catalog.root = PathBuf::from(value),
            "catalog.extension" => self.catalog.extension = value.to_string(),
            "execution.default_threads" => self.execution.default_threads = parse_number(key, value)?,
            "execution.max_threads" => self.execution.max_threads = parse_number(key, value)?,
            "execution.default_timeout_ms" => {
                self.execution.default_timeout_ms = if value.trim().is_empty() {
                    None
                } else {
                    Some(parse_number(key, value)?)
                };
            }
            "execution.report_dir" => self.execution.report_dir = PathBuf::from(value),
            "default_environment" => self.default_environment = value.to_string(),
            _ => return Err(VigilError::invalid(format!("unknown configuration key '{key}'"))),
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, VigilError> {
    value
        .trim()
        .parse()
        .map_err(|_| VigilError::invalid(format!("{key} expects a non-negative integer, got '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = ServiceConfig::defaults();
        assert!(config.validate().is_ok());
        assert_eq!(config.execution.default_threads, 5);
        assert_eq!(config.environments.len(), 4);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
default_environment = "qa"

[execution]
default_threads = 8

[environments.qa]
resource_prefix = "qa-east"
variables = {{ region = "us-east-1" }}
"#
        )
        .unwrap();

        let config = ServiceConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.execution.default_threads, 8);
        assert_eq!(config.execution.max_threads, MAX_WORKER_THREADS);
        assert_eq!(config.server.base_path, "/api");
        assert_eq!(config.environments.len(), 1);
        assert_eq!(config.environments["qa"].qualify("orders"), "qa-east-orders");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ServiceConfig::load_from_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(VigilError::Internal { .. })));
    }

    #[test]
    fn env_vars_override_file_values() {
        let mut config = ServiceConfig::default();
        config
            .merge_with_vars(vec![
                ("VIGIL_DEFAULT_THREADS".to_string(), "3".to_string()),
                ("VIGIL_CATALOG_ROOT".to_string(), "/srv/scenarios".to_string()),
                ("VIGIL_DEFAULT_TIMEOUT_MS".to_string(), "1500".to_string()),
                ("UNRELATED".to_string(), "ignored".to_string()),
            ])
            .unwrap();

        assert_eq!(config.execution.default_threads, 3);
        assert_eq!(config.catalog.root, PathBuf::from("/srv/scenarios"));
        assert_eq!(config.execution.default_timeout_ms, Some(1500));
    }

    #[test]
    fn bad_env_value_names_the_variable() {
        let mut config = ServiceConfig::default();
        let err = config
            .merge_with_vars(vec![("VIGIL_DEFAULT_THREADS".to_string(), "many".to_string())])
            .unwrap_err();
        assert!(err.to_string().contains("VIGIL_DEFAULT_THREADS"));
    }

    #[test]
    fn validation_reports_every_problem() {
        let mut config = ServiceConfig::default();
        config.server.bind_address = "not-an-address".to_string();
        config.execution.default_threads = 0;
        config.default_environment = "perf".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("server.bind_address"));
        assert!(err.contains("execution.default_threads"));
        assert!(err.contains("default_environment"));
    }

    #[test]
    fn unknown_environment_falls_back_to_default() {
        let config = ServiceConfig::default();

        let known = config.resolve_environment(Some("staging")).unwrap();
        assert_eq!(known.name, "staging");
        assert_eq!(known.fell_back_from, None);

        let unknown = config.resolve_environment(Some("perf")).unwrap();
        assert_eq!(unknown.name, "dev");
        assert_eq!(unknown.fell_back_from.as_deref(), Some("perf"));

        let absent = config.resolve_environment(None).unwrap();
        assert_eq!(absent.name, "dev");
        assert_eq!(absent.fell_back_from, None);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let mut config = ServiceConfig::default();
        assert!(config.set_from_string("server.port", "80").is_err());
    }
}
