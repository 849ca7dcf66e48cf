//! Core configuration trait

use crate::VigilError;
use std::path::Path;

/// Common behaviour of Vigil configuration records
pub trait VigilConfig: Clone + Default + Send + Sync + 'static {
    /// Get default configuration values
    fn defaults() -> Self {
        Self::default()
    }

    /// Load configuration from a file, filling unspecified fields with defaults
    fn load_from_file(path: &Path) -> Result<Self, VigilError>;

    /// Merge values from `VIGIL_*` process environment variables
    fn merge_with_env(&mut self) -> Result<(), VigilError> {
        self.merge_with_vars(std::env::vars())
    }

    /// Merge values from an explicit set of `(name, value)` variables
    fn merge_with_vars<I>(&mut self, vars: I) -> Result<(), VigilError>
    where
        I: IntoIterator<Item = (String, String)>;

    /// Validate the configuration
    fn validate(&self) -> Result<(), VigilError>;

    /// Set a configuration value from a dotted key (for CLI parsing)
    fn set_from_string(&mut self, key: &str, value: &str) -> Result<(), VigilError>;
}
