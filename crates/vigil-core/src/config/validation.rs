//! Configuration validation utilities and rules

use crate::VigilError;
use std::fmt;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Value is required but missing or empty
    Required {
        /// Dotted field path
        field: String,
    },
    /// Value is out of acceptable range
    OutOfRange {
        /// Dotted field path
        field: String,
        /// Inclusive lower bound, if any
        min: Option<f64>,
        /// Inclusive upper bound, if any
        max: Option<f64>,
        /// Rejected value
        actual: f64,
    },
    /// Custom validation failed
    Custom {
        /// Dotted field path
        field: String,
        /// What is wrong with the value
        message: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Required { field } => {
                write!(f, "Field '{field}' is required but missing")
            }
            ValidationError::OutOfRange {
                field,
                min,
                max,
                actual,
            } => {
                let range_desc = match (min, max) {
                    (Some(min), Some(max)) => format!("between {min} and {max}"),
                    (Some(min), None) => format!("at least {min}"),
                    (None, Some(max)) => format!("at most {max}"),
                    (None, None) => "in valid range".to_string(),
                };
                write!(f, "Field '{field}' must be {range_desc} (got {actual})")
            }
            ValidationError::Custom { field, message } => {
                write!(f, "Field '{field}': {message}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for VigilError {
    fn from(err: ValidationError) -> Self {
        VigilError::invalid(err.to_string())
    }
}

/// Configuration validator that accumulates validation failures
#[derive(Debug, Default)]
pub struct ConfigValidator {
    errors: Vec<ValidationError>,
    field_prefix: String,
}

impl ConfigValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validator for a nested section; merge it back with [`Self::absorb`]
    pub fn for_field(&self, field_name: &str) -> Self {
        Self {
            errors: Vec::new(),
            field_prefix: self.full_field_name(field_name),
        }
    }

    /// Validate that a string is non-empty after trimming
    pub fn non_empty(&mut self, field_name: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.errors.push(ValidationError::Required {
                field: self.full_field_name(field_name),
            });
        }
        self
    }

    /// Validate that a number is within range
    pub fn range<T>(&mut self, field_name: &str, value: T, min: Option<T>, max: Option<T>) -> &mut Self
    where
        T: PartialOrd + Copy + Into<f64>,
    {
        let below = min.map(|min| value < min).unwrap_or(false);
        let above = max.map(|max| value > max).unwrap_or(false);

        if below || above {
            self.errors.push(ValidationError::OutOfRange {
                field: self.full_field_name(field_name),
                min: min.map(Into::into),
                max: max.map(Into::into),
                actual: value.into(),
            });
        }
        self
    }

    /// Record a custom failure when `condition` does not hold
    pub fn check(&mut self, field_name: &str, condition: bool, message: impl Into<String>) -> &mut Self {
        if !condition {
            self.errors.push(ValidationError::Custom {
                field: self.full_field_name(field_name),
                message: message.into(),
            });
        }
        self
    }

    /// Take over the failures collected by a nested validator
    pub fn absorb(&mut self, nested: ConfigValidator) -> &mut Self {
        self.errors.extend(nested.errors);
        self
    }

    /// Collected failures so far
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Finish validation, joining every failure into one error
    pub fn finish(self) -> Result<(), VigilError> {
        if self.errors.is_empty() {
            return Ok(());
        }
        let joined = self
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(VigilError::invalid(joined))
    }

    fn full_field_name(&self, field_name: &str) -> String {
        if self.field_prefix.is_empty() {
            field_name.to_string()
        } else {
            format!("{}.{}", self.field_prefix, field_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_nested_failures() {
        let mut validator = ConfigValidator::new();
        let mut execution = validator.for_field("execution");
        execution.range("default_threads", 0u32, Some(1), Some(20));
        execution.non_empty("report_dir", "  ");
        validator.absorb(execution);

        assert_eq!(validator.errors().len(), 2);
        let err = validator.finish().unwrap_err().to_string();
        assert!(err.contains("execution.default_threads"));
        assert!(err.contains("execution.report_dir"));
    }

    #[test]
    fn passes_when_clean() {
        let mut validator = ConfigValidator::new();
        validator.range("threads", 5u32, Some(1), Some(20));
        validator.check("environment", true, "unused");
        assert!(validator.finish().is_ok());
    }
}
