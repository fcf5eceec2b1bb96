//! Error types for ntnsim

use thiserror::Error;

/// Error types for the ntnsim library.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors while reading inputs.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while loading or validating configuration.
///
/// `MissingConfiguration` is fatal: evaluation must not start when any
/// mandatory key is absent.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// One or more mandatory keys are absent (dotted key paths)
    #[error("Missing configuration: {}", .0.join(", "))]
    MissingConfiguration(Vec<String>),

    /// A value is present but non-physical
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Returns true for the fatal missing-key case.
    pub fn is_missing(&self) -> bool {
        matches!(self, ConfigError::MissingConfiguration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_configuration_lists_keys() {
        let err = ConfigError::MissingConfiguration(vec![
            "link.frequency_hz".to_string(),
            "events.a4.threshold_dbm".to_string(),
        ]);
        assert!(err.is_missing());
        assert_eq!(
            err.to_string(),
            "Missing configuration: link.frequency_hz, events.a4.threshold_dbm"
        );
    }

    #[test]
    fn test_config_error_wraps_into_error() {
        let err: Error = ConfigError::Invalid("bandwidth_hz must be positive".into()).into();
        assert!(matches!(err, Error::Config(ConfigError::Invalid(_))));
    }
}
