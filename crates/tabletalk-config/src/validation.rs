// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-empty paths and non-zero timing budgets.

use thiserror::Error;

use crate::model::TabletalkConfig;

/// A configuration error surfaced to the operator at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config deserialized but a value is semantically invalid.
    #[error("invalid configuration: {message}")]
    Validation { message: String },

    /// The config failed to parse or merge.
    #[error("failed to load configuration: {message}")]
    Load { message: String },
}

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &TabletalkConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.warehouse.endpoint.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "warehouse.endpoint must not be empty".to_string(),
        });
    }

    if config.bedrock.endpoint.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "bedrock.endpoint must not be empty".to_string(),
        });
    }

    if config.warehouse.cluster_identifier.is_some() && config.warehouse.workgroup_name.is_some()
    {
        errors.push(ConfigError::Validation {
            message:
                "warehouse.cluster_identifier and warehouse.workgroup_name are mutually exclusive"
                    .to_string(),
        });
    }

    if config.warehouse.poll_interval_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "warehouse.poll_interval_ms must be greater than zero".to_string(),
        });
    }

    if config.warehouse.statement_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "warehouse.statement_timeout_secs must be greater than zero".to_string(),
        });
    }

    if config.agent.max_turn_iterations == 0 {
        errors.push(ConfigError::Validation {
            message: "agent.max_turn_iterations must be greater than zero".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = TabletalkConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = TabletalkConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("database_path"))
        ));
    }

    #[test]
    fn both_connection_identifiers_fail_validation() {
        let mut config = TabletalkConfig::default();
        config.warehouse.cluster_identifier = Some("main-cluster".to_string());
        config.warehouse.workgroup_name = Some("main-workgroup".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("mutually exclusive"))
        ));
    }

    #[test]
    fn zero_poll_interval_fails_validation() {
        let mut config = TabletalkConfig::default();
        config.warehouse.poll_interval_ms = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("poll_interval_ms"))
        ));
    }

    #[test]
    fn single_connection_identifier_passes() {
        let mut config = TabletalkConfig::default();
        config.warehouse.workgroup_name = Some("main-workgroup".to_string());
        assert!(validate_config(&config).is_ok());
    }
}
