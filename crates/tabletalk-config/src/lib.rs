// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Tabletalk assistant.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, and environment
//! variable overrides.
//!
//! # Usage
//!
//! ```no_run
//! use tabletalk_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Agent name: {}", config.agent.name);
//! ```

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::TabletalkConfig;
pub use validation::ConfigError;

/// Load configuration from the XDG hierarchy and validate it.
///
/// This is the high-level entry point that:
/// 1. Loads config from TOML files + env vars via Figment
/// 2. On success: runs post-deserialization validation
/// 3. On Figment error: converts to a [`ConfigError::Load`]
///
/// Returns either a valid `TabletalkConfig` or a list of errors.
pub fn load_and_validate() -> Result<TabletalkConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(vec![ConfigError::Load {
            message: err.to_string(),
        }]),
    }
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<TabletalkConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(vec![ConfigError::Load {
            message: err.to_string(),
        }]),
    }
}

/// Render configuration errors to stderr, one per line.
pub fn render_errors(errors: &[ConfigError]) {
    for err in errors {
        eprintln!("tabletalk: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_and_validate_str_accepts_defaults() {
        let config = load_and_validate_str("").unwrap();
        assert_eq!(config.agent.name, "tabletalk");
    }

    #[test]
    fn load_and_validate_str_reports_semantic_errors() {
        let errors = load_and_validate_str(
            r#"
[warehouse]
cluster_identifier = "c"
workgroup_name = "w"
"#,
        )
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("mutually exclusive"));
    }

    #[test]
    fn load_and_validate_str_reports_parse_errors() {
        let errors = load_and_validate_str("not valid toml [[[").unwrap_err();
        assert!(matches!(errors[0], ConfigError::Load { .. }));
    }
}
