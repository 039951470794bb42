// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./tabletalk.toml` > `~/.config/tabletalk/tabletalk.toml`
//! > `/etc/tabletalk/tabletalk.toml` with environment variable overrides via
//! the `TABLETALK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::TabletalkConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/tabletalk/tabletalk.toml` (system-wide)
/// 3. `~/.config/tabletalk/tabletalk.toml` (user XDG config)
/// 4. `./tabletalk.toml` (local directory)
/// 5. `TABLETALK_*` environment variables
pub fn load_config() -> Result<TabletalkConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TabletalkConfig::default()))
        .merge(Toml::file("/etc/tabletalk/tabletalk.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("tabletalk/tabletalk.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("tabletalk.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<TabletalkConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TabletalkConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TabletalkConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TabletalkConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example,
/// `TABLETALK_WAREHOUSE_WORKGROUP_NAME` must map to
/// `warehouse.workgroup_name`, not `warehouse.workgroup.name`.
fn env_provider() -> Env {
    Env::prefixed("TABLETALK_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: TABLETALK_WAREHOUSE_WORKGROUP_NAME -> "warehouse_workgroup_name"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("bedrock_", "bedrock.", 1)
            .replacen("warehouse_", "warehouse.", 1)
            .replacen("runner_", "runner.", 1)
            .replacen("retry_", "retry.", 1)
            .replacen("storage_", "storage.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_any_file() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.agent.name, "tabletalk");
        assert_eq!(config.runner.max_repair_attempts, 5);
        assert_eq!(config.retry.max_throttle_retries, 3);
        assert_eq!(config.warehouse.statement_timeout_secs, 300);
        assert_eq!(config.warehouse.poll_interval_ms, 1000);
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = load_config_from_str(
            r#"
[warehouse]
workgroup_name = "animal-food-data"
database = "analytics"

[runner]
max_repair_attempts = 2
"#,
        )
        .unwrap();
        assert_eq!(
            config.warehouse.workgroup_name.as_deref(),
            Some("animal-food-data")
        );
        assert_eq!(config.warehouse.database, "analytics");
        assert_eq!(config.runner.max_repair_attempts, 2);
        // Untouched sections keep defaults.
        assert_eq!(config.bedrock.sql_model, "amazon.nova-pro-v1:0");
    }

    #[test]
    fn unknown_key_is_rejected() {
        let result = load_config_from_str(
            r#"
[warehouse]
wrokgroup_name = "typo"
"#,
        );
        assert!(result.is_err());
    }
}
