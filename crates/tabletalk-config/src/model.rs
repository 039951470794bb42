// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Tabletalk assistant.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Tabletalk configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TabletalkConfig {
    /// Agent identity and control-loop settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Completion service (model runtime) settings.
    #[serde(default)]
    pub bedrock: BedrockConfig,

    /// Warehouse data-API settings.
    #[serde(default)]
    pub warehouse: WarehouseConfig,

    /// Self-correcting query runner settings.
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Turn-level throttle retry settings.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Session store settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Agent identity and control-loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the assistant.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Model used for the tool-use conversation loop.
    #[serde(default = "default_conversation_model")]
    pub conversation_model: String,

    /// Upper bound on tool-dispatch iterations within one turn.
    #[serde(default = "default_max_turn_iterations")]
    pub max_turn_iterations: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            conversation_model: default_conversation_model(),
            max_turn_iterations: default_max_turn_iterations(),
        }
    }
}

fn default_agent_name() -> String {
    "tabletalk".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_conversation_model() -> String {
    "anthropic.claude-3-7-sonnet-20250219-v1:0".to_string()
}

fn default_max_turn_iterations() -> usize {
    10
}

/// Completion service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BedrockConfig {
    /// Base URL of the model runtime endpoint.
    #[serde(default = "default_bedrock_endpoint")]
    pub endpoint: String,

    /// API key. `None` requires the `TABLETALK_BEDROCK_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model used for SQL generation and repair completions.
    #[serde(default = "default_sql_model")]
    pub sql_model: String,

    /// Maximum tokens to generate per response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for BedrockConfig {
    fn default() -> Self {
        Self {
            endpoint: default_bedrock_endpoint(),
            api_key: None,
            sql_model: default_sql_model(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_bedrock_endpoint() -> String {
    "https://bedrock-runtime.us-east-1.amazonaws.com".to_string()
}

fn default_sql_model() -> String {
    "amazon.nova-pro-v1:0".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

/// Warehouse data-API configuration.
///
/// Exactly one of `cluster_identifier` and `workgroup_name` should be set;
/// the executor fails fast with a configuration error otherwise.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WarehouseConfig {
    /// Base URL of the warehouse data-API endpoint.
    #[serde(default = "default_warehouse_endpoint")]
    pub endpoint: String,

    /// API key. `None` requires the `TABLETALK_WAREHOUSE_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Provisioned cluster identifier (batch-capable path).
    #[serde(default)]
    pub cluster_identifier: Option<String>,

    /// Serverless workgroup name (sequential path).
    #[serde(default)]
    pub workgroup_name: Option<String>,

    /// Database to run statements against.
    #[serde(default = "default_database")]
    pub database: String,

    /// Interval between describe polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Wall-clock budget for a statement to reach a terminal status, in seconds.
    #[serde(default = "default_statement_timeout_secs")]
    pub statement_timeout_secs: u64,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            endpoint: default_warehouse_endpoint(),
            api_key: None,
            cluster_identifier: None,
            workgroup_name: None,
            database: default_database(),
            poll_interval_ms: default_poll_interval_ms(),
            statement_timeout_secs: default_statement_timeout_secs(),
        }
    }
}

fn default_warehouse_endpoint() -> String {
    "https://redshift-data.us-east-1.amazonaws.com".to_string()
}

fn default_database() -> String {
    "dev".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_statement_timeout_secs() -> u64 {
    300
}

/// Self-correcting query runner configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    /// Maximum LLM repair attempts for a failing statement.
    #[serde(default = "default_max_repair_attempts")]
    pub max_repair_attempts: u32,

    /// Retries when fetching a result that has not materialized yet.
    #[serde(default = "default_result_fetch_retries")]
    pub result_fetch_retries: u32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_repair_attempts: default_max_repair_attempts(),
            result_fetch_retries: default_result_fetch_retries(),
        }
    }
}

fn default_max_repair_attempts() -> u32 {
    5
}

fn default_result_fetch_retries() -> u32 {
    5
}

/// Turn-level throttle retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Maximum retries when the completion service throttles a turn.
    #[serde(default = "default_max_throttle_retries")]
    pub max_throttle_retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_throttle_retries: default_max_throttle_retries(),
        }
    }
}

fn default_max_throttle_retries() -> u32 {
    3
}

/// Session store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("tabletalk").join("tabletalk.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("tabletalk.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}
