// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Tabletalk assistant.

use thiserror::Error;

/// The primary error type used across all Tabletalk adapter traits and core operations.
#[derive(Debug, Error)]
pub enum TabletalkError {
    /// Configuration errors (invalid TOML, missing required fields, malformed
    /// connection descriptor). Fatal -- fail fast.
    #[error("configuration error: {0}")]
    Config(String),

    /// Completion service errors (API failure, model not found, bad request).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The completion service rejected the request due to rate limiting.
    /// Retryable with backoff at the turn level.
    #[error("provider throttled: {message}")]
    Throttled { message: String },

    /// Warehouse data-API transport errors (connection failure, malformed response).
    #[error("warehouse error: {message}")]
    Warehouse {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The warehouse has no result for the statement yet. Callers poll
    /// `describe_statement` instead of surfacing this.
    #[error("resource not found: {message}")]
    ResourceNotFound { message: String },

    /// A statement reached FAILED or ABORTED. Drives the repair loop;
    /// not surfaced to the user directly.
    #[error("statement execution failed: {error}")]
    ExecutionFailed { sql: String, error: String },

    /// A statement exceeded the wall-clock polling budget.
    #[error("statement timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Session store errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TabletalkError {
    /// Returns true when the error is a throttling rejection worth retrying
    /// at the turn level.
    pub fn is_throttled(&self) -> bool {
        matches!(self, TabletalkError::Throttled { .. })
    }
}
