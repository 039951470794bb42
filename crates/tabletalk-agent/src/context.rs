// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-session context cache with explicit merge semantics.
//!
//! The cache holds the schema description and sample-row text for the active
//! session. Empty string means "not yet loaded". Only an explicit fetch tool
//! result overwrites a field; SQL generation and execution never touch it,
//! so stale-but-valid context survives across turns.

use tabletalk_core::ContextCheckpoint;

/// Field updates produced by one round of tool execution.
///
/// `None` means "leave the cached value untouched". This is the reducer that
/// makes the preserve-unless-updated rule testable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextUpdate {
    pub schema_text: Option<String>,
    pub sample_text: Option<String>,
}

impl ContextUpdate {
    pub fn is_empty(&self) -> bool {
        self.schema_text.is_none() && self.sample_text.is_none()
    }

    /// Folds another update into this one; later fields win.
    pub fn merge(&mut self, other: ContextUpdate) {
        if other.schema_text.is_some() {
            self.schema_text = other.schema_text;
        }
        if other.sample_text.is_some() {
            self.sample_text = other.sample_text;
        }
    }
}

/// The session's schema/sample cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextCache {
    checkpoint: ContextCheckpoint,
}

impl ContextCache {
    pub fn new(checkpoint: ContextCheckpoint) -> Self {
        Self { checkpoint }
    }

    /// Current cache contents. Idempotent: no read mutates the cache.
    pub fn get(&self) -> &ContextCheckpoint {
        &self.checkpoint
    }

    pub fn set_schema(&mut self, text: String) {
        self.checkpoint.schema_text = text;
    }

    pub fn set_sample(&mut self, text: String) {
        self.checkpoint.sample_text = text;
    }

    /// Applies one round of tool updates. Fields without an update are
    /// carried through untouched.
    pub fn apply(&mut self, update: ContextUpdate) {
        if let Some(schema) = update.schema_text {
            self.checkpoint.schema_text = schema;
        }
        if let Some(sample) = update.sample_text {
            self.checkpoint.sample_text = sample;
        }
    }

    pub fn into_checkpoint(self) -> ContextCheckpoint {
        self.checkpoint
    }
}
