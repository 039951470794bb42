// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Tabletalk natural-language-to-SQL assistant.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Tabletalk workspace. The completion
//! service and warehouse adapters implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::TabletalkError;
pub use types::{
    ChatBlock, ChatMessage, ConnectionTarget, ContextCheckpoint, ModelTurn, ResultSet,
    RunOutcome, StatementHandle, StatementStatus, StoredMessage, ToolCall, ToolSpec,
};

// Re-export adapter traits at crate root.
pub use traits::{CompletionProvider, ConversationModel, WarehouseApi};
