// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion service adapter traits.

use async_trait::async_trait;

use crate::error::TabletalkError;
use crate::types::{ChatMessage, ModelTurn, ToolSpec};

/// Single-shot text completion against a named model.
///
/// Used for SQL generation and SQL repair. No retry/backoff logic belongs
/// here -- callers own the retry policy for provider throttling. Malformed
/// response envelopes must not raise: implementations degrade to a
/// diagnostic string embedding the raw response.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Sends a prompt to the given model and returns the generated text.
    async fn complete(&self, prompt: &str, model_id: &str) -> Result<String, TabletalkError>;
}

/// Multi-turn, tool-aware conversation against a named model.
///
/// Drives the agent control loop: the model sees the system directive, the
/// full message history, and the advertised tool specs, and responds with
/// text and zero or more requested tool calls.
#[async_trait]
pub trait ConversationModel: Send + Sync {
    async fn converse(
        &self,
        model_id: &str,
        system: &str,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ModelTurn, TabletalkError>;
}
