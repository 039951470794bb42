// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock completion and conversation adapters for deterministic testing.
//!
//! Responses are popped from a FIFO queue; prompts and message histories are
//! recorded so tests can assert on what was sent.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use tabletalk_core::{
    ChatMessage, CompletionProvider, ConversationModel, ModelTurn, TabletalkError, ToolCall,
    ToolSpec,
};

/// One scripted completion response.
pub enum ScriptedCompletion {
    Text(String),
    /// The provider rejects the request with a throttling error.
    Throttled,
}

/// A mock completion provider that returns pre-configured responses.
pub struct MockCompletion {
    queue: Mutex<VecDeque<ScriptedCompletion>>,
    prompts: Mutex<Vec<String>>,
}

impl MockCompletion {
    pub fn new(responses: Vec<ScriptedCompletion>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::from(responses)),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Convenience constructor for a queue of plain text responses.
    pub fn with_texts(texts: &[&str]) -> Self {
        Self::new(
            texts
                .iter()
                .map(|t| ScriptedCompletion::Text(t.to_string()))
                .collect(),
        )
    }

    /// All prompts received, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Number of completion calls received.
    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionProvider for MockCompletion {
    async fn complete(&self, prompt: &str, _model_id: &str) -> Result<String, TabletalkError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.queue.lock().unwrap().pop_front() {
            Some(ScriptedCompletion::Text(text)) => Ok(text),
            Some(ScriptedCompletion::Throttled) => Err(TabletalkError::Throttled {
                message: "ThrottlingException: Rate exceeded".to_string(),
            }),
            None => Err(TabletalkError::Internal(
                "no scripted completion left".to_string(),
            )),
        }
    }
}

/// One scripted conversation response.
pub enum ScriptedTurn {
    Reply(ModelTurn),
    /// The provider rejects the whole turn with a throttling error.
    Throttled,
}

impl ScriptedTurn {
    /// A plain text reply with no tool calls.
    pub fn text(text: &str) -> Self {
        ScriptedTurn::Reply(ModelTurn {
            text: text.to_string(),
            tool_calls: Vec::new(),
        })
    }

    /// A reply requesting a single tool call.
    pub fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> Self {
        ScriptedTurn::Reply(ModelTurn {
            text: String::new(),
            tool_calls: vec![ToolCall {
                id: id.to_string(),
                name: name.to_string(),
                arguments,
            }],
        })
    }
}

/// A mock conversation model that returns pre-configured turns.
pub struct MockConversation {
    queue: Mutex<VecDeque<ScriptedTurn>>,
    systems: Mutex<Vec<String>>,
    histories: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockConversation {
    pub fn new(turns: Vec<ScriptedTurn>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::from(turns)),
            systems: Mutex::new(Vec::new()),
            histories: Mutex::new(Vec::new()),
        }
    }

    /// System directives received, one per converse call.
    pub fn systems(&self) -> Vec<String> {
        self.systems.lock().unwrap().clone()
    }

    /// Message histories received, one snapshot per converse call.
    pub fn histories(&self) -> Vec<Vec<ChatMessage>> {
        self.histories.lock().unwrap().clone()
    }

    /// Number of converse calls received.
    pub fn calls(&self) -> usize {
        self.systems.lock().unwrap().len()
    }
}

#[async_trait]
impl ConversationModel for MockConversation {
    async fn converse(
        &self,
        _model_id: &str,
        system: &str,
        messages: &[ChatMessage],
        _tools: &[ToolSpec],
    ) -> Result<ModelTurn, TabletalkError> {
        self.systems.lock().unwrap().push(system.to_string());
        self.histories.lock().unwrap().push(messages.to_vec());
        match self.queue.lock().unwrap().pop_front() {
            Some(ScriptedTurn::Reply(turn)) => Ok(turn),
            Some(ScriptedTurn::Throttled) => Err(TabletalkError::Throttled {
                message: "ThrottlingException: Rate exceeded".to_string(),
            }),
            None => Err(TabletalkError::Internal(
                "no scripted turn left".to_string(),
            )),
        }
    }
}
