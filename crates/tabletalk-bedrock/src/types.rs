// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request/response envelope types for the model runtime API.
//!
//! Both the single-shot invoke endpoint and the tool-aware converse endpoint
//! share the same message envelope: messages carry a list of content blocks,
//! and the response nests the assistant message under `output.message`.

use serde::{Deserialize, Serialize};
use tabletalk_core::{ChatBlock, ChatMessage, ToolSpec};

/// A message in the runtime wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    pub role: String,
    pub content: Vec<ApiContentBlock>,
}

/// One content block. Externally tagged: serializes as `{"text": ...}`,
/// `{"toolUse": {...}}` or `{"toolResult": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ApiContentBlock {
    #[serde(rename = "text")]
    Text(String),
    #[serde(rename = "toolUse")]
    ToolUse(ApiToolUse),
    #[serde(rename = "toolResult")]
    ToolResult(ApiToolResult),
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiToolUse {
    pub tool_use_id: String,
    pub name: String,
    pub input: serde_json::Value,
}

/// A tool result echoed back to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiToolResult {
    pub tool_use_id: String,
    pub content: Vec<ApiToolResultContent>,
}

/// Content of a tool result. Only text results are produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ApiToolResultContent {
    #[serde(rename = "text")]
    Text(String),
}

/// Generation limits sent with every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceConfig {
    pub max_tokens: u32,
}

/// Request body for the single-shot invoke endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeRequest {
    pub messages: Vec<ApiMessage>,
    pub inference_config: InferenceConfig,
}

/// A system directive block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemBlock {
    pub text: String,
}

/// Request body for the tool-aware converse endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<Vec<SystemBlock>>,
    pub messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,
    pub inference_config: InferenceConfig,
}

/// Advertised tools for the converse endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ToolConfig {
    pub tools: Vec<ToolEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolEntry {
    pub tool_spec: ApiToolSpec,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: InputSchema,
}

/// Tool input schemas are wrapped in a `json` key on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct InputSchema {
    pub json: serde_json::Value,
}

/// Response body shared by invoke and converse.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseResponse {
    pub output: ConverseOutput,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConverseOutput {
    pub message: ApiMessage,
}

/// Error body returned by the runtime on failure.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(rename = "__type", default)]
    pub type_: String,
    #[serde(default, alias = "Message")]
    pub message: String,
}

impl From<&ChatMessage> for ApiMessage {
    fn from(msg: &ChatMessage) -> Self {
        let content = msg
            .content
            .iter()
            .map(|block| match block {
                ChatBlock::Text { text } => ApiContentBlock::Text(text.clone()),
                ChatBlock::ToolUse { id, name, input } => ApiContentBlock::ToolUse(ApiToolUse {
                    tool_use_id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                }),
                ChatBlock::ToolResult {
                    tool_use_id,
                    content,
                } => ApiContentBlock::ToolResult(ApiToolResult {
                    tool_use_id: tool_use_id.clone(),
                    content: vec![ApiToolResultContent::Text(content.clone())],
                }),
            })
            .collect();
        ApiMessage {
            role: msg.role.clone(),
            content,
        }
    }
}

impl ToolConfig {
    /// Builds the wire tool config from advertised tool specs.
    pub fn from_specs(specs: &[ToolSpec]) -> Self {
        ToolConfig {
            tools: specs
                .iter()
                .map(|spec| ToolEntry {
                    tool_spec: ApiToolSpec {
                        name: spec.name.clone(),
                        description: spec.description.clone(),
                        input_schema: InputSchema {
                            json: spec.input_schema.clone(),
                        },
                    },
                })
                .collect(),
        }
    }
}
