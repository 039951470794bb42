// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model runtime adapter for Tabletalk.
//!
//! Implements [`CompletionProvider`] for single-shot SQL generation and
//! repair completions, and [`ConversationModel`] for the tool-aware agent
//! control loop.

pub mod client;
pub mod types;

use async_trait::async_trait;
use tabletalk_config::model::BedrockConfig;
use tabletalk_core::{
    ChatMessage, CompletionProvider, ConversationModel, ModelTurn, TabletalkError, ToolCall,
    ToolSpec,
};

pub use client::BedrockClient;

use types::{
    ApiContentBlock, ApiMessage, ConverseRequest, InferenceConfig, InvokeRequest, SystemBlock,
    ToolConfig,
};

/// Completion service adapter backed by the model runtime HTTP API.
#[derive(Debug, Clone)]
pub struct BedrockProvider {
    client: BedrockClient,
    max_tokens: u32,
}

impl BedrockProvider {
    pub fn new(client: BedrockClient, max_tokens: u32) -> Self {
        Self { client, max_tokens }
    }

    /// Builds a provider from configuration. The API key must be present in
    /// config or via the `TABLETALK_BEDROCK_API_KEY` environment override.
    pub fn from_config(config: &BedrockConfig) -> Result<Self, TabletalkError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| TabletalkError::Config("bedrock.api_key is not set".to_string()))?;
        let client = BedrockClient::new(config.endpoint.clone(), api_key)?;
        Ok(Self::new(client, config.max_tokens))
    }
}

#[async_trait]
impl CompletionProvider for BedrockProvider {
    /// Sends a prompt and extracts the generated text from the response
    /// envelope. A malformed envelope does not raise: the returned string
    /// embeds the raw response so downstream extraction fails visibly
    /// instead of aborting the run.
    async fn complete(&self, prompt: &str, model_id: &str) -> Result<String, TabletalkError> {
        let request = InvokeRequest {
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: vec![ApiContentBlock::Text(prompt.to_string())],
            }],
            inference_config: InferenceConfig {
                max_tokens: self.max_tokens,
            },
        };
        let raw = self.client.invoke(model_id, &request).await?;
        Ok(extract_output_text(&raw)
            .unwrap_or_else(|| format!("Unexpected response format: {raw}")))
    }
}

#[async_trait]
impl ConversationModel for BedrockProvider {
    async fn converse(
        &self,
        model_id: &str,
        system: &str,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ModelTurn, TabletalkError> {
        let request = ConverseRequest {
            system: (!system.is_empty()).then(|| {
                vec![SystemBlock {
                    text: system.to_string(),
                }]
            }),
            messages: messages.iter().map(ApiMessage::from).collect(),
            tool_config: (!tools.is_empty()).then(|| ToolConfig::from_specs(tools)),
            inference_config: InferenceConfig {
                max_tokens: self.max_tokens,
            },
        };

        let response = self.client.converse(model_id, &request).await?;

        let mut text = String::new();
        let mut tool_calls = Vec::new();
        for block in response.output.message.content {
            match block {
                ApiContentBlock::Text(t) => text.push_str(&t),
                ApiContentBlock::ToolUse(tu) => tool_calls.push(ToolCall {
                    id: tu.tool_use_id,
                    name: tu.name,
                    arguments: tu.input,
                }),
                ApiContentBlock::ToolResult(_) => {
                    // The model never emits tool results; ignore if it does.
                }
            }
        }
        Ok(ModelTurn { text, tool_calls })
    }
}

/// Extracts `output.message.content[0].text` from a raw response body.
fn extract_output_text(raw: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    value
        .get("output")?
        .get("message")?
        .get("content")?
        .get(0)?
        .get("text")?
        .as_str()
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn test_provider(server: &MockServer) -> BedrockProvider {
        let client = BedrockClient::new(server.uri(), "test-key".into()).unwrap();
        BedrockProvider::new(client, 4096)
    }

    #[tokio::test]
    async fn complete_extracts_envelope_text() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "output": {"message": {
                "role": "assistant",
                "content": [{"text": "<sql>SELECT count(*) FROM orders</sql>"}]
            }}
        });
        Mock::given(method("POST"))
            .and(path("/model/amazon.nova-pro-v1:0/invoke"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let provider = test_provider(&server).await;
        let text = provider
            .complete("count the orders", "amazon.nova-pro-v1:0")
            .await
            .unwrap();
        assert_eq!(text, "<sql>SELECT count(*) FROM orders</sql>");
    }

    #[tokio::test]
    async fn complete_degrades_on_unexpected_envelope() {
        let server = MockServer::start().await;
        let body = serde_json::json!({"completion": "wrong shape"});
        Mock::given(method("POST"))
            .and(path("/model/amazon.nova-pro-v1:0/invoke"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let provider = test_provider(&server).await;
        let text = provider
            .complete("count the orders", "amazon.nova-pro-v1:0")
            .await
            .unwrap();
        assert!(text.starts_with("Unexpected response format:"), "got: {text}");
        assert!(text.contains("wrong shape"));
    }

    #[tokio::test]
    async fn converse_returns_text_and_tool_calls() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "output": {"message": {
                "role": "assistant",
                "content": [
                    {"text": "Fetching the schema first."},
                    {"toolUse": {
                        "toolUseId": "tu_9",
                        "name": "get_database_schema",
                        "input": {}
                    }}
                ]
            }},
            "stopReason": "tool_use"
        });
        Mock::given(method("POST"))
            .and(path("/model/sonnet/converse"))
            .and(body_partial_json(serde_json::json!({
                "system": [{"text": "You are a warehouse assistant."}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let provider = test_provider(&server).await;
        let turn = provider
            .converse(
                "sonnet",
                "You are a warehouse assistant.",
                &[ChatMessage::text("user", "show me sales")],
                &[ToolSpec {
                    name: "get_database_schema".into(),
                    description: "Fetch table structure".into(),
                    input_schema: serde_json::json!({"type": "object", "properties": {}}),
                }],
            )
            .await
            .unwrap();

        assert_eq!(turn.text, "Fetching the schema first.");
        assert_eq!(turn.tool_calls.len(), 1);
        assert_eq!(turn.tool_calls[0].name, "get_database_schema");
        assert_eq!(turn.tool_calls[0].id, "tu_9");
    }

    #[tokio::test]
    async fn converse_propagates_throttling() {
        let server = MockServer::start().await;
        let error_body = serde_json::json!({
            "__type": "ThrottlingException",
            "message": "Too many tokens"
        });
        Mock::given(method("POST"))
            .and(path("/model/sonnet/converse"))
            .respond_with(ResponseTemplate::new(400).set_body_json(&error_body))
            .mount(&server)
            .await;

        let provider = test_provider(&server).await;
        let err = provider
            .converse("sonnet", "", &[ChatMessage::text("user", "hi")], &[])
            .await
            .unwrap_err();
        assert!(err.is_throttled());
    }

    #[test]
    fn from_config_requires_api_key() {
        let config = BedrockConfig::default();
        let err = BedrockProvider::from_config(&config).unwrap_err();
        assert!(matches!(err, TabletalkError::Config(_)));
    }
}
