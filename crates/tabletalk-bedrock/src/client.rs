// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the model runtime API.
//!
//! Provides [`BedrockClient`] which handles request construction,
//! authentication, and error classification for the invoke and converse
//! endpoints.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use tabletalk_core::TabletalkError;
use tracing::debug;

use crate::types::{ApiErrorResponse, ConverseRequest, ConverseResponse, InvokeRequest};

/// HTTP client for model runtime communication.
///
/// Throttling rejections surface as [`TabletalkError::Throttled`] so the
/// turn-level retry policy can distinguish them from hard failures.
#[derive(Debug, Clone)]
pub struct BedrockClient {
    client: reqwest::Client,
    base_url: String,
}

impl BedrockClient {
    /// Creates a new runtime client against the given endpoint.
    pub fn new(endpoint: String, api_key: String) -> Result<Self, TabletalkError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| TabletalkError::Config(format!("invalid API key header value: {e}")))?;
        auth.set_sensitive(true);
        headers.insert("authorization", auth);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| TabletalkError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Sends a single-shot invoke request and returns the raw response body.
    ///
    /// The body is returned unparsed so callers can degrade gracefully when
    /// the envelope does not have the expected shape.
    pub async fn invoke(
        &self,
        model_id: &str,
        request: &InvokeRequest,
    ) -> Result<String, TabletalkError> {
        let url = format!("{}/model/{}/invoke", self.base_url, model_id);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| TabletalkError::Provider {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, model_id, "invoke response received");

        let body = response.text().await.map_err(|e| TabletalkError::Provider {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        if status.is_success() {
            return Ok(body);
        }
        Err(classify_error(status, &body))
    }

    /// Sends a tool-aware converse request and returns the parsed response.
    pub async fn converse(
        &self,
        model_id: &str,
        request: &ConverseRequest,
    ) -> Result<ConverseResponse, TabletalkError> {
        let url = format!("{}/model/{}/converse", self.base_url, model_id);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| TabletalkError::Provider {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, model_id, "converse response received");

        let body = response.text().await.map_err(|e| TabletalkError::Provider {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        if !status.is_success() {
            return Err(classify_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| TabletalkError::Provider {
            message: format!("failed to parse converse response: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

/// Maps a non-success response to an error, distinguishing throttling.
fn classify_error(status: reqwest::StatusCode, body: &str) -> TabletalkError {
    let api_err = serde_json::from_str::<ApiErrorResponse>(body).ok();
    let is_throttled = status.as_u16() == 429
        || api_err
            .as_ref()
            .is_some_and(|e| e.type_.contains("ThrottlingException"));

    let message = match api_err {
        Some(e) if !e.type_.is_empty() => format!("{}: {}", e.type_, e.message),
        _ => format!("API returned {status}: {body}"),
    };

    if is_throttled {
        TabletalkError::Throttled { message }
    } else {
        TabletalkError::Provider {
            message,
            source: None,
        }
    }
}
