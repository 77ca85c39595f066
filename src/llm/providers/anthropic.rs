// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Agentdesk Contributors

//! Anthropic messages adapter
//!
//! The messages API takes the system prompt as a top-level field rather than
//! a conversation turn, so a leading system turn is split out before sending.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, Result};
use crate::llm::message::{ChatRequest, ChatResponse, Role, Usage};
use crate::llm::provider::ProviderAdapter;
use crate::llm::providers::{classify_status, classify_transport_error};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

pub struct AnthropicAdapter {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

#[derive(Serialize)]
struct WireRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<WireMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct WireResponse {
    content: Vec<WireContent>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireContent {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize, Default)]
struct WireUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

impl AnthropicAdapter {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the adapter at a different endpoint (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ProviderError::Unavailable("Anthropic API key not configured".to_string())
        })?;

        let mut system = None;
        let mut messages = Vec::with_capacity(request.turns.len());
        for turn in &request.turns {
            match turn.role {
                Role::System if system.is_none() => system = Some(turn.content.clone()),
                // extra system turns are demoted rather than dropped
                Role::System => messages.push(WireMessage {
                    role: "user".to_string(),
                    content: turn.content.clone(),
                }),
                role => messages.push(WireMessage {
                    role: role.to_string(),
                    content: turn.content.clone(),
                }),
            }
        }

        let body = WireRequest {
            model: request.model.clone(),
            max_tokens: DEFAULT_MAX_TOKENS,
            system,
            messages,
            temperature: request.temperature,
        };

        tracing::debug!(model = %request.model, turns = request.turns.len(), "anthropic request");
        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &text).into());
        }

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Permanent(format!("malformed response: {e}")))?;

        let content = wire
            .content
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| ProviderError::Permanent("response contained no content".to_string()))?;

        let usage = wire.usage.unwrap_or_default();
        Ok(ChatResponse {
            content,
            provider: "anthropic".to_string(),
            model: request.model.clone(),
            usage: Usage {
                prompt_tokens: usage.input_tokens,
                completion_tokens: usage.output_tokens,
                total_tokens: usage.input_tokens + usage.output_tokens,
            },
        })
    }
}
