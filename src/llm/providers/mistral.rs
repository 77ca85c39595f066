// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Agentdesk Contributors

//! Mistral chat completions adapter
//!
//! The endpoint speaks the OpenAI chat-completions shape, so the wire types
//! mirror the OpenAI adapter's.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, Result};
use crate::llm::message::{ChatRequest, ChatResponse, ChatTurn, Usage};
use crate::llm::provider::ProviderAdapter;
use crate::llm::providers::{classify_status, classify_transport_error};

const DEFAULT_BASE_URL: &str = "https://api.mistral.ai/v1";

pub struct MistralAdapter {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    temperature: f32,
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[derive(Deserialize)]
struct WireMessage {
    content: String,
}

#[derive(Deserialize, Default)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

impl MistralAdapter {
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
impl ProviderAdapter for MistralAdapter {
    fn name(&self) -> &str {
        "mistral"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ProviderError::Unavailable("Mistral API key not configured".to_string())
        })?;

        let body = WireRequest {
            model: &request.model,
            messages: &request.turns,
            temperature: request.temperature,
        };

        tracing::debug!(model = %request.model, turns = request.turns.len(), "mistral request");
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
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
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::Permanent("response contained no choices".to_string()))?;

        let usage = wire.usage.unwrap_or_default();
        Ok(ChatResponse {
            content,
            provider: "mistral".to_string(),
            model: request.model.clone(),
            usage: Usage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            },
        })
    }
}
