// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Agentdesk Contributors

//! Ollama local model adapter
//!
//! Talks to a local Ollama daemon; no credentials involved. A daemon that is
//! not running shows up as a connect failure, which classifies as transient.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, Result};
use crate::llm::message::{ChatRequest, ChatResponse, ChatTurn, Usage};
use crate::llm::provider::ProviderAdapter;
use crate::llm::providers::{classify_status, classify_transport_error};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

pub struct OllamaAdapter {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    stream: bool,
    options: WireOptions,
}

#[derive(Serialize)]
struct WireOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct WireResponse {
    message: WireMessage,
    #[serde(default)]
    prompt_eval_count: u64,
    #[serde(default)]
    eval_count: u64,
}

#[derive(Deserialize)]
struct WireMessage {
    content: String,
}

impl OllamaAdapter {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the adapter at a different daemon (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for OllamaAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for OllamaAdapter {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let body = WireRequest {
            model: &request.model,
            messages: &request.turns,
            stream: false,
            options: WireOptions {
                temperature: request.temperature,
            },
        };

        tracing::debug!(model = %request.model, turns = request.turns.len(), "ollama request");
        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
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

        Ok(ChatResponse {
            content: wire.message.content,
            provider: "ollama".to_string(),
            model: request.model.clone(),
            usage: Usage {
                prompt_tokens: wire.prompt_eval_count,
                completion_tokens: wire.eval_count,
                total_tokens: wire.prompt_eval_count + wire.eval_count,
            },
        })
    }
}
