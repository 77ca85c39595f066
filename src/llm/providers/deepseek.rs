// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Agentdesk Contributors

//! DeepSeek chat completions adapter (OpenAI-compatible endpoint)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, Result};
use crate::llm::message::{ChatRequest, ChatResponse, ChatTurn, Usage};
use crate::llm::provider::ProviderAdapter;
use crate::llm::providers::{classify_status, classify_transport_error};

const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";

pub struct DeepSeekAdapter {
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

impl DeepSeekAdapter {
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
impl ProviderAdapter for DeepSeekAdapter {
    fn name(&self) -> &str {
        "deepseek"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ProviderError::Unavailable("DeepSeek API key not configured".to_string())
        })?;

        let body = WireRequest {
            model: &request.model,
            messages: &request.turns,
            temperature: request.temperature,
        };

        tracing::debug!(model = %request.model, turns = request.turns.len(), "deepseek request");
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
            provider: "deepseek".to_string(),
            model: request.model.clone(),
            usage: Usage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentDeskError;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ChatRequest {
        ChatRequest {
            provider: "deepseek".to_string(),
            model: "deepseek-chat".to_string(),
            turns: vec![ChatTurn::user("hello")],
            temperature: 0.7,
        }
    }

    #[tokio::test]
    async fn test_missing_key_is_unavailable() {
        let adapter = DeepSeekAdapter::new(None);
        let err = adapter.complete(&request()).await.unwrap_err();
        assert!(matches!(
            err,
            AgentDeskError::Provider(ProviderError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_successful_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Hello!"}}]
            })))
            .mount(&server)
            .await;

        let adapter = DeepSeekAdapter::new(Some("sk-deep".to_string())).with_base_url(server.uri());
        let resp = adapter.complete(&request()).await.unwrap();

        assert_eq!(resp.content, "Hello!");
        assert_eq!(resp.provider, "deepseek");
        // no counters reported -> zero-filled
        assert_eq!(resp.usage, Usage::default());
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let adapter = DeepSeekAdapter::new(Some("sk-deep".to_string())).with_base_url(server.uri());
        assert!(adapter.complete(&request()).await.unwrap_err().is_transient());
    }
}
