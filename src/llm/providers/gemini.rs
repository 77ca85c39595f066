// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Agentdesk Contributors

//! Google Gemini adapter
//!
//! The generateContent API differs from the chat-completions shape: the
//! model is part of the URL, the key is a query parameter, roles are
//! "user"/"model", and the system prompt rides in `systemInstruction`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, Result};
use crate::llm::message::{ChatRequest, ChatResponse, Role, Usage};
use crate::llm::provider::ProviderAdapter;
use crate::llm::providers::{classify_status, classify_transport_error};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiAdapter {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent>,
    contents: Vec<WireContent>,
    generation_config: WireGenerationConfig,
}

#[derive(Serialize)]
struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<WirePart>,
}

#[derive(Serialize)]
struct WirePart {
    text: String,
}

#[derive(Serialize)]
struct WireGenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponse {
    candidates: Vec<WireCandidate>,
    #[serde(default)]
    usage_metadata: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireCandidate {
    content: WireCandidateContent,
}

#[derive(Deserialize)]
struct WireCandidateContent {
    parts: Vec<WireCandidatePart>,
}

#[derive(Deserialize)]
struct WireCandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct WireUsage {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
    #[serde(default)]
    total_token_count: u64,
}

impl GeminiAdapter {
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

    fn text_content(role: Option<&str>, text: &str) -> WireContent {
        WireContent {
            role: role.map(str::to_string),
            parts: vec![WirePart {
                text: text.to_string(),
            }],
        }
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ProviderError::Unavailable("Gemini API key not configured".to_string())
        })?;

        let mut system_instruction = None;
        let mut contents = Vec::with_capacity(request.turns.len());
        for turn in &request.turns {
            match turn.role {
                Role::System if system_instruction.is_none() => {
                    system_instruction = Some(Self::text_content(None, &turn.content));
                }
                // extra system turns are demoted rather than dropped
                Role::System => contents.push(Self::text_content(Some("user"), &turn.content)),
                Role::User => contents.push(Self::text_content(Some("user"), &turn.content)),
                Role::Assistant => contents.push(Self::text_content(Some("model"), &turn.content)),
            }
        }

        let body = WireRequest {
            system_instruction,
            contents,
            generation_config: WireGenerationConfig {
                temperature: request.temperature,
            },
        };

        tracing::debug!(model = %request.model, turns = request.turns.len(), "gemini request");
        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, request.model
            ))
            .query(&[("key", api_key)])
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
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<String>()
            })
            .ok_or_else(|| {
                ProviderError::Permanent("response contained no candidates".to_string())
            })?;

        let usage = wire.usage_metadata.unwrap_or_default();
        Ok(ChatResponse {
            content,
            provider: "gemini".to_string(),
            model: request.model.clone(),
            usage: Usage {
                prompt_tokens: usage.prompt_token_count,
                completion_tokens: usage.candidates_token_count,
                total_tokens: usage.total_token_count,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentDeskError;
    use crate::llm::message::ChatTurn;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ChatRequest {
        ChatRequest {
            provider: "gemini".to_string(),
            model: "gemini-1.5-flash".to_string(),
            turns: vec![
                ChatTurn::system("be brief"),
                ChatTurn::user("hello"),
                ChatTurn::assistant("hi"),
                ChatTurn::user("again"),
            ],
            temperature: 0.4,
        }
    }

    #[tokio::test]
    async fn test_missing_key_is_unavailable() {
        let adapter = GeminiAdapter::new(None);
        let err = adapter.complete(&request()).await.unwrap_err();
        assert!(matches!(
            err,
            AgentDeskError::Provider(ProviderError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_roles_mapped_and_system_lifted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .and(query_param("key", "sk-gem"))
            .and(body_partial_json(json!({
                "systemInstruction": {"parts": [{"text": "be brief"}]},
                "contents": [
                    {"role": "user", "parts": [{"text": "hello"}]},
                    {"role": "model", "parts": [{"text": "hi"}]},
                    {"role": "user", "parts": [{"text": "again"}]}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "Once more"}]}}],
                "usageMetadata": {"promptTokenCount": 9, "candidatesTokenCount": 3, "totalTokenCount": 12}
            })))
            .mount(&server)
            .await;

        let adapter = GeminiAdapter::new(Some("sk-gem".to_string())).with_base_url(server.uri());
        let resp = adapter.complete(&request()).await.unwrap();

        assert_eq!(resp.content, "Once more");
        assert_eq!(resp.provider, "gemini");
        assert_eq!(resp.usage.total_tokens, 12);
    }

    #[tokio::test]
    async fn test_quota_exceeded_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
            .mount(&server)
            .await;

        let adapter = GeminiAdapter::new(Some("sk-gem".to_string())).with_base_url(server.uri());
        assert!(adapter.complete(&request()).await.unwrap_err().is_transient());
    }

    #[tokio::test]
    async fn test_invalid_key_is_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let adapter = GeminiAdapter::new(Some("bad".to_string())).with_base_url(server.uri());
        let err = adapter.complete(&request()).await.unwrap_err();
        assert!(matches!(
            err,
            AgentDeskError::Provider(ProviderError::Permanent(_))
        ));
    }
}
