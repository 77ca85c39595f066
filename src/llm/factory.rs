// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Agentdesk Contributors

//! Adapter table construction from settings

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::LlmSettings;
use crate::llm::provider::ProviderAdapter;
use crate::llm::providers::{
    AnthropicAdapter, DeepSeekAdapter, GeminiAdapter, MistralAdapter, OllamaAdapter, OpenAiAdapter,
};

/// Build the full adapter table from LLM settings
///
/// Every supported backend gets an entry. Adapters whose credentials are
/// missing are still constructed; they report `Unavailable` when called so a
/// misconfigured provider never takes the application down at startup.
pub fn build_adapters(settings: &LlmSettings) -> HashMap<String, Arc<dyn ProviderAdapter>> {
    let key = |k: &Option<String>| k.clone().filter(|k| !k.is_empty());

    let mut adapters: HashMap<String, Arc<dyn ProviderAdapter>> = HashMap::new();
    adapters.insert(
        "openai".to_string(),
        Arc::new(OpenAiAdapter::new(key(&settings.api_key))),
    );
    adapters.insert(
        "anthropic".to_string(),
        Arc::new(AnthropicAdapter::new(key(&settings.anthropic_api_key))),
    );
    adapters.insert(
        "gemini".to_string(),
        Arc::new(GeminiAdapter::new(key(&settings.gemini_api_key))),
    );
    adapters.insert(
        "mistral".to_string(),
        Arc::new(MistralAdapter::new(key(&settings.mistral_api_key))),
    );
    adapters.insert(
        "deepseek".to_string(),
        Arc::new(DeepSeekAdapter::new(key(&settings.deepseek_api_key))),
    );
    adapters.insert("ollama".to_string(), Arc::new(OllamaAdapter::new()));

    tracing::debug!(count = adapters.len(), "provider adapters built");
    adapters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AgentDeskError, ProviderError};
    use crate::llm::message::{ChatRequest, ChatTurn};

    #[test]
    fn test_all_backends_present() {
        let adapters = build_adapters(&LlmSettings::default());
        for provider in ["openai", "anthropic", "gemini", "mistral", "deepseek", "ollama"] {
            assert!(adapters.contains_key(provider), "{provider}");
        }
    }

    #[tokio::test]
    async fn test_keyless_adapter_is_unavailable_not_absent() {
        let settings = LlmSettings {
            api_key: Some(String::new()),
            ..Default::default()
        };
        let adapters = build_adapters(&settings);

        let request = ChatRequest {
            provider: "openai".to_string(),
            model: "gpt-4".to_string(),
            turns: vec![ChatTurn::user("hi")],
            temperature: 0.7,
        };
        let err = adapters["openai"].complete(&request).await.unwrap_err();
        assert!(matches!(
            err,
            AgentDeskError::Provider(ProviderError::Unavailable(_))
        ));
    }
}
