// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Agentdesk Contributors

//! LLM request orchestration
//!
//! Resolves provider/model/temperature per request, drives the retry loop,
//! and publishes `request_start`, `request_complete`, and `request_error`
//! events around every completion. Picks up `config_updated` events to
//! rebuild its adapter table without a restart.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::{LlmSettings, Settings};
use crate::error::{ProviderError, Result};
use crate::events::EventBus;
use crate::llm::factory::build_adapters;
use crate::llm::message::{ChatRequest, ChatResponse, ChatTurn};
use crate::llm::provider::ProviderAdapter;
use crate::llm::retry::{with_retry, RetryConfig};

/// Per-call overrides for the configured defaults
#[derive(Debug, Clone, Default)]
pub struct CompletionOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
}

struct OrchestratorState {
    adapters: HashMap<String, Arc<dyn ProviderAdapter>>,
    provider: String,
    model: String,
    temperature: f32,
}

/// Routes completion requests to the right adapter
pub struct LlmOrchestrator {
    bus: Arc<EventBus>,
    state: Arc<RwLock<OrchestratorState>>,
    retry: RetryConfig,
}

impl LlmOrchestrator {
    /// Build an orchestrator from settings with the standard adapter table
    pub fn new(bus: Arc<EventBus>, settings: &LlmSettings) -> Self {
        Self::with_adapters(
            bus,
            build_adapters(settings),
            &settings.provider,
            &settings.model,
            settings.temperature,
        )
    }

    /// Build an orchestrator over an explicit adapter table
    ///
    /// Tests inject mock adapters through this constructor.
    pub fn with_adapters(
        bus: Arc<EventBus>,
        adapters: HashMap<String, Arc<dyn ProviderAdapter>>,
        provider: &str,
        model: &str,
        temperature: f32,
    ) -> Self {
        Self {
            bus,
            state: Arc::new(RwLock::new(OrchestratorState {
                adapters,
                provider: provider.to_string(),
                model: model.to_string(),
                temperature,
            })),
            retry: RetryConfig::default(),
        }
    }

    /// Replace the retry policy (tests use a short base delay)
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Start listening for `config_updated` events
    ///
    /// The payload is expected to be a settings document; its `llm` section
    /// replaces the adapter table and the configured defaults.
    pub fn watch_config(self: &Arc<Self>) {
        let state = Arc::clone(&self.state);
        self.bus.subscribe("config_updated", move |_event, payload| {
            let state = Arc::clone(&state);
            async move {
                let settings: Settings = serde_json::from_value(payload)?;
                let mut guard = state.write().await;
                guard.adapters = build_adapters(&settings.llm);
                guard.provider = settings.llm.provider;
                guard.model = settings.llm.model;
                guard.temperature = settings.llm.temperature;
                tracing::info!(provider = %guard.provider, model = %guard.model, "llm settings reloaded");
                Ok(())
            }
        });
    }

    /// Currently configured default provider and model
    pub async fn defaults(&self) -> (String, String, f32) {
        let state = self.state.read().await;
        (
            state.provider.clone(),
            state.model.clone(),
            state.temperature,
        )
    }

    /// Run one completion over the given turns
    ///
    /// Transient adapter failures are retried with linear backoff and only
    /// surface after the retry budget is exhausted.
    pub async fn complete(
        &self,
        turns: Vec<ChatTurn>,
        overrides: CompletionOverrides,
    ) -> Result<ChatResponse> {
        let (adapter, request) = {
            let state = self.state.read().await;
            let provider = overrides.provider.unwrap_or_else(|| state.provider.clone());
            let adapter = state.adapters.get(&provider).cloned().ok_or_else(|| {
                ProviderError::Unavailable(format!("no adapter for provider '{provider}'"))
            })?;
            let request = ChatRequest {
                model: overrides.model.unwrap_or_else(|| state.model.clone()),
                temperature: overrides.temperature.unwrap_or(state.temperature),
                provider,
                turns,
            };
            (adapter, request)
        };

        let request_id = Uuid::new_v4().to_string();
        self.bus
            .publish(
                "request_start",
                json!({
                    "id": request_id,
                    "provider": request.provider,
                    "model": request.model,
                }),
            )
            .await;
        tracing::info!(id = %request_id, provider = %request.provider, model = %request.model, "llm request");

        let outcome = with_retry(&self.retry, || adapter.complete(&request)).await;

        match outcome {
            Ok(response) => {
                self.bus
                    .publish(
                        "request_complete",
                        json!({
                            "id": request_id,
                            "provider": response.provider,
                            "model": response.model,
                            "total_tokens": response.usage.total_tokens,
                        }),
                    )
                    .await;
                Ok(response)
            }
            Err(e) => {
                tracing::error!(id = %request_id, error = %e, "llm request failed");
                self.bus
                    .publish(
                        "request_error",
                        json!({
                            "id": request_id,
                            "provider": request.provider,
                            "error": e.to_string(),
                        }),
                    )
                    .await;
                Err(e)
            }
        }
    }
}
