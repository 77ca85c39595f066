// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Agentdesk Contributors

//! LLM provider abstraction and request orchestration
//!
//! A `ProviderAdapter` per backend (OpenAI, Anthropic, Ollama) sits behind
//! the `LlmOrchestrator`, which resolves defaults and overrides, retries
//! transient failures, and publishes request lifecycle events.

pub mod factory;
pub mod intent;
pub mod message;
pub mod mock_provider;
pub mod orchestrator;
pub mod provider;
pub mod providers;
pub mod retry;

pub use factory::build_adapters;
pub use intent::{extract_intent, Intent};
pub use message::{ChatRequest, ChatResponse, ChatTurn, Conversation, Role, Usage};
pub use mock_provider::MockAdapter;
pub use orchestrator::{CompletionOverrides, LlmOrchestrator};
pub use provider::ProviderAdapter;
pub use retry::{with_retry, RetryConfig};
