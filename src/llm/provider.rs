// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Agentdesk Contributors

//! Provider adapter trait
//!
//! Each LLM backend implements this trait; the orchestrator only ever talks
//! to `dyn ProviderAdapter`.

use async_trait::async_trait;

use crate::error::Result;
use crate::llm::message::{ChatRequest, ChatResponse};

/// A connection to one LLM backend
///
/// Implementations classify their failures as `ProviderError::Unavailable`,
/// `Transient`, or `Permanent`; the retry loop only retries `Transient`.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Stable identifier used in settings and request routing ("openai", ...)
    fn name(&self) -> &str;

    /// Execute one completion request against the backend
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse>;
}
