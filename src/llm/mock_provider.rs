// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Agentdesk Contributors

//! Scripted mock provider adapter for tests
//!
//! Queues responses and failures in order, records every request it receives,
//! and counts calls. Used by orchestrator and controller tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{ProviderError, Result};
use crate::llm::message::{ChatRequest, ChatResponse, Usage};
use crate::llm::provider::ProviderAdapter;

enum ScriptedOutcome {
    Response(ChatResponse),
    Failure(ProviderError),
}

/// Mock adapter with a scripted outcome queue
pub struct MockAdapter {
    name: String,
    script: Mutex<VecDeque<ScriptedOutcome>>,
    requests: Mutex<Vec<ChatRequest>>,
    call_count: AtomicUsize,
}

impl MockAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Queue a plain-text response
    pub fn push_response(&self, content: impl Into<String>) {
        let response = ChatResponse {
            content: content.into(),
            provider: self.name.clone(),
            model: "mock-model".to_string(),
            usage: Usage::default(),
        };
        self.script
            .lock()
            .unwrap()
            .push_back(ScriptedOutcome::Response(response));
    }

    /// Queue a failure
    pub fn push_failure(&self, error: ProviderError) {
        self.script
            .lock()
            .unwrap()
            .push_back(ScriptedOutcome::Failure(error));
    }

    /// Number of `complete` calls received so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Copies of every request received, in order
    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderAdapter for MockAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        match self.script.lock().unwrap().pop_front() {
            Some(ScriptedOutcome::Response(response)) => Ok(response),
            Some(ScriptedOutcome::Failure(error)) => Err(error.into()),
            None => Ok(ChatResponse {
                content: "mock response".to_string(),
                provider: self.name.clone(),
                model: request.model.clone(),
                usage: Usage::default(),
            }),
        }
    }
}
