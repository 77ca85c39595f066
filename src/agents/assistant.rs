// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Agentdesk Contributors

//! Stateless conversational fallback agent

use async_trait::async_trait;
use serde_json::json;

use crate::agents::types::{AgentOutput, TaskContext};
use crate::agents::Agent;
use crate::error::Result;

/// Catch-all agent for plain conversation
///
/// Holds no resources; initialize and cleanup are no-ops.
#[derive(Debug, Default)]
pub struct AssistantAgent;

impl AssistantAgent {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Agent for AssistantAgent {
    fn agent_type(&self) -> &str {
        "assistant"
    }

    fn capabilities(&self) -> Vec<String> {
        vec![
            "conversation".to_string(),
            "general assistance".to_string(),
        ]
    }

    async fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    async fn process(&mut self, task: TaskContext) -> Result<AgentOutput> {
        let content = task.get_str("content").unwrap_or("");
        tracing::debug!(action = %task.action, "assistant acknowledging");
        Ok(AgentOutput::success()
            .with_message(format!("I can help with that: {content}"))
            .with("action", task.action.clone()))
    }

    async fn cleanup(&mut self) -> Result<()> {
        Ok(())
    }

    fn workspace_layout(&self) -> serde_json::Value {
        json!({"panel": "chat"})
    }
}
