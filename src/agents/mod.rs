// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Agentdesk Contributors

//! Agent contract, built-in variants, and lifecycle management
//!
//! An `Agent` is a stateful worker with a strict lifecycle: construct,
//! `initialize` to completion, any number of `process` calls, then `cleanup`.
//! The `AgentManager` owns every live instance and enforces at most one per
//! agent type.
//!
//! Built-in variants:
//! - `assistant` - stateless conversational fallback
//! - `coder` - code generation and sandboxed execution in a temp directory
//! - `computer` - guarded filesystem and shell access

pub mod assistant;
pub mod coder;
pub mod computer;
pub mod manager;
pub mod types;

pub use assistant::AssistantAgent;
pub use coder::CoderAgent;
pub use computer::ComputerAgent;
pub use manager::{AgentFactory, AgentManager};
pub use types::{AgentOutput, TaskContext, TaskStatus};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Contract implemented by every agent variant
#[async_trait]
pub trait Agent: Send + Sync {
    /// Stable type identifier used for registration and dispatch
    fn agent_type(&self) -> &str;

    /// Human-readable capability labels for UI display
    fn capabilities(&self) -> Vec<String>;

    /// True if the instance should be terminated after a single `process`
    fn auto_terminate(&self) -> bool {
        false
    }

    /// Acquire resources; must complete before the first `process`
    async fn initialize(&mut self) -> Result<()>;

    /// Handle one task
    ///
    /// Domain-level failures are reported through `AgentOutput::error`;
    /// `Err` is reserved for infrastructure failures.
    async fn process(&mut self, task: TaskContext) -> Result<AgentOutput>;

    /// Release resources; failures are logged by the manager, not propagated
    async fn cleanup(&mut self) -> Result<()>;

    /// Hint for the desktop shell about how to lay out this agent's panel
    fn workspace_layout(&self) -> Value {
        Value::Null
    }

    /// React to a UI event; `None` means not handled
    fn handle_ui_event(&mut self, _event: &str, _payload: &Value) -> Option<Value> {
        None
    }
}
