// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Agentdesk Contributors

//! Task and result types for agent dispatch

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single unit of work handed to an agent
///
/// Ephemeral: built per dispatch, consumed by `process`, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskContext {
    pub action: String,
    #[serde(default)]
    pub payload: Map<String, Value>,
}

impl TaskContext {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            payload: Map::new(),
        }
    }

    /// Attach a payload field
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// Payload field as a string, if present and a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }
}

/// Outcome status of a processed task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Success,
    Error,
}

/// Result of a processed task
///
/// Execution failures inside an agent (nonzero exit codes, rejected commands,
/// unknown actions) are reported here rather than as `Err`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOutput {
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl AgentOutput {
    pub fn success() -> Self {
        Self {
            status: TaskStatus::Success,
            message: None,
            data: Map::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Error,
            message: Some(message.into()),
            data: Map::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach a data field
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Success
    }
}
