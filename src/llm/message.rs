// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Agentdesk Contributors

//! Chat message types shared across providers
//!
//! Requests and responses are provider-neutral; each adapter translates them
//! to and from its backend's wire format.

use serde::{Deserialize, Serialize};

/// Role of a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single turn of conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only conversation history with a sliding request window
///
/// Turns are never dropped from storage; `window()` returns a bounded copy of
/// the most recent turns for building requests.
#[derive(Debug, Clone)]
pub struct Conversation {
    turns: Vec<ChatTurn>,
    max_history: usize,
}

impl Conversation {
    pub const DEFAULT_MAX_HISTORY: usize = 10;

    pub fn new() -> Self {
        Self::with_max_history(Self::DEFAULT_MAX_HISTORY)
    }

    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            turns: Vec::new(),
            max_history,
        }
    }

    /// Append a turn to the stored history
    pub fn push(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    /// The most recent `max_history` turns, oldest first
    ///
    /// Stored history is not mutated; older turns remain retrievable.
    pub fn window(&self) -> Vec<ChatTurn> {
        let start = self.turns.len().saturating_sub(self.max_history);
        self.turns[start..].to_vec()
    }

    /// Full stored history
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Drop all stored turns
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// A fully resolved completion request
///
/// Built once by the orchestrator with all defaults and overrides applied;
/// adapters treat it as read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub provider: String,
    pub model: String,
    pub turns: Vec<ChatTurn>,
    pub temperature: f32,
}

/// Token accounting for a completed request
///
/// Zero-filled when the backend does not report counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Response from a completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub usage: Usage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }

    #[test]
    fn test_turn_constructors() {
        let turn = ChatTurn::user("hello");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.content, "hello");

        assert_eq!(ChatTurn::system("sys").role, Role::System);
        assert_eq!(ChatTurn::assistant("hi").role, Role::Assistant);
    }

    #[test]
    fn test_window_under_limit_returns_everything() {
        let mut conv = Conversation::new();
        conv.push(ChatTurn::user("one"));
        conv.push(ChatTurn::assistant("two"));

        let window = conv.window();
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].content, "one");
    }

    #[test]
    fn test_window_caps_at_max_history_without_mutating() {
        let mut conv = Conversation::with_max_history(10);
        for i in 0..25 {
            conv.push(ChatTurn::user(format!("turn {i}")));
        }

        let window = conv.window();
        assert_eq!(window.len(), 10);
        assert_eq!(window[0].content, "turn 15");
        assert_eq!(window[9].content, "turn 24");
        // stored history untouched
        assert_eq!(conv.len(), 25);
        assert_eq!(conv.turns()[0].content, "turn 0");
    }

    #[test]
    fn test_clear() {
        let mut conv = Conversation::new();
        conv.push(ChatTurn::user("x"));
        conv.clear();
        assert!(conv.is_empty());
        assert!(conv.window().is_empty());
    }

    #[test]
    fn test_usage_defaults_to_zero() {
        let usage = Usage::default();
        assert_eq!(usage.prompt_tokens, 0);
        assert_eq!(usage.completion_tokens, 0);
        assert_eq!(usage.total_tokens, 0);
    }

    #[test]
    fn test_response_deserializes_without_usage() {
        let json = r#"{"content": "hi", "provider": "ollama", "model": "llama3"}"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.usage, Usage::default());
    }
}
