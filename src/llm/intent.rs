// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Agentdesk Contributors

//! Heuristic intent extraction from model output
//!
//! Decides whether a model response should be routed to a specialist agent.
//! Purely lexical: fenced code blocks and keyword scans, no model calls.

use regex::Regex;
use std::sync::OnceLock;

/// Routing decision derived from a model response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    /// Target agent type ("coder", "computer", "assistant")
    pub agent_type: String,
    /// Action to dispatch with
    pub action: String,
}

impl Intent {
    fn new(agent_type: &str, action: &str) -> Self {
        Self {
            agent_type: agent_type.to_string(),
            action: action.to_string(),
        }
    }

    /// True when the intent routes to a specialist rather than plain chat
    pub fn is_dispatchable(&self) -> bool {
        self.agent_type != "assistant"
    }
}

const CODE_LANGUAGES: &[&str] = &[
    "python",
    "javascript",
    "js",
    "typescript",
    "java",
    "c",
    "cpp",
    "rust",
    "go",
];

const CODER_KEYWORDS: &[&str] = &["code", "function", "class", "programming"];

const COMPUTER_KEYWORDS: &[&str] = &[
    "file",
    "directory",
    "folder",
    "execute",
    "command",
    "terminal",
];

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```(\w+)").expect("valid fence regex"))
}

/// Classify a model response into an agent routing intent
///
/// Checks, in order: a fenced code block tagged with a recognized language,
/// programming keywords, then filesystem/process keywords. Anything else
/// stays with the assistant and is not dispatched.
pub fn extract_intent(content: &str) -> Intent {
    let lower = content.to_lowercase();

    for capture in fence_regex().captures_iter(&lower) {
        if CODE_LANGUAGES.contains(&&capture[1]) {
            return Intent::new("coder", "analyze");
        }
    }

    if CODER_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return Intent::new("coder", "analyze");
    }

    if COMPUTER_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return Intent::new("computer", "process");
    }

    Intent::new("assistant", "respond")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_fence_routes_to_coder() {
        let content = "Here you go:\n```python\nprint('hi')\n```";
        let intent = extract_intent(content);
        assert_eq!(intent.agent_type, "coder");
        assert_eq!(intent.action, "analyze");
        assert!(intent.is_dispatchable());
    }

    #[test]
    fn test_rust_fence_routes_to_coder() {
        let intent = extract_intent("```rust\nfn main() {}\n```");
        assert_eq!(intent.agent_type, "coder");
    }

    #[test]
    fn test_unrecognized_fence_language_falls_through() {
        // "toml" is not a recognized execution language and the text has no
        // coder/computer keywords
        let intent = extract_intent("```toml\nkey = 1\n```");
        assert_eq!(intent.agent_type, "assistant");
    }

    #[test]
    fn test_untagged_fence_does_not_match() {
        let intent = extract_intent("```\nplain block\n```\nhello there");
        assert_eq!(intent.agent_type, "assistant");
    }

    #[test]
    fn test_coder_keywords() {
        let intent = extract_intent("Let me write a function for that.");
        assert_eq!(intent.agent_type, "coder");
        assert_eq!(intent.action, "analyze");
    }

    #[test]
    fn test_filesystem_keywords_route_to_computer() {
        let intent = extract_intent("List the files in my Documents folder");
        assert_eq!(intent.agent_type, "computer");
        assert_eq!(intent.action, "process");
    }

    #[test]
    fn test_terminal_keyword_routes_to_computer() {
        let intent = extract_intent("Open a terminal and run it");
        assert_eq!(intent.agent_type, "computer");
    }

    #[test]
    fn test_plain_chat_stays_with_assistant() {
        let intent = extract_intent("What is the capital of France? Paris.");
        assert_eq!(intent.agent_type, "assistant");
        assert!(!intent.is_dispatchable());
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let intent = extract_intent("EXECUTE the backup now");
        assert_eq!(intent.agent_type, "computer");
    }

    #[test]
    fn test_coder_keywords_take_precedence_over_computer() {
        // mentions both a class and a file; code wins by check order
        let intent = extract_intent("Add a class that reads the file");
        assert_eq!(intent.agent_type, "coder");
    }
}
