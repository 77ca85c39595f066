// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Agentdesk Contributors

//! Application controller
//!
//! The seam between the desktop shell and the core: owns the conversation
//! history, runs the submit -> complete -> intent -> dispatch flow, and
//! exposes agent lifecycle operations. Every failure comes back as a
//! structured outcome; nothing here panics at the caller.

use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;

use crate::agents::{AgentManager, AgentOutput, TaskContext};
use crate::config::Settings;
use crate::error::Result;
use crate::events::EventBus;
use crate::llm::{extract_intent, ChatTurn, CompletionOverrides, Conversation, LlmOrchestrator};

const SYSTEM_DIRECTIVE: &str = "You are the coordinator of a desktop AI application. \
You can answer directly, or produce output for one of the specialized agents: \
'coder' writes, analyzes, and executes code; 'computer' runs commands and browses \
files within allowed directories; 'assistant' handles general conversation. \
Answer the user's request as helpfully and concisely as you can.";

/// Result of one user submission
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Model answered directly; no agent involved
    Direct { content: String },
    /// Model output was routed to a specialist agent
    Agent {
        agent_type: String,
        content: String,
        result: AgentOutput,
    },
    /// Something failed; the message is user-presentable
    Error { message: String },
}

/// Top-level coordinator wired to the event bus, orchestrator, and manager
pub struct AppController {
    bus: Arc<EventBus>,
    orchestrator: Arc<LlmOrchestrator>,
    manager: Arc<AgentManager>,
    conversation: AsyncMutex<Conversation>,
}

impl AppController {
    /// Build the full application core from settings
    pub fn new(settings: &Settings) -> Self {
        let bus = Arc::new(EventBus::new());
        let orchestrator = Arc::new(LlmOrchestrator::new(bus.clone(), &settings.llm));
        orchestrator.watch_config();
        let manager = Arc::new(AgentManager::with_defaults(bus.clone(), settings));
        Self::from_parts(bus, orchestrator, manager, settings.app.max_history)
    }

    /// Assemble a controller from pre-built parts (used by tests)
    pub fn from_parts(
        bus: Arc<EventBus>,
        orchestrator: Arc<LlmOrchestrator>,
        manager: Arc<AgentManager>,
        max_history: usize,
    ) -> Self {
        Self {
            bus,
            orchestrator,
            manager,
            conversation: AsyncMutex::new(Conversation::with_max_history(max_history)),
        }
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn manager(&self) -> &Arc<AgentManager> {
        &self.manager
    }

    /// Handle one user submission end to end
    ///
    /// Appends the user turn, completes against the windowed history, records
    /// the assistant turn, then routes by intent. The stored history keeps
    /// every turn; only the request is windowed.
    pub async fn submit_input(&self, input: &str) -> SubmitOutcome {
        let turns = {
            let mut conversation = self.conversation.lock().await;
            conversation.push(ChatTurn::user(input));

            let mut turns = vec![ChatTurn::system(SYSTEM_DIRECTIVE)];
            turns.extend(conversation.window());
            turns
        };

        let response = match self
            .orchestrator
            .complete(turns, CompletionOverrides::default())
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "completion failed");
                return SubmitOutcome::Error {
                    message: e.to_string(),
                };
            }
        };

        self.conversation
            .lock()
            .await
            .push(ChatTurn::assistant(&response.content));

        let intent = extract_intent(&response.content);
        if !intent.is_dispatchable() {
            return SubmitOutcome::Direct {
                content: response.content,
            };
        }

        tracing::info!(agent_type = %intent.agent_type, action = %intent.action, "routing to agent");
        let task = TaskContext::new(&intent.action)
            .with("content", response.content.clone())
            .with("user_input", input);

        match self.manager.dispatch(&intent.agent_type, task).await {
            Ok(result) => SubmitOutcome::Agent {
                agent_type: intent.agent_type,
                content: response.content,
                result,
            },
            Err(e) => {
                tracing::error!(agent_type = %intent.agent_type, error = %e, "dispatch failed");
                SubmitOutcome::Error {
                    message: e.to_string(),
                }
            }
        }
    }

    /// Create and initialize an agent ahead of use
    pub async fn activate_agent(&self, agent_type: &str) -> Result<()> {
        self.manager.activate(agent_type).await
    }

    /// Terminate a live agent; false if none was live
    pub async fn terminate_agent(&self, agent_type: &str) -> bool {
        self.manager.terminate(agent_type).await
    }

    /// Forward a UI event to a live agent's panel hook
    pub async fn agent_ui_event(
        &self,
        agent_type: &str,
        event: &str,
        payload: &serde_json::Value,
    ) -> Result<Option<serde_json::Value>> {
        self.manager.ui_event(agent_type, event, payload).await
    }

    /// Drop the stored conversation history
    pub async fn clear_conversation(&self) {
        self.conversation.lock().await.clear();
        tracing::debug!("conversation cleared");
    }

    /// Full stored history, oldest first
    pub async fn history(&self) -> Vec<ChatTurn> {
        self.conversation.lock().await.turns().to_vec()
    }

    /// Apply new settings: persist them and notify running components
    pub async fn update_settings(&self, settings: &Settings) -> Result<()> {
        settings.save()?;
        self.bus
            .publish("config_updated", serde_json::to_value(settings)?)
            .await;
        Ok(())
    }

    /// Shut down every live agent
    pub async fn shutdown(&self) {
        self.manager.terminate_all().await;
        tracing::info!("controller shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockAdapter, ProviderAdapter, RetryConfig};
    use std::collections::HashMap;
    use std::time::Duration;

    fn controller_with_mock() -> (AppController, Arc<MockAdapter>) {
        let bus = Arc::new(EventBus::new());
        let mock = Arc::new(MockAdapter::new("mock"));
        let mut adapters: HashMap<String, Arc<dyn ProviderAdapter>> = HashMap::new();
        adapters.insert("mock".to_string(), mock.clone());

        let orchestrator = Arc::new(
            LlmOrchestrator::with_adapters(bus.clone(), adapters, "mock", "mock-model", 0.7)
                .with_retry_config(RetryConfig {
                    max_attempts: 3,
                    base_delay: Duration::from_millis(5),
                }),
        );

        let settings = Settings::default();
        let manager = Arc::new(AgentManager::with_defaults(bus.clone(), &settings));
        (
            AppController::from_parts(bus, orchestrator, manager, 10),
            mock,
        )
    }

    #[tokio::test]
    async fn test_plain_answer_is_direct() {
        let (controller, mock) = controller_with_mock();
        mock.push_response("The capital of France is Paris.");

        match controller.submit_input("What is the capital of France?").await {
            SubmitOutcome::Direct { content } => assert!(content.contains("Paris")),
            other => panic!("expected direct outcome, got {other:?}"),
        }

        // both turns recorded
        let history = controller.history().await;
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_code_response_routed_to_coder() {
        let (controller, mock) = controller_with_mock();
        mock.push_response("```python\nprint('hi')\n```");

        match controller.submit_input("write me a greeting").await {
            SubmitOutcome::Agent {
                agent_type, result, ..
            } => {
                assert_eq!(agent_type, "coder");
                assert!(result.is_success());
            }
            other => panic!("expected agent outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_computer_route_does_not_execute_reply_text() {
        let (controller, mock) = controller_with_mock();
        mock.push_response("You could delete old files in that folder to free space.");

        match controller.submit_input("how do I free disk space?").await {
            SubmitOutcome::Agent {
                agent_type, result, ..
            } => {
                assert_eq!(agent_type, "computer");
                assert!(result.is_success());
                // the reply is acknowledged, never run through a shell
                assert!(result.data.get("exit_code").is_none());
                assert!(result.data.get("stdout").is_none());
            }
            other => panic!("expected agent outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_provider_failure_is_structured_error() {
        let (controller, mock) = controller_with_mock();
        for _ in 0..3 {
            mock.push_failure(crate::error::ProviderError::Transient("down".to_string()));
        }

        match controller.submit_input("hello").await {
            SubmitOutcome::Error { message } => assert!(message.contains("down")),
            other => panic!("expected error outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_request_window_capped_with_full_history_kept() {
        let (controller, mock) = controller_with_mock();

        for i in 0..12 {
            mock.push_response("fine.");
            controller.submit_input(&format!("message {i}")).await;
        }

        // 12 user + 12 assistant turns stored
        assert_eq!(controller.history().await.len(), 24);

        // last request: 1 system turn + the 10-turn window
        let requests = mock.recorded_requests();
        let last = requests.last().unwrap();
        assert_eq!(last.turns.len(), 11);
        assert_eq!(last.turns[0].role, crate::llm::Role::System);
    }

    #[tokio::test]
    async fn test_clear_conversation() {
        let (controller, mock) = controller_with_mock();
        mock.push_response("ok.");
        controller.submit_input("hello").await;

        controller.clear_conversation().await;
        assert!(controller.history().await.is_empty());
    }

    #[tokio::test]
    async fn test_activate_and_terminate_agent() {
        let (controller, _mock) = controller_with_mock();

        controller.activate_agent("assistant").await.unwrap();
        assert!(controller.terminate_agent("assistant").await);
        // nothing live anymore
        assert!(!controller.terminate_agent("assistant").await);
    }
}
