// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Agentdesk Contributors

//! Integration tests for the LLM stack: real adapters over wiremock,
//! orchestrator retry behavior, and event emission.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use agentdesk::events::EventBus;
use agentdesk::llm::providers::OpenAiAdapter;
use agentdesk::llm::{
    ChatTurn, CompletionOverrides, LlmOrchestrator, ProviderAdapter, RetryConfig,
};

fn orchestrator_over(server_uri: &str, bus: Arc<EventBus>) -> LlmOrchestrator {
    let adapter = OpenAiAdapter::new(Some("sk-test".to_string())).with_base_url(server_uri);
    let mut adapters: HashMap<String, Arc<dyn ProviderAdapter>> = HashMap::new();
    adapters.insert("openai".to_string(), Arc::new(adapter));

    LlmOrchestrator::with_adapters(bus, adapters, "openai", "gpt-4", 0.7).with_retry_config(
        RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(10),
        },
    )
}

#[tokio::test]
async fn orchestrator_retries_server_errors_until_success() {
    let server = MockServer::start().await;

    // two failures, then a success
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "recovered"}}],
            "usage": {"prompt_tokens": 1, "completion_tokens": 1, "total_tokens": 2}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let bus = Arc::new(EventBus::new());
    let orchestrator = orchestrator_over(&server.uri(), bus);

    let response = orchestrator
        .complete(vec![ChatTurn::user("hi")], CompletionOverrides::default())
        .await
        .unwrap();

    assert_eq!(response.content, "recovered");
    assert_eq!(response.usage.total_tokens, 2);
}

#[tokio::test]
async fn orchestrator_gives_up_after_three_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down"))
        .expect(3)
        .mount(&server)
        .await;

    let bus = Arc::new(EventBus::new());
    let errors = Arc::new(AtomicUsize::new(0));
    let errors_clone = errors.clone();
    bus.subscribe("request_error", move |_e, _p| {
        let errors = errors_clone.clone();
        async move {
            errors.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    });

    let orchestrator = orchestrator_over(&server.uri(), bus);
    let result = orchestrator
        .complete(vec![ChatTurn::user("hi")], CompletionOverrides::default())
        .await;

    assert!(result.is_err());
    assert_eq!(errors.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn auth_failure_fails_fast_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .expect(1)
        .mount(&server)
        .await;

    let bus = Arc::new(EventBus::new());
    let orchestrator = orchestrator_over(&server.uri(), bus);
    let result = orchestrator
        .complete(vec![ChatTurn::user("hi")], CompletionOverrides::default())
        .await;

    assert!(result.is_err());
    assert!(!result.unwrap_err().is_transient());
}

#[tokio::test]
async fn lifecycle_events_bracket_each_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "ok"}}]
        })))
        .mount(&server)
        .await;

    let bus = Arc::new(EventBus::new());
    let log = Arc::new(std::sync::Mutex::new(Vec::new()));
    for event in ["request_start", "request_complete", "request_error"] {
        let log = log.clone();
        bus.subscribe(event, move |event, _payload| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(event);
                Ok(())
            }
        });
    }

    let orchestrator = orchestrator_over(&server.uri(), bus);
    orchestrator
        .complete(vec![ChatTurn::user("hi")], CompletionOverrides::default())
        .await
        .unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec!["request_start".to_string(), "request_complete".to_string()]
    );
}
