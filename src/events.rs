// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Agentdesk Contributors

//! Process-wide publish/subscribe event bus
//!
//! Components communicate progress and configuration changes through named
//! events rather than direct references. Handlers for the same event fire in
//! subscription order; a failing handler is logged and never prevents the
//! remaining handlers from running.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::Result;

/// Payload carried by every event
pub type EventPayload = Value;

type Handler = Arc<dyn Fn(String, EventPayload) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Token returned by `subscribe`, used to unsubscribe later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Application-wide event bus
#[derive(Default)]
pub struct EventBus {
    next_id: AtomicU64,
    handlers: Mutex<HashMap<String, Vec<(SubscriptionId, Handler)>>>,
}

impl EventBus {
    /// Create a new empty event bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a handler to an event name
    ///
    /// The handler receives the event name and payload as owned values so it
    /// can move them into spawned work.
    pub fn subscribe<F, Fut>(&self, event: &str, handler: F) -> SubscriptionId
    where
        F: Fn(String, EventPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let boxed: Handler = Arc::new(move |event, payload| {
            Box::pin(handler(event, payload)) as BoxFuture<'static, Result<()>>
        });

        let mut handlers = self.lock_handlers();
        handlers
            .entry(event.to_string())
            .or_default()
            .push((id, boxed));
        tracing::debug!(event, "handler subscribed");
        id
    }

    /// Remove a previously registered handler
    ///
    /// Unsubscribing an unknown id is a no-op, not an error.
    pub fn unsubscribe(&self, event: &str, id: SubscriptionId) {
        let mut handlers = self.lock_handlers();
        if let Some(list) = handlers.get_mut(event) {
            list.retain(|(existing, _)| *existing != id);
            tracing::debug!(event, "handler unsubscribed");
        }
    }

    /// Publish an event to all current subscribers
    ///
    /// Handlers run sequentially in subscription order. A handler failure is
    /// logged and swallowed so the remaining handlers still run.
    pub async fn publish(&self, event: &str, payload: EventPayload) {
        let snapshot: Vec<Handler> = {
            let handlers = self.lock_handlers();
            match handlers.get(event) {
                Some(list) => list.iter().map(|(_, h)| Arc::clone(h)).collect(),
                None => return,
            }
        };

        tracing::debug!(event, subscribers = snapshot.len(), "publishing event");
        for handler in snapshot {
            if let Err(e) = handler(event.to_string(), payload.clone()).await {
                tracing::error!(event, error = %e, "event handler failed");
            }
        }
    }

    /// Number of handlers currently subscribed to an event
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.lock_handlers().get(event).map_or(0, Vec::len)
    }

    fn lock_handlers(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<String, Vec<(SubscriptionId, Handler)>>> {
        match self.handlers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("event bus handler map lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentDeskError;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = hits.clone();

        bus.subscribe("ping", move |_event, _payload| {
            let hits = hits_clone.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        bus.publish("ping", json!({})).await;
        bus.publish("ping", json!({})).await;

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let bus = EventBus::new();
        bus.publish("nobody_listens", json!({"x": 1})).await;
    }

    #[tokio::test]
    async fn test_handlers_fire_in_subscription_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for label in ["first", "second", "third"] {
            let order = order.clone();
            bus.subscribe("ordered", move |_e, _p| {
                let order = order.clone();
                async move {
                    order.lock().unwrap().push(label);
                    Ok(())
                }
            });
        }

        bus.publish("ordered", json!(null)).await;
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_block_others() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        bus.subscribe("evt", |_e, _p| async {
            Err(AgentDeskError::Config("broken handler".to_string()))
        });

        let hits_clone = hits.clone();
        bus.subscribe("evt", move |_e, _p| {
            let hits = hits_clone.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        bus.publish("evt", json!({})).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_removes_handler() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = hits.clone();

        let id = bus.subscribe("evt", move |_e, _p| {
            let hits = hits_clone.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        bus.publish("evt", json!({})).await;
        bus.unsubscribe("evt", id);
        bus.publish("evt", json!({})).await;

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscriber_count("evt"), 0);
    }

    #[test]
    fn test_unsubscribe_unknown_id_is_noop() {
        let bus = EventBus::new();
        bus.subscribe("evt", |_e, _p| async { Ok(()) });
        bus.unsubscribe("evt", SubscriptionId(999));
        bus.unsubscribe("never_subscribed", SubscriptionId(0));
        assert_eq!(bus.subscriber_count("evt"), 1);
    }

    #[tokio::test]
    async fn test_handler_receives_event_name_and_payload() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();

        bus.subscribe("config_updated", move |event, payload| {
            let seen = seen_clone.clone();
            async move {
                *seen.lock().unwrap() = Some((event, payload));
                Ok(())
            }
        });

        bus.publish("config_updated", json!({"llm": {"provider": "openai"}}))
            .await;

        let guard = seen.lock().unwrap();
        let (event, payload) = guard.as_ref().unwrap();
        assert_eq!(event, "config_updated");
        assert_eq!(payload["llm"]["provider"], "openai");
    }
}
