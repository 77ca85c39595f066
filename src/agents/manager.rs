// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Agentdesk Contributors

//! Agent registry and lifecycle manager
//!
//! Owns every live agent instance. Guarantees at most one live instance per
//! agent type, serializes creation and initialization per type, and never
//! dispatches to an instance whose `initialize` has not completed.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::Mutex as AsyncMutex;

use crate::agents::types::{AgentOutput, TaskContext};
use crate::agents::{Agent, AssistantAgent, CoderAgent, ComputerAgent};
use crate::config::Settings;
use crate::error::{AgentDeskError, Result};
use crate::events::EventBus;

/// Factory producing a fresh, uninitialized agent instance
pub type AgentFactory = Box<dyn Fn() -> Box<dyn Agent> + Send + Sync>;

struct ActiveAgent {
    agent: Box<dyn Agent>,
    initialized: bool,
}

/// Registry of agent factories plus the table of live instances
pub struct AgentManager {
    bus: Arc<EventBus>,
    registry: std::sync::Mutex<HashMap<String, AgentFactory>>,
    active: AsyncMutex<HashMap<String, Arc<AsyncMutex<ActiveAgent>>>>,
}

impl AgentManager {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            bus,
            registry: std::sync::Mutex::new(HashMap::new()),
            active: AsyncMutex::new(HashMap::new()),
        }
    }

    /// Build a manager with the built-in variants registered per settings
    pub fn with_defaults(bus: Arc<EventBus>, settings: &Settings) -> Self {
        let manager = Self::new(bus);
        if settings.agents.assistant.enabled {
            manager.register("assistant", Box::new(|| Box::new(AssistantAgent::new())));
        }
        if settings.agents.coder.enabled {
            manager.register("coder", Box::new(|| Box::new(CoderAgent::new())));
        }
        if settings.agents.computer.enabled {
            let computer = settings.agents.computer.clone();
            manager.register(
                "computer",
                Box::new(move || Box::new(ComputerAgent::from_settings(&computer))),
            );
        }
        manager
    }

    /// Register a factory for an agent type
    ///
    /// Re-registering a known type replaces the factory; the existing live
    /// instance, if any, keeps running until terminated.
    pub fn register(&self, agent_type: &str, factory: AgentFactory) {
        let mut registry = self.lock_registry();
        if registry.insert(agent_type.to_string(), factory).is_some() {
            tracing::warn!(agent_type, "agent factory replaced");
        } else {
            tracing::debug!(agent_type, "agent factory registered");
        }
    }

    /// Registered agent types, sorted
    pub fn list_registered(&self) -> Vec<String> {
        let mut types: Vec<String> = self.lock_registry().keys().cloned().collect();
        types.sort();
        types
    }

    /// Agent types with a live instance, sorted
    pub async fn list_active(&self) -> Vec<String> {
        let mut types: Vec<String> = self.active.lock().await.keys().cloned().collect();
        types.sort();
        types
    }

    /// Dispatch one task to the named agent type
    ///
    /// Creates and initializes an instance if none is live; initialization is
    /// awaited to completion before the task is processed. An instance whose
    /// variant requests auto-termination is terminated after this one task.
    pub async fn dispatch(&self, agent_type: &str, task: TaskContext) -> Result<AgentOutput> {
        let instance = self.get_or_create(agent_type).await?;
        let mut guard = instance.lock().await;

        if !guard.initialized {
            if let Err(e) = guard.agent.initialize().await {
                drop(guard);
                self.remove_instance(agent_type, &instance).await;
                tracing::error!(agent_type, error = %e, "agent initialization failed");
                return Err(e);
            }
            guard.initialized = true;
            self.bus
                .publish("agent_initialized", json!({"agent_type": agent_type}))
                .await;
        }

        tracing::debug!(agent_type, action = %task.action, "dispatching task");
        let output = guard.agent.process(task).await?;
        let auto = guard.agent.auto_terminate();
        drop(guard);

        if auto {
            self.terminate(agent_type).await;
        }
        Ok(output)
    }

    /// Create and initialize an instance without dispatching a task
    pub async fn activate(&self, agent_type: &str) -> Result<()> {
        let instance = self.get_or_create(agent_type).await?;
        let mut guard = instance.lock().await;

        if !guard.initialized {
            if let Err(e) = guard.agent.initialize().await {
                drop(guard);
                self.remove_instance(agent_type, &instance).await;
                tracing::error!(agent_type, error = %e, "agent initialization failed");
                return Err(e);
            }
            guard.initialized = true;
            self.bus
                .publish("agent_initialized", json!({"agent_type": agent_type}))
                .await;
        }
        Ok(())
    }

    /// Forward a UI event to the live instance of an agent type
    ///
    /// Unlike `dispatch`, this never creates an instance: it fails with
    /// `NoActiveInstance` when nothing is live. `Ok(None)` means the agent
    /// chose not to handle the event.
    pub async fn ui_event(
        &self,
        agent_type: &str,
        event: &str,
        payload: &Value,
    ) -> Result<Option<Value>> {
        let instance = { self.active.lock().await.get(agent_type).cloned() };
        let instance = instance
            .ok_or_else(|| AgentDeskError::NoActiveInstance(agent_type.to_string()))?;
        let mut guard = instance.lock().await;
        Ok(guard.agent.handle_ui_event(event, payload))
    }

    /// Terminate the live instance of an agent type
    ///
    /// Returns false if no instance was live. Cleanup failures are logged
    /// and swallowed; the instance is removed either way.
    pub async fn terminate(&self, agent_type: &str) -> bool {
        let instance = { self.active.lock().await.remove(agent_type) };
        let Some(instance) = instance else {
            return false;
        };

        let mut guard = instance.lock().await;
        if guard.initialized {
            if let Err(e) = guard.agent.cleanup().await {
                tracing::warn!(agent_type, error = %e, "agent cleanup failed");
            }
        }
        drop(guard);

        self.bus
            .publish("agent_terminated", json!({"agent_type": agent_type}))
            .await;
        tracing::info!(agent_type, "agent terminated");
        true
    }

    /// Terminate every live instance
    pub async fn terminate_all(&self) {
        let types: Vec<String> = { self.active.lock().await.keys().cloned().collect() };
        for agent_type in types {
            self.terminate(&agent_type).await;
        }
    }

    async fn get_or_create(&self, agent_type: &str) -> Result<Arc<AsyncMutex<ActiveAgent>>> {
        let mut active = self.active.lock().await;
        if let Some(instance) = active.get(agent_type) {
            return Ok(Arc::clone(instance));
        }

        let agent = {
            let registry = self.lock_registry();
            let factory = registry
                .get(agent_type)
                .ok_or_else(|| AgentDeskError::UnknownAgentType(agent_type.to_string()))?;
            factory()
        };

        let instance = Arc::new(AsyncMutex::new(ActiveAgent {
            agent,
            initialized: false,
        }));
        active.insert(agent_type.to_string(), Arc::clone(&instance));
        tracing::debug!(agent_type, "agent instance created");
        Ok(instance)
    }

    /// Remove a specific instance, leaving any replacement in place
    async fn remove_instance(&self, agent_type: &str, instance: &Arc<AsyncMutex<ActiveAgent>>) {
        let mut active = self.active.lock().await;
        if let Some(existing) = active.get(agent_type) {
            if Arc::ptr_eq(existing, instance) {
                active.remove(agent_type);
            }
        }
    }

    fn lock_registry(&self) -> std::sync::MutexGuard<'_, HashMap<String, AgentFactory>> {
        match self.registry.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
