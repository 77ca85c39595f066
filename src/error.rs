// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Agentdesk Contributors

//! Error types for agentdesk
//!
//! This module defines all error types used throughout the core.

use thiserror::Error;

/// Main error type for agentdesk operations
#[derive(Error, Debug)]
pub enum AgentDeskError {
    /// Dispatch to an agent type that was never registered
    #[error("Unknown agent type: {0}")]
    UnknownAgentType(String),

    /// An operation that requires a live instance found none
    #[error("No active agent of type: {0}")]
    NoActiveInstance(String),

    /// Provider-related errors
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Agent-internal execution failure (nonzero exit, bad action)
    #[error("Execution failed: {0}")]
    ExecutionFailure(String),

    /// Filesystem or subprocess setup failure
    #[error("Resource failure: {0}")]
    ResourceFailure(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Provider-specific error classification
///
/// Every adapter maps its backend failures into one of these three buckets;
/// the orchestrator's retry loop only ever retries `Transient`.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Backend client cannot be used at all (missing credentials, unsupported provider)
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// Network/timeout/rate-limit failure that may resolve on retry
    #[error("Transient provider failure: {0}")]
    Transient(String),

    /// Bad request, auth failure, quota - retrying will not help
    #[error("Permanent provider failure: {0}")]
    Permanent(String),
}

/// Result type alias for agentdesk operations
pub type Result<T> = std::result::Result<T, AgentDeskError>;

impl AgentDeskError {
    /// True if the underlying cause is a retryable provider failure
    pub fn is_transient(&self) -> bool {
        matches!(self, AgentDeskError::Provider(ProviderError::Transient(_)))
    }
}
