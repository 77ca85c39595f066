// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Agentdesk Contributors

//! Configuration management
//!
//! Settings live in a JSON document under the user's home directory and are
//! loaded once at startup; `config_updated` events carry changes to running
//! components.

pub mod settings;

pub use settings::{
    AgentsSettings, AppSettings, AssistantSettings, CoderSettings, ComputerSettings, LlmSettings,
    Settings, UiSettings,
};

/// Initialize tracing with an env-filter subscriber
///
/// Filter defaults to `info` for this crate; override with `RUST_LOG`.
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("agentdesk=info,warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .ok();
}
