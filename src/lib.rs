// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Agentdesk Contributors

//! # agentdesk
//!
//! Core library of a desktop AI-agent application: agent lifecycle and
//! dispatch, an LLM provider abstraction with retry and intent routing, a
//! publish/subscribe event bus, and a JSON settings layer. The GUI shell is
//! a separate consumer of this crate; it drives the [`AppController`] and
//! listens on the [`events::EventBus`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use agentdesk::config::Settings;
//! use agentdesk::controller::{AppController, SubmitOutcome};
//!
//! # async fn run() -> agentdesk::Result<()> {
//! let settings = Settings::load()?;
//! let controller = AppController::new(&settings);
//!
//! match controller.submit_input("write a hello world in python").await {
//!     SubmitOutcome::Direct { content } => println!("{content}"),
//!     SubmitOutcome::Agent { agent_type, result, .. } => {
//!         println!("handled by {agent_type}: {:?}", result.status)
//!     }
//!     SubmitOutcome::Error { message } => eprintln!("{message}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod agents;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod llm;

pub use controller::{AppController, SubmitOutcome};
pub use error::{AgentDeskError, ProviderError, Result};
