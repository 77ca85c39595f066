// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Agentdesk Contributors

//! Settings document
//!
//! JSON file at `~/AIAgentApp/config.json`. Every field carries a default so
//! a partial or missing file still yields a usable configuration.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AgentDeskError, Result};

/// Top-level settings document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: AppSettings,
    pub llm: LlmSettings,
    pub agents: AgentsSettings,
    pub ui: UiSettings,
}

/// Application-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub theme: String,
    pub max_history: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "AI Agent App".to_string(),
            theme: "dark".to_string(),
            max_history: 10,
        }
    }
}

/// LLM provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Default provider for requests that do not override it
    pub provider: String,
    pub model: String,
    /// OpenAI API key; empty means not configured
    pub api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub mistral_api_key: Option<String>,
    pub deepseek_api_key: Option<String>,
    pub temperature: f32,
    /// Known models per provider, for UI pickers
    pub models: HashMap<String, Vec<String>>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        let mut models = HashMap::new();
        models.insert(
            "openai".to_string(),
            vec!["gpt-4".to_string(), "gpt-3.5-turbo".to_string()],
        );
        models.insert(
            "anthropic".to_string(),
            vec![
                "claude-3-opus-20240229".to_string(),
                "claude-3-sonnet-20240229".to_string(),
            ],
        );
        models.insert(
            "gemini".to_string(),
            vec![
                "gemini-1.5-pro".to_string(),
                "gemini-1.5-flash".to_string(),
            ],
        );
        models.insert(
            "mistral".to_string(),
            vec![
                "mistral-large-latest".to_string(),
                "mistral-small-latest".to_string(),
            ],
        );
        models.insert(
            "deepseek".to_string(),
            vec!["deepseek-chat".to_string(), "deepseek-reasoner".to_string()],
        );
        models.insert(
            "ollama".to_string(),
            vec!["llama3".to_string(), "mistral".to_string()],
        );

        Self {
            provider: "openai".to_string(),
            model: "gpt-4".to_string(),
            api_key: None,
            anthropic_api_key: None,
            gemini_api_key: None,
            mistral_api_key: None,
            deepseek_api_key: None,
            temperature: 0.7,
            models,
        }
    }
}

/// Per-agent settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentsSettings {
    pub coder: CoderSettings,
    pub computer: ComputerSettings,
    pub assistant: AssistantSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoderSettings {
    pub enabled: bool,
    pub languages: Vec<String>,
}

impl Default for CoderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            languages: vec![
                "python".to_string(),
                "javascript".to_string(),
                "java".to_string(),
                "bash".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputerSettings {
    pub enabled: bool,
    /// Directories the computer agent may enter and read; the home directory
    /// is always allowed in addition to these
    pub allowed_directories: Vec<String>,
    /// Substrings that reject a command before it is spawned
    pub restricted_commands: Vec<String>,
}

impl Default for ComputerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_directories: Vec::new(),
            restricted_commands: vec![
                "rm -rf".to_string(),
                "format".to_string(),
                "del /f".to_string(),
                "deltree".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantSettings {
    pub enabled: bool,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// UI preferences, persisted for the desktop shell
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    pub font_size: u32,
    pub split_sizes: Vec<u32>,
    pub editor_theme: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            font_size: 12,
            split_sizes: vec![700, 300],
            editor_theme: "monokai".to_string(),
        }
    }
}

impl Settings {
    /// Default settings path: `~/AIAgentApp/config.json`
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| AgentDeskError::Config("cannot determine home directory".to_string()))?;
        Ok(home.join("AIAgentApp").join("config.json"))
    }

    /// Load settings from the default path, falling back to defaults if the
    /// file does not exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load settings from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        tracing::debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    /// Save settings to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path()?)
    }

    /// Save settings to an explicit path, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        tracing::debug!(path = %path.display(), "settings saved");
        Ok(())
    }

    /// API key configured for a provider, if any
    pub fn api_key_for(&self, provider: &str) -> Option<&str> {
        let key = match provider {
            "openai" => self.llm.api_key.as_deref(),
            "anthropic" => self.llm.anthropic_api_key.as_deref(),
            "gemini" => self.llm.gemini_api_key.as_deref(),
            "mistral" => self.llm.mistral_api_key.as_deref(),
            "deepseek" => self.llm.deepseek_api_key.as_deref(),
            _ => None,
        };
        key.filter(|k| !k.is_empty())
    }
}
