// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Agentdesk Contributors

//! Guarded filesystem and shell access agent
//!
//! Keeps a cursor directory, starts it at the user's home, and confines
//! `cd`/`list_files`/`read_file` to an allow-list of directory trees. A
//! deny-list of command substrings is checked before anything is spawned.

use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::agents::types::{AgentOutput, TaskContext};
use crate::agents::Agent;
use crate::config::ComputerSettings;
use crate::error::{AgentDeskError, Result};

const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);
/// Hard cap on `read_file` payloads
const MAX_READ_BYTES: u64 = 1024 * 1024;

/// Agent that runs shell commands and browses the filesystem
pub struct ComputerAgent {
    cursor: PathBuf,
    allowed: Vec<PathBuf>,
    restricted: Vec<String>,
    command_timeout: Duration,
}

impl ComputerAgent {
    pub fn new() -> Self {
        Self::from_settings(&ComputerSettings::default())
    }

    pub fn from_settings(settings: &ComputerSettings) -> Self {
        Self {
            cursor: PathBuf::new(),
            allowed: settings
                .allowed_directories
                .iter()
                .map(PathBuf::from)
                .collect(),
            restricted: settings
                .restricted_commands
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Override the command timeout (tests use a short one)
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Current cursor directory
    pub fn cursor(&self) -> &Path {
        &self.cursor
    }

    /// Fold `.` and `..` components without touching the filesystem
    ///
    /// Purely lexical so it works for paths whose targets do not exist yet.
    fn normalize(path: &Path) -> PathBuf {
        let mut out = PathBuf::new();
        for component in path.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    out.pop();
                }
                other => out.push(other),
            }
        }
        out
    }

    /// Resolve user input against `~` and the cursor
    fn resolve(&self, input: &str) -> PathBuf {
        let expanded = if input == "~" {
            dirs::home_dir().unwrap_or_else(|| self.cursor.clone())
        } else if let Some(rest) = input.strip_prefix("~/") {
            dirs::home_dir()
                .unwrap_or_else(|| self.cursor.clone())
                .join(rest)
        } else {
            let path = Path::new(input);
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                self.cursor.join(path)
            }
        };
        Self::normalize(&expanded)
    }

    fn is_allowed(&self, path: &Path) -> bool {
        self.allowed.iter().any(|root| path.starts_with(root))
    }

    fn rejected_by_denylist(&self, command: &str) -> bool {
        let lower = command.to_lowercase();
        self.restricted.iter().any(|bad| lower.contains(bad))
    }

    fn change_directory(&mut self, argument: &str) -> AgentOutput {
        let target = if argument.is_empty() {
            dirs::home_dir().unwrap_or_else(|| self.cursor.clone())
        } else {
            self.resolve(argument)
        };

        if !self.is_allowed(&target) {
            return AgentOutput::error(format!(
                "directory not allowed: {}",
                target.display()
            ));
        }
        if !target.is_dir() {
            return AgentOutput::error(format!("no such directory: {}", target.display()));
        }

        self.cursor = target;
        tracing::debug!(cwd = %self.cursor.display(), "cursor moved");
        AgentOutput::success()
            .with_message(format!("changed directory to {}", self.cursor.display()))
            .with("cwd", self.cursor.display().to_string())
    }

    /// Non-executing acknowledgment for routed model replies
    ///
    /// Model prose is never run as a shell command; only an explicit
    /// `command` payload reaches `execute_command`.
    fn describe_request(&self, task: &TaskContext) -> AgentOutput {
        let content = task.get_str("content").unwrap_or("");
        AgentOutput::success()
            .with_message(
                "No command was executed; pass an explicit 'command' field to run one",
            )
            .with("content", content)
            .with("cwd", self.cursor.display().to_string())
    }

    async fn execute_command(&mut self, task: &TaskContext) -> Result<AgentOutput> {
        let command = match task.get_str("command") {
            Some(command) => command.trim().to_string(),
            None => return Ok(AgentOutput::error("execute_command requires a 'command' field")),
        };

        if self.rejected_by_denylist(&command) {
            tracing::warn!(command = %command, "command rejected by deny-list");
            return Ok(AgentOutput::error("Command rejected for security reasons"));
        }

        // cd mutates agent state instead of spawning a shell
        if command == "cd" {
            return Ok(self.change_directory(""));
        }
        if let Some(argument) = command.strip_prefix("cd ") {
            return Ok(self.change_directory(argument.trim()));
        }

        tracing::info!(command = %command, cwd = %self.cursor.display(), "executing command");
        let mut shell = Command::new("sh");
        shell
            .arg("-c")
            .arg(&command)
            .current_dir(&self.cursor)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.command_timeout, shell.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(AgentDeskError::ResourceFailure(format!(
                    "failed to spawn shell: {e}"
                )))
            }
            Err(_) => {
                return Ok(AgentOutput::error(format!(
                    "command timed out after {}s",
                    self.command_timeout.as_secs()
                )))
            }
        };

        let exit_code = output.status.code().unwrap_or(-1);
        let result = if output.status.success() {
            AgentOutput::success()
        } else {
            AgentOutput::error(format!("command exited with code {exit_code}"))
        };
        Ok(result
            .with("stdout", String::from_utf8_lossy(&output.stdout).to_string())
            .with("stderr", String::from_utf8_lossy(&output.stderr).to_string())
            .with("exit_code", exit_code)
            .with("cwd", self.cursor.display().to_string()))
    }

    async fn list_files(&self, task: &TaskContext) -> Result<AgentOutput> {
        let target = match task.get_str("path") {
            Some(path) => self.resolve(path),
            None => self.cursor.clone(),
        };
        if !self.is_allowed(&target) {
            return Ok(AgentOutput::error(format!(
                "directory not allowed: {}",
                target.display()
            )));
        }

        let mut read_dir = tokio::fs::read_dir(&target).await?;
        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let metadata = entry.metadata().await?;
            let modified = metadata
                .modified()
                .ok()
                .map(|t| DateTime::<Utc>::from(t).to_rfc3339());
            entries.push(json!({
                "name": entry.file_name().to_string_lossy(),
                "path": entry.path().display().to_string(),
                "size": metadata.len(),
                "modified": modified,
                "is_directory": metadata.is_dir(),
            }));
        }
        entries.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));

        Ok(AgentOutput::success()
            .with_message(format!("{} entries", entries.len()))
            .with("path", target.display().to_string())
            .with("entries", entries))
    }

    async fn read_file(&self, task: &TaskContext) -> Result<AgentOutput> {
        let path = match task.get_str("path") {
            Some(path) => self.resolve(path),
            None => return Ok(AgentOutput::error("read_file requires a 'path' field")),
        };
        if !self.is_allowed(&path) {
            return Ok(AgentOutput::error(format!(
                "path not allowed: {}",
                path.display()
            )));
        }
        if path.is_dir() {
            return Ok(AgentOutput::error(format!(
                "{} is a directory",
                path.display()
            )));
        }

        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) => return Ok(AgentOutput::error(format!("cannot open file: {e}"))),
        };
        let total_size = file.metadata().await?.len();

        let mut buffer = Vec::new();
        file.take(MAX_READ_BYTES).read_to_end(&mut buffer).await?;
        let truncated = total_size > MAX_READ_BYTES;
        if truncated {
            // the cap can land mid-codepoint; drop the partial sequence
            // instead of mangling it into a replacement character
            if let Err(e) = std::str::from_utf8(&buffer) {
                if e.error_len().is_none() {
                    buffer.truncate(e.valid_up_to());
                }
            }
        }
        let content = String::from_utf8_lossy(&buffer).to_string();
        let shown = content.len();

        let mut out = AgentOutput::success()
            .with("path", path.display().to_string())
            .with("content", content)
            .with("size", total_size)
            .with("truncated", truncated);
        if truncated {
            out = out.with_message(format!(
                "file is {total_size} bytes, showing the first {shown}"
            ));
        }
        Ok(out)
    }
}

impl Default for ComputerAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for ComputerAgent {
    fn agent_type(&self) -> &str {
        "computer"
    }

    fn capabilities(&self) -> Vec<String> {
        vec![
            "command execution".to_string(),
            "file listing".to_string(),
            "file reading".to_string(),
        ]
    }

    async fn initialize(&mut self) -> Result<()> {
        let home = dirs::home_dir()
            .ok_or_else(|| AgentDeskError::Config("cannot determine home directory".to_string()))?;
        // the home tree is always allowed so the initial cursor is usable
        if !self.allowed.contains(&home) {
            self.allowed.push(home.clone());
        }
        self.cursor = home;
        tracing::info!(cwd = %self.cursor.display(), "computer agent ready");
        Ok(())
    }

    async fn process(&mut self, task: TaskContext) -> Result<AgentOutput> {
        match task.action.as_str() {
            "execute_command" => self.execute_command(&task).await,
            "process" => Ok(self.describe_request(&task)),
            "list_files" => self.list_files(&task).await,
            "read_file" => self.read_file(&task).await,
            other => Ok(AgentOutput::error(format!(
                "unknown computer action '{other}'"
            ))),
        }
    }

    async fn cleanup(&mut self) -> Result<()> {
        Ok(())
    }

    fn workspace_layout(&self) -> serde_json::Value {
        json!({"panel": "terminal", "show_file_browser": true})
    }

    fn handle_ui_event(
        &mut self,
        event: &str,
        _payload: &serde_json::Value,
    ) -> Option<serde_json::Value> {
        match event {
            "query_cwd" => Some(json!({"cwd": self.cursor.display().to_string()})),
            _ => None,
        }
    }
}
