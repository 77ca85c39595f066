// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Agentdesk Contributors

//! Code generation and sandboxed execution agent
//!
//! Owns a temporary working directory for the lifetime of the instance. All
//! file writes are scoped under it and spawned interpreters run inside it
//! with a hard timeout.

use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;
use tokio::process::Command;

use crate::agents::types::{AgentOutput, TaskContext};
use crate::agents::Agent;
use crate::error::{AgentDeskError, Result};

const DEFAULT_EXECUTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Agent that generates, analyzes, executes, and writes code
pub struct CoderAgent {
    workdir: Option<TempDir>,
    execution_timeout: Duration,
}

impl CoderAgent {
    pub fn new() -> Self {
        Self {
            workdir: None,
            execution_timeout: DEFAULT_EXECUTION_TIMEOUT,
        }
    }

    /// Override the execution timeout (tests use a short one)
    pub fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout = timeout;
        self
    }

    fn workdir(&self) -> Result<&Path> {
        self.workdir
            .as_ref()
            .map(TempDir::path)
            .ok_or_else(|| AgentDeskError::ResourceFailure("coder agent not initialized".to_string()))
    }

    fn extension_for(language: &str) -> &'static str {
        match language {
            "python" => "py",
            "javascript" => "js",
            "java" => "java",
            "bash" | "sh" => "sh",
            _ => "txt",
        }
    }

    fn command_for(language: &str, file: &Path) -> Vec<String> {
        let file = file.display().to_string();
        match language {
            "python" => vec!["python3".to_string(), file],
            "javascript" => vec!["node".to_string(), file],
            "java" => vec!["java".to_string(), file],
            "bash" | "sh" => vec!["sh".to_string(), file],
            other => vec![
                "echo".to_string(),
                format!("No execution support for {other}"),
            ],
        }
    }

    fn placeholder_for(language: &str, description: &str) -> String {
        match language {
            "python" => format!("# {description}\nprint(\"Hello from the coder agent\")\n"),
            "javascript" => {
                format!("// {description}\nconsole.log(\"Hello from the coder agent\");\n")
            }
            "java" => format!(
                "// {description}\npublic class Main {{\n    public static void main(String[] args) {{\n        System.out.println(\"Hello from the coder agent\");\n    }}\n}}\n"
            ),
            "bash" | "sh" => format!("# {description}\necho \"Hello from the coder agent\"\n"),
            _ => format!("// {description}\n"),
        }
    }

    fn generate(&self, task: &TaskContext) -> AgentOutput {
        let language = task.get_str("language").unwrap_or("python").to_lowercase();
        let description = task.get_str("content").unwrap_or("generated code");
        let code = Self::placeholder_for(&language, description);
        AgentOutput::success()
            .with_message(format!("Generated {language} code"))
            .with("language", language)
            .with("code", code)
    }

    fn analyze(&self, task: &TaskContext) -> AgentOutput {
        let content = task.get_str("content").unwrap_or("");
        let line_count = content.lines().count();
        let language = task.get_str("language").unwrap_or("unknown").to_lowercase();
        AgentOutput::success()
            .with_message(format!(
                "Analyzed {line_count} lines of {language} code"
            ))
            .with("language", language)
            .with("line_count", line_count)
            .with("char_count", content.len())
    }

    async fn execute(&self, task: &TaskContext) -> Result<AgentOutput> {
        let workdir = self.workdir()?;
        let language = task.get_str("language").unwrap_or("python").to_lowercase();
        let code = match task.get_str("code") {
            Some(code) => code,
            None => return Ok(AgentOutput::error("execute requires a 'code' field")),
        };

        let file = workdir.join(format!("code.{}", Self::extension_for(&language)));
        tokio::fs::write(&file, code).await?;

        let argv = Self::command_for(&language, &file);
        tracing::info!(language = %language, command = %argv[0], "executing code");

        let mut command = Command::new(&argv[0]);
        command
            .args(&argv[1..])
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.execution_timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Ok(AgentOutput::error(format!(
                    "failed to start '{}': {e}",
                    argv[0]
                )))
            }
            Err(_) => {
                return Ok(AgentOutput::error(format!(
                    "execution timed out after {}s",
                    self.execution_timeout.as_secs()
                )))
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let exit_code = output.status.code().unwrap_or(-1);

        let result = if output.status.success() {
            AgentOutput::success().with_message("execution finished")
        } else {
            AgentOutput::error(format!("process exited with code {exit_code}"))
        };
        Ok(result
            .with("stdout", stdout)
            .with("stderr", stderr)
            .with("exit_code", exit_code))
    }

    async fn write_file(&self, task: &TaskContext) -> Result<AgentOutput> {
        let workdir = self.workdir()?;
        let filename = match task.get_str("filename") {
            Some(name) => name,
            None => return Ok(AgentOutput::error("write_file requires a 'filename' field")),
        };
        let content = task.get_str("content").unwrap_or("");

        let relative = Path::new(filename);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, Component::ParentDir))
        {
            return Ok(AgentOutput::error(
                "filename must be relative and stay inside the working directory",
            ));
        }

        let target: PathBuf = workdir.join(relative);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, content).await?;

        tracing::debug!(path = %target.display(), bytes = content.len(), "file written");
        Ok(AgentOutput::success()
            .with_message(format!("wrote {filename}"))
            .with("path", target.display().to_string()))
    }
}

impl Default for CoderAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for CoderAgent {
    fn agent_type(&self) -> &str {
        "coder"
    }

    fn capabilities(&self) -> Vec<String> {
        vec![
            "code generation".to_string(),
            "code analysis".to_string(),
            "code execution".to_string(),
            "file writing".to_string(),
        ]
    }

    async fn initialize(&mut self) -> Result<()> {
        let workdir = TempDir::new()?;
        tracing::info!(path = %workdir.path().display(), "coder workspace created");
        self.workdir = Some(workdir);
        Ok(())
    }

    async fn process(&mut self, task: TaskContext) -> Result<AgentOutput> {
        match task.action.as_str() {
            "generate" => Ok(self.generate(&task)),
            "analyze" => Ok(self.analyze(&task)),
            "execute" => self.execute(&task).await,
            "write_file" => self.write_file(&task).await,
            other => Ok(AgentOutput::error(format!("unknown coder action '{other}'"))),
        }
    }

    async fn cleanup(&mut self) -> Result<()> {
        if let Some(workdir) = self.workdir.take() {
            if let Err(e) = workdir.close() {
                tracing::warn!(error = %e, "failed to remove coder workspace");
            }
        }
        Ok(())
    }

    fn workspace_layout(&self) -> serde_json::Value {
        json!({"panel": "editor", "show_output": true})
    }
}
