//! CLI-driven agent executor
//!
//! Renders a command template into a shell script action, spawns it in the
//! context's worktree, and forwards output lines as ordered Log events.
//! Exit code 0 is success; everything else resolves to a terminal outcome
//! carrying whatever output was captured.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;

use mux_core::{ExecutionContext, ExecutionResult};

use crate::action::{spawn, ExecutableAction, ScriptLanguage};
use crate::cancel::CancelSignal;
use crate::error::{ExecutorError, Result};
use crate::event::ExecutionEvent;
use crate::executor::AgentExecutor;
use crate::process::OutputStream;
use crate::profile::AgentConfig;

/// Executor for locally installed CLI agents (claude, codex, gemini, ...)
pub struct CliAgentExecutor {
    config: AgentConfig,
}

impl CliAgentExecutor {
    /// Create an executor from a resolved configuration
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    /// Render the command template into the script to run.
    ///
    /// `{prompt}` is replaced with the shell-quoted prompt; when the
    /// template has no placeholder the quoted prompt is appended.
    fn render_script(&self, prompt: &str) -> Result<String> {
        let template = self
            .config
            .command
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ExecutorError::config("cli backend requires a 'command' template"))?;

        let mut script = template.to_string();

        if script.contains("{model}") {
            let model = self
                .config
                .model
                .as_deref()
                .ok_or_else(|| ExecutorError::config("command template uses {model} but no model is configured"))?;
            script = script.replace("{model}", model);
        }

        let quoted = shell_words::quote(prompt);
        if script.contains("{prompt}") {
            script = script.replace("{prompt}", &quoted);
        } else {
            script.push(' ');
            script.push_str(&quoted);
        }

        Ok(script)
    }
}

#[async_trait]
impl AgentExecutor for CliAgentExecutor {
    fn name(&self) -> &str {
        "cli"
    }

    fn required_config(&self) -> &'static [&'static str] {
        &["command"]
    }

    async fn execute(
        &self,
        prompt: &str,
        context: &ExecutionContext,
        events: mpsc::Sender<ExecutionEvent>,
        cancel: CancelSignal,
    ) -> Result<ExecutionResult> {
        let script = self.render_script(prompt)?;
        info!(
            "Executing CLI agent for task {} attempt {}",
            context.task_id, context.attempt_id
        );

        let action = ExecutableAction::script(script, ScriptLanguage::Bash, context.clone());
        let mut process = spawn(&action, &context.worktree_path)?;

        let _ = events
            .send(ExecutionEvent::progress(context, "agent started", Some(0.1)))
            .await;

        let mut stdout_rx = process
            .take_stdout()
            .ok_or(ExecutorError::ChannelClosed)?;
        let mut stderr_rx = process
            .take_stderr()
            .ok_or(ExecutorError::ChannelClosed)?;

        let mut output = String::new();
        let mut stderr_output = String::new();
        let mut stdout_done = false;
        let mut stderr_done = false;

        let deadline = self.config.deadline();
        let timed_out = async {
            match deadline {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(timed_out);
        let cancelled = cancel.cancelled();
        tokio::pin!(cancelled);

        while !stdout_done || !stderr_done {
            tokio::select! {
                line = stdout_rx.recv(), if !stdout_done => match line {
                    Some(line) => {
                        output.push_str(&line);
                        output.push('\n');
                        let _ = events
                            .send(ExecutionEvent::log(context, OutputStream::Stdout, line))
                            .await;
                    }
                    None => stdout_done = true,
                },
                line = stderr_rx.recv(), if !stderr_done => match line {
                    Some(line) => {
                        stderr_output.push_str(&line);
                        stderr_output.push('\n');
                        let _ = events
                            .send(ExecutionEvent::log(context, OutputStream::Stderr, line))
                            .await;
                    }
                    None => stderr_done = true,
                },
                () = &mut cancelled => {
                    process.kill().await?;
                    let result = ExecutionResult::cancelled(output);
                    let _ = events.send(ExecutionEvent::finished(context, result.clone())).await;
                    return Ok(result);
                }
                () = &mut timed_out => {
                    process.kill().await?;
                    let seconds = self.config.timeout_seconds.unwrap_or_default();
                    let result = ExecutionResult::timeout(seconds, output);
                    let _ = events.send(ExecutionEvent::finished(context, result.clone())).await;
                    return Ok(result);
                }
            }
        }

        let status = process.wait().await?;

        let result = if status.success() {
            ExecutionResult::success(output)
        } else {
            let error = Some(stderr_output.trim_end().to_string()).filter(|e| !e.is_empty());
            ExecutionResult::non_zero_exit(status.code(), output, error)
        };

        let _ = events
            .send(ExecutionEvent::finished(context, result.clone()))
            .await;
        Ok(result)
    }
}
