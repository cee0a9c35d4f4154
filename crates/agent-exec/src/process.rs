//! Streamed process handle with concurrently pumped output
//!
//! Both output pipes are pumped by their own background task from the
//! moment of spawn. Reading one stream can therefore never block on the
//! other filling its OS pipe buffer while the child blocks writing to it.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{ExecutorError, Result};

/// Capacity of each per-stream line channel
const STREAM_CHANNEL_CAPACITY: usize = 1024;

/// Identifies which output stream a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

/// How a streamed process terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Process exited with a code
    Code(i32),
    /// Process was terminated by a signal (unix)
    Signaled,
}

impl ExitStatus {
    /// Exit code; signal exits report -1
    pub fn code(&self) -> i32 {
        match self {
            Self::Code(code) => *code,
            Self::Signaled => -1,
        }
    }

    /// Whether the process exited 0
    pub fn success(&self) -> bool {
        matches!(self, Self::Code(0))
    }
}

/// Runtime handle for one spawned action.
///
/// Owns the child process and two line-oriented output channels. At most
/// one process handle is alive per instance; `kill_on_drop` guarantees the
/// process table entry is released even when the handle is dropped on an
/// error path.
#[derive(Debug)]
pub struct StreamedProcess {
    child: Child,
    pid: Option<u32>,
    stdout_rx: Option<mpsc::Receiver<String>>,
    stderr_rx: Option<mpsc::Receiver<String>>,
    stdout_task: JoinHandle<()>,
    stderr_task: JoinHandle<()>,
}

impl StreamedProcess {
    /// Spawn the prepared command and start both output pumps.
    ///
    /// The command must have stdout and stderr piped.
    pub(crate) fn spawn_command(mut cmd: Command) -> Result<Self> {
        let mut child = cmd.spawn().map_err(|e| {
            ExecutorError::spawn_failed_with_source(format!("Failed to spawn process: {e}"), e)
        })?;

        let pid = child.id();

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExecutorError::spawn_failed("Failed to capture stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ExecutorError::spawn_failed("Failed to capture stderr"))?;

        let (stdout_tx, stdout_rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let (stderr_tx, stderr_rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);

        let stdout_task = tokio::spawn(pump_lines(stdout, stdout_tx, OutputStream::Stdout));
        let stderr_task = tokio::spawn(pump_lines(stderr, stderr_tx, OutputStream::Stderr));

        Ok(Self {
            child,
            pid,
            stdout_rx: Some(stdout_rx),
            stderr_rx: Some(stderr_rx),
            stdout_task,
            stderr_task,
        })
    }

    /// OS process id, when the process is still attached
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Take the stdout line channel (can only be taken once).
    ///
    /// A caller that takes a channel must keep draining it until it closes;
    /// channels left untaken are discarded when `wait` is called.
    pub fn take_stdout(&mut self) -> Option<mpsc::Receiver<String>> {
        self.stdout_rx.take()
    }

    /// Take the stderr line channel (can only be taken once)
    pub fn take_stderr(&mut self) -> Option<mpsc::Receiver<String>> {
        self.stderr_rx.take()
    }

    /// Wait for the process to exit and both pumps to finish.
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        // Drop untaken channels so a full buffer cannot wedge a pump.
        self.stdout_rx.take();
        self.stderr_rx.take();

        let status = self.child.wait().await?;

        let _ = (&mut self.stdout_task).await;
        let _ = (&mut self.stderr_task).await;

        Ok(match status.code() {
            Some(code) => ExitStatus::Code(code),
            None => ExitStatus::Signaled,
        })
    }

    /// Drain both streams to completion, then wait for exit.
    ///
    /// Returns the exit status together with the full stdout and stderr
    /// captures, each line-joined with trailing newlines.
    pub async fn wait_with_output(mut self) -> Result<(ExitStatus, String, String)> {
        let mut stdout_rx = self
            .take_stdout()
            .ok_or_else(|| ExecutorError::Stream {
                message: "stdout channel already taken".to_string(),
            })?;
        let mut stderr_rx = self
            .take_stderr()
            .ok_or_else(|| ExecutorError::Stream {
                message: "stderr channel already taken".to_string(),
            })?;

        let mut output = String::new();
        let mut stderr_output = String::new();
        let mut stdout_done = false;
        let mut stderr_done = false;

        while !stdout_done || !stderr_done {
            tokio::select! {
                line = stdout_rx.recv(), if !stdout_done => {
                    match line {
                        Some(line) => {
                            output.push_str(&line);
                            output.push('\n');
                        }
                        None => stdout_done = true,
                    }
                }
                line = stderr_rx.recv(), if !stderr_done => {
                    match line {
                        Some(line) => {
                            stderr_output.push_str(&line);
                            stderr_output.push('\n');
                        }
                        None => stderr_done = true,
                    }
                }
            }
        }

        let status = self.wait().await?;
        Ok((status, output, stderr_output))
    }

    /// Kill the entire process tree rooted at the spawned process, then
    /// stop both pumps.
    ///
    /// On unix the child was placed in its own process group at spawn, so
    /// the group as a whole receives SIGTERM followed by SIGKILL. On
    /// Windows the tree is terminated via `taskkill /T /F`.
    pub async fn kill(&mut self) -> Result<()> {
        if let Some(pid) = self.pid {
            kill_process_tree(pid).await;
        }

        // Reap the direct child and release the pipe handles.
        let _ = self.child.kill().await;
        self.stdout_task.abort();
        self.stderr_task.abort();
        Ok(())
    }
}

#[cfg(unix)]
async fn kill_process_tree(pid: u32) {
    // Negative pid targets the whole process group created at spawn.
    unsafe {
        libc::kill(-(pid as i32), libc::SIGTERM);
    }
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    unsafe {
        libc::kill(-(pid as i32), libc::SIGKILL);
    }
}

#[cfg(windows)]
async fn kill_process_tree(pid: u32) {
    let _ = Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/T", "/F"])
        .output()
        .await;
}

/// Pump one pipe line-by-line into its channel until EOF or read error.
///
/// A read error closes only this stream; the invocation completes with the
/// output captured so far.
async fn pump_lines<R>(reader: R, tx: mpsc::Sender<String>, stream: OutputStream)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                debug!("{}: {}", stream.as_str(), line);
                if tx.send(line).await.is_err() {
                    debug!("{} channel closed, stopping pump", stream.as_str());
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("{} read error: {}", stream.as_str(), e);
                break;
            }
        }
    }
}
