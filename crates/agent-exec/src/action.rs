//! Executable actions and the platform process spawner

use std::path::Path;
use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::info;

use mux_core::shell::shell_command;
use mux_core::ExecutionContext;

use crate::error::Result;
use crate::process::StreamedProcess;

/// Source language of a script action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptLanguage {
    Bash,
}

/// A script to run through the platform shell
#[derive(Debug, Clone)]
pub struct ScriptAction {
    /// Script text, passed to the shell as a single argument
    pub script: String,
    /// Source language of the script
    pub language: ScriptLanguage,
    /// Context of the invocation this action belongs to
    pub context: ExecutionContext,
}

/// An invocable operation, described but not yet spawned.
///
/// Owns no resources until handed to [`spawn`].
#[derive(Debug, Clone)]
pub enum ExecutableAction {
    /// Run a script in the platform shell
    Script(ScriptAction),
}

impl ExecutableAction {
    /// Create a script action
    pub fn script(
        script: impl Into<String>,
        language: ScriptLanguage,
        context: ExecutionContext,
    ) -> Self {
        Self::Script(ScriptAction {
            script: script.into(),
            language,
            context,
        })
    }
}

/// Spawn an action in the given working directory.
///
/// Fails with `ExecutorError::Spawn` if the OS cannot create the process
/// (missing interpreter, permission denied, invalid working directory).
pub fn spawn(action: &ExecutableAction, current_dir: &Path) -> Result<StreamedProcess> {
    match action {
        ExecutableAction::Script(script) => spawn_script(script, current_dir),
    }
}

fn spawn_script(action: &ScriptAction, current_dir: &Path) -> Result<StreamedProcess> {
    let (shell, flag) = shell_command();

    info!(
        "Spawning {} {} script in {:?}",
        shell,
        flag,
        current_dir
    );

    let mut cmd = Command::new(shell);
    cmd.arg(flag)
        .arg(&action.script)
        .current_dir(current_dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // Isolate the child in its own process group so kill() can take down
    // the whole tree, not just the shell.
    #[cfg(unix)]
    cmd.process_group(0);
    #[cfg(windows)]
    cmd.creation_flags(0x0000_0200); // CREATE_NEW_PROCESS_GROUP

    StreamedProcess::spawn_command(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn test_context() -> ExecutionContext {
        ExecutionContext::new(Uuid::new_v4(), Uuid::new_v4(), "/tmp", "/tmp")
    }

    #[tokio::test]
    async fn test_spawn_script_action() {
        let action = ExecutableAction::script("echo hi", ScriptLanguage::Bash, test_context());
        let process = spawn(&action, Path::new(".")).unwrap();

        let (status, output, _) = process.wait_with_output().await.unwrap();
        assert_eq!(status.code(), 0);
        assert_eq!(output, "hi\n");
    }

    #[tokio::test]
    async fn test_spawn_in_invalid_directory_fails() {
        let action = ExecutableAction::script("echo hi", ScriptLanguage::Bash, test_context());
        let err = spawn(&action, Path::new("/definitely/not/a/dir")).unwrap_err();

        assert!(matches!(err, crate::error::ExecutorError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_script_runs_in_current_dir() {
        let dir = tempfile::tempdir().unwrap();
        let action = ExecutableAction::script("pwd", ScriptLanguage::Bash, test_context());
        let process = spawn(&action, dir.path()).unwrap();

        let (status, output, _) = process.wait_with_output().await.unwrap();
        assert_eq!(status.code(), 0);
        let reported = std::fs::canonicalize(output.trim()).unwrap();
        let expected = std::fs::canonicalize(dir.path()).unwrap();
        assert_eq!(reported, expected);
    }
}
