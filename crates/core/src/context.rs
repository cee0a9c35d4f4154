//! Execution context for one agent invocation

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one invocation of an agent against a task attempt.
///
/// Created by the task layer, consumed read-only by the execution core.
/// Immutable for the lifetime of the invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Task this invocation belongs to
    pub task_id: Uuid,
    /// Attempt within the task
    pub attempt_id: Uuid,
    /// Worktree the agent executes in
    pub worktree_path: PathBuf,
    /// Root of the repository the worktree was created from
    pub project_path: PathBuf,
}

impl ExecutionContext {
    /// Create a new execution context
    pub fn new(
        task_id: Uuid,
        attempt_id: Uuid,
        worktree_path: impl Into<PathBuf>,
        project_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            task_id,
            attempt_id,
            worktree_path: worktree_path.into(),
            project_path: project_path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_creation() {
        let ctx = ExecutionContext::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "/tmp/worktrees/a",
            "/tmp/repo",
        );

        assert!(!ctx.task_id.is_nil());
        assert_eq!(ctx.worktree_path, PathBuf::from("/tmp/worktrees/a"));
        assert_eq!(ctx.project_path, PathBuf::from("/tmp/repo"));
    }
}
