//! Terminal execution results

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Terminal classification of one invocation.
///
/// Non-success variants are outcomes, not transport errors: each is
/// produced together with whatever output was captured before the
/// invocation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// Process exited 0 / backend reported completion
    Success,
    /// Process exited with a non-zero code
    NonZeroExit { code: i32 },
    /// Deadline elapsed and the invocation was terminated
    Timeout { seconds: u64 },
    /// Explicitly cancelled by the caller
    Cancelled,
    /// Backend failed mid-flight (stream dropped, backend error report)
    Failed { message: String },
}

impl ExecutionOutcome {
    /// Whether this outcome represents success
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Terminal outcome of one invocation. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// How the invocation ended
    pub outcome: ExecutionOutcome,
    /// Captured output; partial when the outcome is not Success
    pub output: String,
    /// Error detail accompanying a non-success outcome
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Files the invocation produced, if the backend reports them
    #[serde(default)]
    pub artifacts: Vec<PathBuf>,
}

impl ExecutionResult {
    /// Successful result with captured output
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            outcome: ExecutionOutcome::Success,
            output: output.into(),
            error: None,
            artifacts: Vec::new(),
        }
    }

    /// Non-zero exit carrying partial output
    pub fn non_zero_exit(code: i32, output: impl Into<String>, error: Option<String>) -> Self {
        Self {
            outcome: ExecutionOutcome::NonZeroExit { code },
            output: output.into(),
            error,
            artifacts: Vec::new(),
        }
    }

    /// Deadline elapsed; carries partial output
    pub fn timeout(seconds: u64, output: impl Into<String>) -> Self {
        Self {
            outcome: ExecutionOutcome::Timeout { seconds },
            output: output.into(),
            error: Some(format!("execution timed out after {seconds} seconds")),
            artifacts: Vec::new(),
        }
    }

    /// Explicit cancellation; carries partial output
    pub fn cancelled(output: impl Into<String>) -> Self {
        Self {
            outcome: ExecutionOutcome::Cancelled,
            output: output.into(),
            error: None,
            artifacts: Vec::new(),
        }
    }

    /// Mid-flight failure; carries partial output
    pub fn failed(message: impl Into<String>, output: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            outcome: ExecutionOutcome::Failed {
                message: message.clone(),
            },
            output: output.into(),
            error: Some(message),
            artifacts: Vec::new(),
        }
    }

    /// Whether the invocation succeeded
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_result() {
        let result = ExecutionResult::success("done\n");
        assert!(result.is_success());
        assert_eq!(result.output, "done\n");
        assert!(result.error.is_none());
    }

    #[test]
    fn test_non_zero_exit_keeps_partial_output() {
        let result = ExecutionResult::non_zero_exit(2, "partial", None);
        assert!(!result.is_success());
        assert_eq!(result.outcome, ExecutionOutcome::NonZeroExit { code: 2 });
        assert_eq!(result.output, "partial");
    }

    #[test]
    fn test_timeout_carries_detail() {
        let result = ExecutionResult::timeout(30, "some output");
        assert_eq!(result.outcome, ExecutionOutcome::Timeout { seconds: 30 });
        assert!(result.error.as_deref().unwrap().contains("30 seconds"));
        assert_eq!(result.output, "some output");
    }

    #[test]
    fn test_cancelled_is_distinct_from_timeout() {
        let cancelled = ExecutionResult::cancelled("");
        assert_eq!(cancelled.outcome, ExecutionOutcome::Cancelled);
        assert_ne!(
            cancelled.outcome,
            ExecutionOutcome::Timeout { seconds: 0 },
        );
    }
}
