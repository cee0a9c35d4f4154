//! Error types for claude-logs

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for log store operations
pub type Result<T> = std::result::Result<T, LogError>;

/// Errors that can occur while reading session transcripts.
///
/// `SessionNotFound` and `NoSessionsFound` are deliberately distinct:
/// the former is a hard miss for an explicitly requested session id, the
/// latter the expected "no session yet" state when no id was given.
#[derive(Debug, Error)]
pub enum LogError {
    /// An explicitly requested session transcript does not exist
    #[error("Session not found: {session_id} (expected at {path:?})")]
    SessionNotFound { session_id: String, path: PathBuf },

    /// No transcript exists yet for this worktree
    #[error("No sessions found in {dir:?}")]
    NoSessionsFound { dir: PathBuf },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
