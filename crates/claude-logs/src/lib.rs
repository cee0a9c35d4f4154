//! Session log store for the Claude agent family
//!
//! The Claude CLI writes one JSONL transcript per session under
//! `<home>/.claude/projects/<encoded-worktree>/<session-id>.jsonl`. This
//! crate locates, lists, and parses those transcripts. The layout is owned
//! by the external tool: everything here is read-only, and parsing is
//! deliberately tolerant because the files are produced by a process we do
//! not control.

mod error;
mod message;
mod normalized;
mod path;
mod store;

pub use error::{LogError, Result};
pub use message::{ClaudeMessage, ContentBlock, MessageContent, MessageRole, ParseWarning};
pub use normalized::{normalized_entries, NormalizedEntry, NormalizedEntryType};
pub use path::encode_worktree_path;
pub use store::{ClaudeSessionData, SessionLogStore};
