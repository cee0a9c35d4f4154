//! Session log store
//!
//! Locates and reads per-worktree transcripts. All operations are
//! read-only against files the external agent process may still be
//! appending to; a session created mid-listing may or may not appear in
//! that call's result.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::error::{LogError, Result};
use crate::message::{normalize_line, ClaudeMessage, ParseWarning};
use crate::path::encode_worktree_path;

/// Transcript file extension used by the external tool
const TRANSCRIPT_EXTENSION: &str = "jsonl";

/// A parsed session transcript.
///
/// Read-only reconstruction of an external file, never persisted back.
#[derive(Debug, Clone)]
pub struct ClaudeSessionData {
    /// Session id (the transcript's basename without extension)
    pub session_id: String,
    /// Worktree the session ran in
    pub worktree_path: PathBuf,
    /// Transcript file this data was read from
    pub file_path: PathBuf,
    /// Messages in transcript order
    pub messages: Vec<ClaudeMessage>,
    /// Non-fatal anomalies recorded during the read
    pub warnings: Vec<ParseWarning>,
}

/// Locates, lists, and parses an agent family's on-disk transcripts.
///
/// The base directory is injected at construction so the store can be
/// pointed at a fixture tree in tests instead of reading an OS global at
/// call time.
#[derive(Debug, Clone)]
pub struct SessionLogStore {
    base_dir: PathBuf,
}

impl SessionLogStore {
    /// Store rooted at an explicit base directory
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Store rooted at the external tool's default location,
    /// `<home>/.claude/projects`
    pub fn from_home_dir() -> Option<Self> {
        let base_dirs = directories::BaseDirs::new()?;
        Some(Self::new(
            base_dirs.home_dir().join(".claude").join("projects"),
        ))
    }

    /// Transcript directory for one attempt worktree
    fn sessions_dir(&self, attempt_dir: &Path) -> PathBuf {
        self.base_dir.join(encode_worktree_path(attempt_dir))
    }

    /// List session ids recorded for a worktree, in discovery order.
    ///
    /// A missing directory means no session has been created yet and
    /// yields an empty list, never an error.
    pub fn list_sessions(&self, attempt_dir: &Path) -> Vec<String> {
        let dir = self.sessions_dir(attempt_dir);

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| is_transcript(path))
            .filter_map(|path| {
                path.file_stem()
                    .map(|stem| stem.to_string_lossy().to_string())
            })
            .collect()
    }

    /// Read one session transcript for a worktree.
    ///
    /// With an explicit `session_id` the exact transcript is read, failing
    /// with `SessionNotFound` when absent. Without one, the most recently
    /// modified transcript wins (ties broken by filename order); an absent
    /// or empty directory fails with `NoSessionsFound`.
    pub fn read_session_logs(
        &self,
        attempt_dir: &Path,
        session_id: Option<&str>,
    ) -> Result<ClaudeSessionData> {
        let dir = self.sessions_dir(attempt_dir);

        let file_path = match session_id {
            Some(id) => {
                let path = dir.join(format!("{id}.{TRANSCRIPT_EXTENSION}"));
                if !path.is_file() {
                    return Err(LogError::SessionNotFound {
                        session_id: id.to_string(),
                        path,
                    });
                }
                path
            }
            None => latest_transcript(&dir)?,
        };

        let session_id = file_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();

        let (messages, warnings) = parse_transcript(&file_path)?;

        debug!(
            "Read {} messages ({} warnings) from {:?}",
            messages.len(),
            warnings.len(),
            file_path
        );

        Ok(ClaudeSessionData {
            session_id,
            worktree_path: attempt_dir.to_path_buf(),
            file_path,
            messages,
            warnings,
        })
    }
}

fn is_transcript(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext == TRANSCRIPT_EXTENSION)
}

/// Pick the transcript with the greatest modification timestamp; equal
/// timestamps fall back to lexicographic filename order so the choice is
/// deterministic.
fn latest_transcript(dir: &Path) -> Result<PathBuf> {
    let entries = fs::read_dir(dir).map_err(|_| LogError::NoSessionsFound {
        dir: dir.to_path_buf(),
    })?;

    let mut newest: Option<(SystemTime, PathBuf)> = None;

    for entry in entries.filter_map(|entry| entry.ok()) {
        let path = entry.path();
        if !is_transcript(&path) {
            continue;
        }

        let modified = entry
            .metadata()
            .and_then(|meta| meta.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let candidate_wins = match &newest {
            None => true,
            Some((best_time, best_path)) => {
                modified > *best_time
                    || (modified == *best_time && path.file_name() > best_path.file_name())
            }
        };
        if candidate_wins {
            newest = Some((modified, path));
        }
    }

    newest
        .map(|(_, path)| path)
        .ok_or_else(|| LogError::NoSessionsFound {
            dir: dir.to_path_buf(),
        })
}

/// Decode a transcript line by line.
///
/// Undecodable lines record a warning and are skipped; decodable lines
/// matching no recognized shape are metadata and dropped silently. A read
/// never aborts because of one bad line.
fn parse_transcript(path: &Path) -> Result<(Vec<ClaudeMessage>, Vec<ParseWarning>)> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut messages = Vec::new();
    let mut warnings = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;

        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warnings.push(ParseWarning {
                    line_number,
                    reason: format!("unreadable line: {e}"),
                });
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let value: serde_json::Value = match serde_json::from_str(&line) {
            Ok(value) => value,
            Err(e) => {
                warn!("Skipping malformed line {} in {:?}: {}", line_number, path, e);
                warnings.push(ParseWarning {
                    line_number,
                    reason: format!("invalid JSON: {e}"),
                });
                continue;
            }
        };

        if let Some(message) = normalize_line(&value) {
            messages.push(message);
        }
    }

    Ok((messages, warnings))
}
