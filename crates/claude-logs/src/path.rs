//! Worktree path encoding
//!
//! The Claude CLI names each per-project transcript directory after the
//! project path it ran in: the canonical absolute path with every
//! separator replaced by a hyphen. On macOS the tool canonicalizes
//! through `/private`, so that prefix is part of the naming convention.

/// Fixed marker prefix the external tool canonicalizes paths through
const MARKER_PREFIX: &str = "/private";

/// Encode an absolute attempt directory path into the transcript
/// directory name used by the external tool.
///
/// The marker prefix is prepended unless the path already carries it
/// (applied at most once), then every path separator becomes a hyphen,
/// including the leading one.
///
/// The encoding is one-directional: a path containing literal hyphens is
/// not unambiguously recoverable from the encoded key. That is the
/// external tool's convention, reproduced as-is. Callers apply the
/// encoding exactly once, to the raw path, never to an already-encoded
/// key.
pub fn encode_worktree_path(path: &std::path::Path) -> String {
    let raw = path.to_string_lossy();
    let prefixed = if raw.starts_with(MARKER_PREFIX) {
        raw.into_owned()
    } else {
        format!("{MARKER_PREFIX}{raw}")
    };

    prefixed
        .chars()
        .map(|c| if c == '/' || c == '\\' { '-' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_encoding_replaces_every_separator() {
        let encoded = encode_worktree_path(Path::new("/tmp/worktrees/task-a"));
        assert_eq!(encoded, "-private-tmp-worktrees-task-a");
    }

    #[test]
    fn test_marker_prefix_applied_at_most_once() {
        let bare = encode_worktree_path(Path::new("/tmp/wt"));
        let prefixed = encode_worktree_path(Path::new("/private/tmp/wt"));
        assert_eq!(bare, prefixed);
        assert!(!prefixed.starts_with("-private-private"));
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let a = encode_worktree_path(Path::new("/home/dev/proj"));
        let b = encode_worktree_path(Path::new("/home/dev/proj"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_hyphenated_paths_collide() {
        // Known, accepted limitation: literal hyphens are
        // indistinguishable from encoded separators.
        let a = encode_worktree_path(Path::new("/tmp/task-a"));
        let b = encode_worktree_path(Path::new("/tmp/task/a"));
        assert_eq!(a, b);
    }
}
