//! Executor profiles: named backend configurations and pure resolution
//!
//! A profile maps a label ("claude-code", "codex", ...) to a backend kind
//! and its configuration. Resolution merges backend defaults, the profile
//! entry, and per-call overrides (highest wins) and validates the result
//! before anything is spawned, so configuration errors never leave a
//! half-started process behind.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ExecutorError, Result};

/// Which backend family a profile invokes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Local CLI tool driven through the shell
    Cli,
    /// Remote HTTP API
    Http,
}

/// Configuration for one backend variant.
///
/// Every field is optional so that defaults, profile values, and per-call
/// overrides can be merged field-wise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// CLI command template; `{prompt}` is replaced with the shell-quoted
    /// prompt, `{model}` with the configured model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Model identifier passed to the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Base URL of an HTTP backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Credential for an HTTP backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Deadline in seconds; 0 or absent means no deadline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl AgentConfig {
    /// Overlay merge: any field set on `overlay` wins.
    pub fn merged_with(&self, overlay: &AgentConfig) -> AgentConfig {
        AgentConfig {
            command: overlay.command.clone().or_else(|| self.command.clone()),
            model: overlay.model.clone().or_else(|| self.model.clone()),
            base_url: overlay.base_url.clone().or_else(|| self.base_url.clone()),
            api_key: overlay.api_key.clone().or_else(|| self.api_key.clone()),
            timeout_seconds: overlay.timeout_seconds.or(self.timeout_seconds),
        }
    }

    /// Effective deadline, treating 0 as "no deadline"
    pub fn deadline(&self) -> Option<std::time::Duration> {
        self.timeout_seconds
            .filter(|secs| *secs > 0)
            .map(std::time::Duration::from_secs)
    }
}

/// One named profile entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileEntry {
    /// Backend family this profile invokes
    pub kind: BackendKind,
    /// Profile-level configuration, merged over backend defaults
    #[serde(default)]
    pub config: AgentConfig,
}

/// A backend kind plus its fully merged configuration
#[derive(Debug, Clone)]
pub struct ResolvedProfile {
    pub kind: BackendKind,
    pub config: AgentConfig,
}

/// Immutable set of named executor profiles, loaded once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutorProfiles {
    #[serde(default)]
    pub profiles: HashMap<String, ProfileEntry>,
}

impl ExecutorProfiles {
    /// Register a profile under a label (builder-style, for tests and
    /// programmatic setup)
    pub fn with_profile(mut self, label: impl Into<String>, entry: ProfileEntry) -> Self {
        self.profiles.insert(label.into(), entry);
        self
    }

    /// Resolve a label to a backend kind and merged configuration.
    ///
    /// Pure lookup and merge: no I/O, no side effects. Precedence,
    /// highest wins: per-call `overrides` > profile configuration >
    /// backend defaults. Fails with `ProfileNotFound` for an unknown
    /// label and `ConfigValidation` when a key the backend requires is
    /// missing after the merge.
    pub fn resolve(
        &self,
        label: &str,
        overrides: Option<&AgentConfig>,
    ) -> Result<ResolvedProfile> {
        let entry = self
            .profiles
            .get(label)
            .ok_or_else(|| ExecutorError::ProfileNotFound {
                label: label.to_string(),
            })?;

        let mut config = backend_defaults(entry.kind).merged_with(&entry.config);
        if let Some(overrides) = overrides {
            config = config.merged_with(overrides);
        }

        validate(entry.kind, &config)?;

        Ok(ResolvedProfile {
            kind: entry.kind,
            config,
        })
    }
}

fn backend_defaults(kind: BackendKind) -> AgentConfig {
    match kind {
        BackendKind::Cli => AgentConfig {
            // No deadline unless a profile sets one.
            timeout_seconds: Some(0),
            ..AgentConfig::default()
        },
        BackendKind::Http => AgentConfig {
            timeout_seconds: Some(0),
            ..AgentConfig::default()
        },
    }
}

fn validate(kind: BackendKind, config: &AgentConfig) -> Result<()> {
    match kind {
        BackendKind::Cli => {
            if config.command.as_deref().map_or(true, str::is_empty) {
                return Err(ExecutorError::config(
                    "cli backend requires a 'command' template",
                ));
            }
        }
        BackendKind::Http => {
            if config.base_url.as_deref().map_or(true, str::is_empty) {
                return Err(ExecutorError::config("http backend requires a 'base_url'"));
            }
        }
    }
    Ok(())
}
