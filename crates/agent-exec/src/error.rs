//! Error types for agent-exec

use thiserror::Error;

/// Result type alias for executor operations
pub type Result<T> = std::result::Result<T, ExecutorError>;

/// Errors that can occur while resolving, spawning, or driving a backend.
///
/// Terminal outcomes (non-zero exit, timeout, cancellation) are not errors;
/// they are reported as `ExecutionOutcome` variants carrying partial output.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The OS could not create the process
    #[error("Failed to spawn process: {message}")]
    Spawn {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// An output stream failed mid-read; the invocation completes with
    /// whatever was captured before the failure
    #[error("Output stream error: {message}")]
    Stream { message: String },

    /// No profile registered under the requested label
    #[error("Profile not found: {label}")]
    ProfileNotFound { label: String },

    /// Resolved configuration is missing a key the backend requires
    #[error("Invalid configuration: {message}")]
    ConfigValidation { message: String },

    /// Missing or invalid credential, detected before any call is made
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// Network-level failure talking to an HTTP backend
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Non-2xx status or unexpected response payload shape
    #[error("Backend protocol error: {message}")]
    Protocol {
        status: Option<u16>,
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Event channel closed
    #[error("Event channel closed")]
    ChannelClosed,
}

impl ExecutorError {
    /// Create a Spawn error
    pub fn spawn_failed(message: impl Into<String>) -> Self {
        Self::Spawn {
            message: message.into(),
            source: None,
        }
    }

    /// Create a Spawn error with source
    pub fn spawn_failed_with_source(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a ConfigValidation error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Create a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a Protocol error
    pub fn protocol(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Protocol {
            status,
            message: message.into(),
        }
    }
}
