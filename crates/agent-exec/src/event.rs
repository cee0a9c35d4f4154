//! Typed execution event stream
//!
//! Callers consume one ordered queue of events per invocation instead of
//! registering listeners: incremental Log/Progress events followed by
//! exactly one terminal Finished event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mux_core::{ExecutionContext, ExecutionResult};

use crate::process::OutputStream;

/// One event in the ordered stream produced during execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionEvent {
    /// Unique event ID
    pub id: Uuid,

    /// Task this event belongs to
    pub task_id: Uuid,

    /// Attempt this event belongs to
    pub attempt_id: Uuid,

    /// Timestamp
    pub timestamp: DateTime<Utc>,

    /// The event payload
    #[serde(flatten)]
    pub payload: ExecutionEventKind,
}

/// Payload of an execution event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum ExecutionEventKind {
    /// One line of agent output
    Log {
        stream: OutputStream,
        content: String,
    },

    /// Coarse progress update
    Progress {
        message: String,
        percentage: Option<f32>,
    },

    /// Terminal result; emitted exactly once per invocation
    Finished { result: ExecutionResult },
}

impl ExecutionEvent {
    /// Create a new execution event
    pub fn new(context: &ExecutionContext, payload: ExecutionEventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id: context.task_id,
            attempt_id: context.attempt_id,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Create a log event
    pub fn log(context: &ExecutionContext, stream: OutputStream, content: String) -> Self {
        Self::new(context, ExecutionEventKind::Log { stream, content })
    }

    /// Create a progress event
    pub fn progress(
        context: &ExecutionContext,
        message: impl Into<String>,
        percentage: Option<f32>,
    ) -> Self {
        Self::new(
            context,
            ExecutionEventKind::Progress {
                message: message.into(),
                percentage,
            },
        )
    }

    /// Create a terminal result event
    pub fn finished(context: &ExecutionContext, result: ExecutionResult) -> Self {
        Self::new(context, ExecutionEventKind::Finished { result })
    }
}
