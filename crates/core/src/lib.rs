//! Core library for agent-mux
//!
//! Shared types consumed by the execution layer:
//! - Execution context identifying one agent invocation
//! - Terminal execution results and outcomes
//! - Cross-platform shell helpers

pub mod context;
pub mod result;
pub mod shell;

pub use context::ExecutionContext;
pub use result::{ExecutionOutcome, ExecutionResult};
