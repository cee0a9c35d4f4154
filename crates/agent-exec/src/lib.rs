//! Agent execution layer
//!
//! This crate puts several distinct coding-agent backends (CLI-driven and
//! HTTP-driven) behind one execution contract: resolve a named profile,
//! spawn the backend, multiplex its output streams, and produce a single
//! terminal result plus an ordered event stream.

mod action;
mod cancel;
mod cli;
mod error;
mod event;
mod executor;
mod http;
mod process;
mod profile;

pub use action::{spawn, ExecutableAction, ScriptAction, ScriptLanguage};
pub use cancel::{cancellation, CancelHandle, CancelSignal};
pub use cli::CliAgentExecutor;
pub use error::{ExecutorError, Result};
pub use event::{ExecutionEvent, ExecutionEventKind};
pub use executor::{create_executor, AgentExecutor};
pub use http::HttpAgentExecutor;
pub use process::{ExitStatus, OutputStream, StreamedProcess};
pub use profile::{AgentConfig, BackendKind, ExecutorProfiles, ProfileEntry, ResolvedProfile};
