//! Agent executor capability set and backend dispatch

use async_trait::async_trait;
use tokio::sync::mpsc;

use mux_core::{ExecutionContext, ExecutionResult};

use crate::cancel::CancelSignal;
use crate::cli::CliAgentExecutor;
use crate::error::Result;
use crate::event::ExecutionEvent;
use crate::http::HttpAgentExecutor;
use crate::profile::{BackendKind, ResolvedProfile};

/// Uniform execution contract over distinct agent backends.
///
/// Implementations resolve their configuration up front, spawn or call the
/// backend, forward ordered [`ExecutionEvent`]s, and return one terminal
/// result. Terminal outcomes (non-zero exit, timeout, cancel) are reported
/// through the result, not as errors; `Err` is reserved for failures that
/// prevent or abort the invocation itself.
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// Configuration keys this backend needs before `execute` can proceed
    fn required_config(&self) -> &'static [&'static str];

    /// Run one prompt in the given context.
    ///
    /// Incremental output is sent through `events`; the returned result is
    /// also emitted as a final `Finished` event. The invocation resolves
    /// promptly when `cancel` fires, carrying partial output.
    async fn execute(
        &self,
        prompt: &str,
        context: &ExecutionContext,
        events: mpsc::Sender<ExecutionEvent>,
        cancel: CancelSignal,
    ) -> Result<ExecutionResult>;
}

/// Build the executor for a resolved profile.
///
/// One `{kind, config}` record dispatched through this factory keeps call
/// sites uniform across backend families.
pub fn create_executor(profile: ResolvedProfile) -> Box<dyn AgentExecutor> {
    match profile.kind {
        BackendKind::Cli => Box::new(CliAgentExecutor::new(profile.config)),
        BackendKind::Http => Box::new(HttpAgentExecutor::new(profile.config)),
    }
}
