//! Cancellation plumbing for in-flight invocations

use tokio::sync::oneshot;

/// Create a linked cancel handle/signal pair.
///
/// The handle side belongs to the caller; the signal side is passed into
/// `AgentExecutor::execute`.
pub fn cancellation() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = oneshot::channel();
    (CancelHandle { tx }, CancelSignal { rx })
}

/// Caller-side handle that cancels one in-flight invocation
pub struct CancelHandle {
    tx: oneshot::Sender<()>,
}

impl CancelHandle {
    /// Request cancellation. The invocation resolves with a `Cancelled`
    /// outcome carrying partial output.
    pub fn cancel(self) {
        let _ = self.tx.send(());
    }
}

/// Executor-side signal observed during execution
pub struct CancelSignal {
    rx: oneshot::Receiver<()>,
}

impl CancelSignal {
    /// Resolves when an explicit cancel is requested.
    ///
    /// If the handle is dropped without cancelling, this pends forever so
    /// that a dropped handle never reads as a cancellation.
    pub async fn cancelled(self) {
        match self.rx.await {
            Ok(()) => {}
            Err(_) => std::future::pending().await,
        }
    }
}
