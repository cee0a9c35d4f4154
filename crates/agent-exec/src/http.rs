//! HTTP-driven agent executor
//!
//! Talks to a remote agent worker over HTTP: one POST per invocation, with
//! progress streamed back as `data:`-framed JSON events. Failures are
//! classified into Auth (before the call), Transport (network level), and
//! Protocol (unexpected status or payload); partial streamed content is
//! always preserved.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

use mux_core::{ExecutionContext, ExecutionResult};

use crate::cancel::CancelSignal;
use crate::error::{ExecutorError, Result};
use crate::event::ExecutionEvent;
use crate::executor::AgentExecutor;
use crate::process::OutputStream;
use crate::profile::AgentConfig;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteRequest<'a> {
    task_id: String,
    attempt_id: String,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

/// Executor for HTTP-API-driven agent backends
pub struct HttpAgentExecutor {
    config: AgentConfig,
    client: Client,
}

impl HttpAgentExecutor {
    /// Create an executor from a resolved configuration
    pub fn new(config: AgentConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl AgentExecutor for HttpAgentExecutor {
    fn name(&self) -> &str {
        "http"
    }

    fn required_config(&self) -> &'static [&'static str] {
        &["base_url", "api_key"]
    }

    async fn execute(
        &self,
        prompt: &str,
        context: &ExecutionContext,
        events: mpsc::Sender<ExecutionEvent>,
        cancel: CancelSignal,
    ) -> Result<ExecutionResult> {
        let base_url = self
            .config
            .base_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ExecutorError::config("http backend requires a 'base_url'"))?;

        // Credential check happens before any request leaves the process.
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ExecutorError::Auth {
                message: "missing api key".to_string(),
            })?;

        let directory = context.worktree_path.to_string_lossy();
        let url = format!(
            "{}/execute?directory={}",
            base_url.trim_end_matches('/'),
            urlencoding::encode(&directory)
        );

        let request = ExecuteRequest {
            task_id: context.task_id.to_string(),
            attempt_id: context.attempt_id.to_string(),
            prompt,
            model: self.config.model.as_deref(),
        };

        info!("Sending execution request to {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .header("Accept", "text/event-stream")
            .json(&request)
            .send()
            .await
            .map_err(|e| ExecutorError::transport(format!("failed to reach backend: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExecutorError::protocol(
                Some(status.as_u16()),
                format!("backend returned {status}: {body}"),
            ));
        }

        let _ = events
            .send(ExecutionEvent::progress(context, "agent started", Some(0.1)))
            .await;

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();
        let mut output = String::new();

        let deadline = self.config.deadline();
        let timed_out = async {
            match deadline {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(timed_out);
        let cancelled = cancel.cancelled();
        tokio::pin!(cancelled);

        loop {
            tokio::select! {
                () = &mut cancelled => {
                    // Dropping the stream aborts the in-flight call.
                    let result = ExecutionResult::cancelled(output);
                    let _ = events.send(ExecutionEvent::finished(context, result.clone())).await;
                    return Ok(result);
                }
                () = &mut timed_out => {
                    let seconds = self.config.timeout_seconds.unwrap_or_default();
                    let result = ExecutionResult::timeout(seconds, output);
                    let _ = events.send(ExecutionEvent::finished(context, result.clone())).await;
                    return Ok(result);
                }
                chunk = stream.next() => {
                    let chunk: bytes::Bytes = match chunk {
                        None => break,
                        Some(Ok(bytes)) => bytes,
                        Some(Err(e)) => {
                            let result = ExecutionResult::failed(
                                format!("transport error mid-stream: {e}"),
                                output,
                            );
                            let _ = events
                                .send(ExecutionEvent::finished(context, result.clone()))
                                .await;
                            return Ok(result);
                        }
                    };

                    buffer.push_str(&String::from_utf8_lossy(&chunk));

                    while let Some(idx) = buffer.find("\n\n") {
                        let frame: String = buffer.drain(..idx + 2).collect();
                        if let Some(result) =
                            handle_frame(frame.trim(), context, &events, &mut output).await
                        {
                            let _ = events
                                .send(ExecutionEvent::finished(context, result.clone()))
                                .await;
                            return Ok(result);
                        }
                    }
                }
            }
        }

        // Stream ended without a terminal status frame.
        let result = ExecutionResult::failed(
            "event stream ended without a terminal status",
            output,
        );
        let _ = events
            .send(ExecutionEvent::finished(context, result.clone()))
            .await;
        Ok(result)
    }
}

/// Process one `data:` frame; returns the terminal result when the frame
/// carries a final status.
async fn handle_frame(
    frame: &str,
    context: &ExecutionContext,
    events: &mpsc::Sender<ExecutionEvent>,
    output: &mut String,
) -> Option<ExecutionResult> {
    let data = frame.strip_prefix("data: ")?;
    let json: serde_json::Value = match serde_json::from_str(data) {
        Ok(json) => json,
        Err(e) => {
            debug!("Skipping malformed event frame: {}", e);
            return None;
        }
    };

    match json["type"].as_str() {
        Some("log") => {
            if let Some(content) = json["content"].as_str() {
                output.push_str(content);
                output.push('\n');
                let _ = events
                    .send(ExecutionEvent::log(
                        context,
                        OutputStream::Stdout,
                        content.to_string(),
                    ))
                    .await;
            }
            None
        }
        Some("progress") => {
            let message = json["message"].as_str().unwrap_or_default().to_string();
            let percentage = json["percentage"].as_f64().map(|p| p as f32);
            let _ = events
                .send(ExecutionEvent::progress(context, message, percentage))
                .await;
            None
        }
        Some("status") => match json["status"].as_str() {
            Some("completed") => Some(ExecutionResult::success(std::mem::take(output))),
            Some("failed") => {
                let message = json
                    .get("error")
                    .and_then(|v| v.as_str())
                    .unwrap_or("backend reported failure");
                Some(ExecutionResult::failed(message, std::mem::take(output)))
            }
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::cancellation;
    use mux_core::ExecutionOutcome;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use uuid::Uuid;

    fn test_context() -> ExecutionContext {
        ExecutionContext::new(Uuid::new_v4(), Uuid::new_v4(), "/tmp/wt", "/tmp/repo")
    }

    fn executor(base_url: Option<String>, api_key: Option<&str>) -> HttpAgentExecutor {
        HttpAgentExecutor::new(AgentConfig {
            base_url,
            api_key: api_key.map(str::to_string),
            ..AgentConfig::default()
        })
    }

    /// Serve a single canned HTTP response on an ephemeral port.
    async fn serve_once(response: &'static str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 8192];
            let _ = sock.read(&mut buf).await;
            sock.write_all(response.as_bytes()).await.unwrap();
            let _ = sock.shutdown().await;
        });

        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_missing_api_key_is_auth_error_without_request() {
        // Unroutable base_url: if a request were attempted it would fail as
        // Transport, so an Auth error proves the pre-call check fired.
        let exec = executor(Some("http://127.0.0.1:1".to_string()), None);
        let (events_tx, _events_rx) = mpsc::channel(10);
        let (_handle, signal) = cancellation();

        let err = exec
            .execute("x", &test_context(), events_tx, signal)
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutorError::Auth { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let exec = executor(Some("http://127.0.0.1:1".to_string()), Some("key"));
        let (events_tx, _events_rx) = mpsc::channel(10);
        let (_handle, signal) = cancellation();

        let err = exec
            .execute("x", &test_context(), events_tx, signal)
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutorError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_non_2xx_is_protocol_error() {
        let url = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 4\r\nconnection: close\r\n\r\noops",
        )
        .await;
        let exec = executor(Some(url), Some("key"));
        let (events_tx, _events_rx) = mpsc::channel(10);
        let (_handle, signal) = cancellation();

        let err = exec
            .execute("x", &test_context(), events_tx, signal)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExecutorError::Protocol { status: Some(500), .. }
        ));
    }

    #[tokio::test]
    async fn test_streamed_completion() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n\
             data: {\"type\":\"log\",\"content\":\"hello\"}\n\n\
             data: {\"type\":\"status\",\"status\":\"completed\"}\n\n",
        )
        .await;
        let exec = executor(Some(url), Some("key"));
        let (events_tx, mut events_rx) = mpsc::channel(100);
        let (_handle, signal) = cancellation();

        let result = exec
            .execute("x", &test_context(), events_tx, signal)
            .await
            .unwrap();

        assert!(result.is_success());
        assert_eq!(result.output, "hello\n");

        let mut saw_log = false;
        while let Ok(event) = events_rx.try_recv() {
            if let crate::event::ExecutionEventKind::Log { content, .. } = event.payload {
                saw_log = content == "hello";
            }
        }
        assert!(saw_log);
    }

    #[tokio::test]
    async fn test_backend_failure_preserves_partial_output() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n\
             data: {\"type\":\"log\",\"content\":\"partial work\"}\n\n\
             data: {\"type\":\"status\",\"status\":\"failed\",\"error\":\"model refused\"}\n\n",
        )
        .await;
        let exec = executor(Some(url), Some("key"));
        let (events_tx, _events_rx) = mpsc::channel(100);
        let (_handle, signal) = cancellation();

        let result = exec
            .execute("x", &test_context(), events_tx, signal)
            .await
            .unwrap();

        assert_eq!(
            result.outcome,
            ExecutionOutcome::Failed {
                message: "model refused".to_string()
            }
        );
        assert_eq!(result.output, "partial work\n");
    }

    #[tokio::test]
    async fn test_stream_without_terminal_status_fails_with_partial() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n\
             data: {\"type\":\"log\",\"content\":\"orphan\"}\n\n",
        )
        .await;
        let exec = executor(Some(url), Some("key"));
        let (events_tx, _events_rx) = mpsc::channel(100);
        let (_handle, signal) = cancellation();

        let result = exec
            .execute("x", &test_context(), events_tx, signal)
            .await
            .unwrap();

        assert!(matches!(result.outcome, ExecutionOutcome::Failed { .. }));
        assert_eq!(result.output, "orphan\n");
    }
}
