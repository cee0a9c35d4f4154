//! Transcript message model and tolerant shape normalization
//!
//! Transcript lines arrive in several shapes, produced by different
//! versions of the external tool. Each recognized shape is handled by one
//! matcher; matchers run in fixed priority order and the first match wins.
//! Lines matching no shape are metadata the transcript format carries
//! (summaries, hook results, ...) and are dropped without a warning.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a transcript message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// One typed unit within a message's content sequence.
///
/// Blocks are preserved exactly as found; no pairing of `tool_use` ids
/// with `tool_result` blocks is validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        #[serde(default)]
        content: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
    /// Block kinds this core does not model (thinking, images, ...).
    /// Kept as a placeholder so block ordering is preserved.
    #[serde(other)]
    Unknown,
}

/// Message content: either a plain string or an ordered block sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// A normalized transcript message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaudeMessage {
    pub role: MessageRole,
    pub content: MessageContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
}

/// A non-fatal parse anomaly recorded while reading a transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    /// 1-based line number within the transcript file
    pub line_number: usize,
    /// Why the line could not be decoded
    pub reason: String,
}

type ShapeMatcher = fn(&Value) -> Option<ClaudeMessage>;

/// Recognized line shapes, tried in fixed priority order
const SHAPE_MATCHERS: &[ShapeMatcher] = &[match_flat, match_wrapped, match_tool_result_flavored];

/// Normalize one decoded transcript line into a message.
///
/// Returns `None` for lines that match no recognized shape.
pub(crate) fn normalize_line(value: &Value) -> Option<ClaudeMessage> {
    SHAPE_MATCHERS.iter().find_map(|matcher| matcher(value))
}

/// Shape 1, flat: `{role, content, timestamp?, type?}`
fn match_flat(value: &Value) -> Option<ClaudeMessage> {
    let obj = value.as_object()?;

    Some(ClaudeMessage {
        role: parse_role(obj.get("role")?)?,
        content: parse_content(obj.get("content")?)?,
        timestamp: string_field(obj.get("timestamp")),
        message_type: string_field(obj.get("type")),
    })
}

/// Shape 2, wrapped: `{message: {role, content, type?}, timestamp?, type?}`
fn match_wrapped(value: &Value) -> Option<ClaudeMessage> {
    let obj = value.as_object()?;
    let message = obj.get("message")?.as_object()?;

    Some(ClaudeMessage {
        role: parse_role(message.get("role")?)?,
        content: parse_content(message.get("content")?)?,
        timestamp: string_field(obj.get("timestamp")),
        message_type: string_field(message.get("type")).or_else(|| string_field(obj.get("type"))),
    })
}

/// Shape 3, tool-result-flavored: `{type: "user", message: {content}}`.
///
/// The outer `"user"` tag is structural (it names the shape, not a message
/// type) and is consumed into the role.
fn match_tool_result_flavored(value: &Value) -> Option<ClaudeMessage> {
    let obj = value.as_object()?;
    if obj.get("type")?.as_str()? != "user" {
        return None;
    }
    let message = obj.get("message")?.as_object()?;

    Some(ClaudeMessage {
        role: MessageRole::User,
        content: parse_content(message.get("content")?)?,
        timestamp: string_field(obj.get("timestamp")),
        message_type: None,
    })
}

fn parse_role(value: &Value) -> Option<MessageRole> {
    serde_json::from_value(value.clone()).ok()
}

fn parse_content(value: &Value) -> Option<MessageContent> {
    serde_json::from_value(value.clone()).ok()
}

fn string_field(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_shape() {
        let line = json!({"role": "assistant", "content": "done", "timestamp": "2026-01-01T00:00:00Z"});
        let msg = normalize_line(&line).unwrap();

        assert_eq!(msg.role, MessageRole::Assistant);
        assert_eq!(msg.content, MessageContent::Text("done".to_string()));
        assert_eq!(msg.timestamp.as_deref(), Some("2026-01-01T00:00:00Z"));
    }

    #[test]
    fn test_wrapped_shape() {
        let line = json!({
            "type": "assistant",
            "timestamp": "2026-01-01T00:00:00Z",
            "message": {"role": "assistant", "content": [{"type": "text", "text": "hi"}]}
        });
        let msg = normalize_line(&line).unwrap();

        assert_eq!(msg.role, MessageRole::Assistant);
        assert_eq!(msg.message_type.as_deref(), Some("assistant"));
        assert_eq!(
            msg.content,
            MessageContent::Blocks(vec![ContentBlock::Text {
                text: "hi".to_string()
            }])
        );
    }

    #[test]
    fn test_tool_result_flavored_shape() {
        let line = json!({
            "type": "user",
            "message": {"content": [{
                "type": "tool_result",
                "tool_use_id": "tu_1",
                "content": "ok",
                "is_error": false
            }]}
        });
        let msg = normalize_line(&line).unwrap();

        assert_eq!(msg.role, MessageRole::User);
        match &msg.content {
            MessageContent::Blocks(blocks) => assert_eq!(
                blocks[0],
                ContentBlock::ToolResult {
                    tool_use_id: "tu_1".to_string(),
                    content: json!("ok"),
                    is_error: Some(false),
                }
            ),
            other => panic!("expected blocks, got {other:?}"),
        }
    }

    #[test]
    fn test_equivalent_shapes_normalize_identically() {
        let flat = json!({"role": "user", "content": "hello"});
        let wrapped = json!({"message": {"role": "user", "content": "hello"}});
        let flavored = json!({"type": "user", "message": {"content": "hello"}});

        let a = normalize_line(&flat).unwrap();
        let b = normalize_line(&wrapped).unwrap();
        let c = normalize_line(&flavored).unwrap();

        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_unrecognized_shape_is_dropped() {
        assert!(normalize_line(&json!({"summary": "compact summary"})).is_none());
        assert!(normalize_line(&json!({"type": "system-meta"})).is_none());
        assert!(normalize_line(&json!(42)).is_none());
    }

    #[test]
    fn test_block_ordering_preserved() {
        let line = json!({
            "role": "assistant",
            "content": [
                {"type": "text", "text": "first"},
                {"type": "tool_use", "id": "tu_1", "name": "bash", "input": {"cmd": "ls"}},
                {"type": "text", "text": "last"}
            ]
        });
        let msg = normalize_line(&line).unwrap();

        match msg.content {
            MessageContent::Blocks(blocks) => {
                assert_eq!(blocks.len(), 3);
                assert!(matches!(&blocks[0], ContentBlock::Text { text } if text == "first"));
                assert!(matches!(&blocks[1], ContentBlock::ToolUse { name, .. } if name == "bash"));
                assert!(matches!(&blocks[2], ContentBlock::Text { text } if text == "last"));
            }
            other => panic!("expected blocks, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_block_kind_keeps_position() {
        let line = json!({
            "role": "assistant",
            "content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "answer"}
            ]
        });
        let msg = normalize_line(&line).unwrap();

        match msg.content {
            MessageContent::Blocks(blocks) => {
                assert_eq!(blocks.len(), 2);
                assert_eq!(blocks[0], ContentBlock::Unknown);
            }
            other => panic!("expected blocks, got {other:?}"),
        }
    }
}
