//! Flattened display view over a parsed transcript
//!
//! Content blocks are expanded into a flat entry list in transcript
//! order, which is what history views render.

use serde::Serialize;

use crate::message::{ClaudeMessage, ContentBlock, MessageContent, MessageRole};
use crate::store::ClaudeSessionData;

/// Kind of a normalized entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NormalizedEntryType {
    UserMessage,
    AssistantMessage,
    SystemMessage,
    ToolUse { tool_name: String },
    ToolResult { tool_use_id: String, is_error: bool },
}

/// One flattened entry of a transcript
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedEntry {
    pub timestamp: Option<String>,
    pub entry_type: NormalizedEntryType,
    pub content: String,
}

/// Flatten a parsed session into display entries.
pub fn normalized_entries(session: &ClaudeSessionData) -> Vec<NormalizedEntry> {
    let mut entries = Vec::new();

    for message in &session.messages {
        match &message.content {
            MessageContent::Text(text) => {
                if !text.is_empty() {
                    entries.push(NormalizedEntry {
                        timestamp: message.timestamp.clone(),
                        entry_type: role_entry_type(message.role),
                        content: text.clone(),
                    });
                }
            }
            MessageContent::Blocks(blocks) => {
                for block in blocks {
                    if let Some(entry) = block_entry(message, block) {
                        entries.push(entry);
                    }
                }
            }
        }
    }

    entries
}

fn role_entry_type(role: MessageRole) -> NormalizedEntryType {
    match role {
        MessageRole::User => NormalizedEntryType::UserMessage,
        MessageRole::Assistant => NormalizedEntryType::AssistantMessage,
        MessageRole::System => NormalizedEntryType::SystemMessage,
    }
}

fn block_entry(message: &ClaudeMessage, block: &ContentBlock) -> Option<NormalizedEntry> {
    let (entry_type, content) = match block {
        ContentBlock::Text { text } => {
            if text.is_empty() {
                return None;
            }
            (role_entry_type(message.role), text.clone())
        }
        ContentBlock::ToolUse { name, input, .. } => (
            NormalizedEntryType::ToolUse {
                tool_name: name.clone(),
            },
            serde_json::to_string(input).unwrap_or_default(),
        ),
        ContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => (
            NormalizedEntryType::ToolResult {
                tool_use_id: tool_use_id.clone(),
                is_error: is_error.unwrap_or(false),
            },
            match content {
                serde_json::Value::String(text) => text.clone(),
                other => serde_json::to_string(other).unwrap_or_default(),
            },
        ),
        ContentBlock::Unknown => return None,
    };

    Some(NormalizedEntry {
        timestamp: message.timestamp.clone(),
        entry_type,
        content,
    })
}
