//! Reply parsing for the responses-style protocol.
//!
//! A reply's `output` array mixes message items (text chunks) and
//! function-call items. Items of other types (reasoning traces and the
//! like) are skipped. When no tool call is present the concatenated text
//! must parse into exactly `{ action, rationale }`; anything else is a
//! hard protocol error for the cycle.

use crate::{OracleError, Result};
use serde::Deserialize;
use vaultward_types::ToolCallRequest;

/// A non-tool decision, fixed key set enforced on parse.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructuredDecision {
    pub action: String,
    pub rationale: String,
}

/// Parsed decision turn.
#[derive(Debug, Clone)]
pub struct OracleReply {
    /// Service-side identifier enabling the stateful follow-up turn.
    pub response_id: String,
    /// Present when the service answered with text instead of tool calls.
    pub decision: Option<StructuredDecision>,
    pub tool_calls: Vec<ToolCallRequest>,
}

#[derive(Deserialize)]
struct WireReply {
    id: String,
    output: Vec<WireItem>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireItem {
    Message {
        #[serde(default)]
        content: Vec<WireChunk>,
    },
    FunctionCall {
        name: String,
        arguments: String,
        call_id: String,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireChunk {
    OutputText { text: String },
    #[serde(other)]
    Unknown,
}

/// Parse a 2xx decision-turn body.
pub fn parse_reply(body: &str) -> Result<OracleReply> {
    let wire: WireReply =
        serde_json::from_str(body).map_err(|error| OracleError::Malformed(error.to_string()))?;

    let mut text = String::new();
    let mut tool_calls = Vec::new();
    for item in wire.output {
        match item {
            WireItem::Message { content } => {
                for chunk in content {
                    if let WireChunk::OutputText { text: chunk_text } = chunk {
                        text.push_str(&chunk_text);
                    }
                }
            }
            WireItem::FunctionCall {
                name,
                arguments,
                call_id,
            } => {
                let arguments = serde_json::from_str(&arguments).map_err(|error| {
                    OracleError::Malformed(format!(
                        "tool call {name} arguments are not valid JSON: {error}"
                    ))
                })?;
                tool_calls.push(ToolCallRequest {
                    name,
                    arguments,
                    call_id,
                });
            }
            WireItem::Unknown => {}
        }
    }

    let decision = if tool_calls.is_empty() {
        let parsed = serde_json::from_str::<StructuredDecision>(text.trim()).map_err(|error| {
            OracleError::Malformed(format!("decision text is not {{action, rationale}}: {error}"))
        })?;
        Some(parsed)
    } else {
        None
    };

    Ok(OracleReply {
        response_id: wire.id,
        decision,
        tool_calls,
    })
}

/// Parse a follow-up-turn body into its summary text.
pub fn parse_summary(body: &str) -> Result<String> {
    let wire: WireReply =
        serde_json::from_str(body).map_err(|error| OracleError::Malformed(error.to_string()))?;
    let mut text = String::new();
    for item in wire.output {
        if let WireItem::Message { content } = item {
            for chunk in content {
                if let WireChunk::OutputText { text: chunk_text } = chunk {
                    text.push_str(&chunk_text);
                }
            }
        }
    }
    Ok(text)
}
