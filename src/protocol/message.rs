use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{Error, Result};
use crate::protocol::{now_millis, MessageId};

/// Message type tag carried in the `type` field of every envelope.
///
/// The wire form is a snake_case string. Tags the client does not
/// recognize are preserved in [`MessageKind::Other`] so they survive a
/// round trip; by convention any tag ending in `_error` marks an
/// application-level error reply.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageKind {
    // ---
    /// Initial handshake declaring client identity and capabilities.
    Connect,
    /// Invoke a named remote tool.
    ToolCall,
    /// Create a pipeline from a node/edge spec.
    PipelineCreate,
    /// Run sample data through an existing pipeline.
    PipelineTest,
    /// Handshake acknowledgement.
    ConnectResult,
    /// Successful reply to any of the request kinds above.
    ToolResult,
    /// Error reply carrying a message string in the payload.
    ToolError,
    /// Any tag not listed above.
    Other(String),
}

impl MessageKind {
    /// Wire-format string for this tag.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Connect => "connect",
            Self::ToolCall => "tool_call",
            Self::PipelineCreate => "pipeline_create",
            Self::PipelineTest => "pipeline_test",
            Self::ConnectResult => "connect_result",
            Self::ToolResult => "tool_result",
            Self::ToolError => "tool_error",
            Self::Other(tag) => tag,
        }
    }

    /// Whether this tag marks an application-level error reply.
    pub fn is_error(&self) -> bool {
        match self {
            Self::ToolError => true,
            Self::Other(tag) => tag.ends_with("_error"),
            _ => false,
        }
    }
}

impl From<String> for MessageKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "connect" => Self::Connect,
            "tool_call" => Self::ToolCall,
            "pipeline_create" => Self::PipelineCreate,
            "pipeline_test" => Self::PipelineTest,
            "connect_result" => Self::ConnectResult,
            "tool_result" => Self::ToolResult,
            "tool_error" => Self::ToolError,
            _ => Self::Other(value),
        }
    }
}

impl From<MessageKind> for String {
    fn from(kind: MessageKind) -> Self {
        kind.as_str().to_owned()
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON message envelope exchanged with the bridge server.
///
/// ```text
/// Request:  { id, type, timestamp: millis, payload: object }
/// Response: { id, type, payload: { result } | { error: { message } } }
/// ```
///
/// The payload is opaque to the client; it is serialized and forwarded
/// as-is. Responses may omit the timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    // ---
    /// Correlation identifier. Replies carry the id of the request
    /// they answer.
    pub id: MessageId,

    /// Type tag.
    #[serde(rename = "type")]
    pub kind: MessageKind,

    /// Send time in milliseconds since the Unix epoch. Always set on
    /// outbound messages; inbound messages may omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,

    /// Opaque structured payload.
    #[serde(default)]
    pub payload: Value,
}

impl Message {
    /// Build an outbound message with a fresh identifier and the
    /// current timestamp.
    pub fn new(kind: MessageKind, payload: Value) -> Self {
        Self {
            id: MessageId::generate(),
            kind,
            timestamp: Some(now_millis()),
            payload,
        }
    }

    /// Build a reply carrying an existing identifier.
    ///
    /// The client never sends replies; this exists for test doubles
    /// standing in for the server.
    pub fn reply(id: MessageId, kind: MessageKind, payload: Value) -> Self {
        Self {
            id,
            kind,
            timestamp: None,
            payload,
        }
    }

    /// Unwrap a reply into its result value.
    ///
    /// Error-kinded replies become [`Error::Remote`] carrying the
    /// message string from `payload.error.message`. A success reply
    /// without a `result` field is [`Error::InvalidResponse`].
    pub fn into_result(self) -> Result<Value> {
        if self.kind.is_error() {
            let message = self
                .payload
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("unknown remote error");
            return Err(Error::Remote(message.to_owned()));
        }

        match self.payload {
            Value::Object(mut fields) => fields.remove("result").ok_or(Error::InvalidResponse),
            _ => Err(Error::InvalidResponse),
        }
    }
}
