pub mod anthropic;
pub mod openai_responses;

use crate::config::ProtocolType;
use crate::wire::UpstreamEvent;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StreamDecodeError {
    #[error("frame is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("{event} frame is missing {field}")]
    MissingField {
        event: String,
        field: &'static str,
    },
    #[error("upstream reported an error: {0}")]
    Upstream(String),
    #[error("{0} streams are not re-encoded")]
    Unsupported(ProtocolType),
}

/// Decode one SSE frame. `event_name` is the `event:` label, empty when the
/// upstream only sends `data:` lines.
pub fn decode_event(
    protocol: ProtocolType,
    event_name: &str,
    data: &str,
) -> Result<UpstreamEvent, StreamDecodeError> {
    match protocol {
        ProtocolType::Anthropic => anthropic::decode_event(event_name, data),
        ProtocolType::Openai => openai_responses::decode_event(event_name, data),
        ProtocolType::Passthrough => Err(StreamDecodeError::Unsupported(protocol)),
    }
}

pub(crate) fn parse_frame(data: &str) -> Result<Value, StreamDecodeError> {
    serde_json::from_str(data).map_err(|err| StreamDecodeError::InvalidJson(err.to_string()))
}

/// The `event:` label when present, otherwise the payload's `type`.
pub(crate) fn frame_type<'a>(event_name: &'a str, payload: &'a Value) -> &'a str {
    if !event_name.is_empty() && event_name != "message" {
        return event_name;
    }
    payload.get("type").and_then(|v| v.as_str()).unwrap_or("")
}

pub(crate) fn upstream_error_message(payload: &Value) -> String {
    payload
        .get("error")
        .and_then(|e| e.get("message").or(Some(e)))
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| payload.to_string())
}

/// A complete (non-streamed) upstream answer reduced to what a
/// chat-completion message carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledMessage {
    pub text: String,
    pub reasoning: String,
    pub tool_calls: Vec<AssembledToolCall>,
    pub finish_reason: Option<crate::wire::FinishReason>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssembledToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

pub fn decode_response(
    protocol: ProtocolType,
    document: &Value,
) -> Result<AssembledMessage, StreamDecodeError> {
    match protocol {
        ProtocolType::Anthropic => anthropic::decode_response(document),
        ProtocolType::Openai => openai_responses::decode_response(document),
        ProtocolType::Passthrough => Err(StreamDecodeError::Unsupported(protocol)),
    }
}
