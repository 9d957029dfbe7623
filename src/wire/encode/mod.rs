pub mod anthropic;
pub mod openai_responses;

use crate::canonical::CanonicalRequest;
use crate::config::ProtocolType;
use crate::model_registry::ReasoningLevel;
use crate::transforms::{inject_system_prompt, map_reasoning};
use serde_json::{Map, Value};

/// Build the upstream body for a chat-completions request.
///
/// Passthrough returns the canonical body untouched. The other dialects get
/// their field mapping first, then the reasoning patch, then the system
/// prompt. The input request is never modified.
pub fn build_request(
    request: &CanonicalRequest,
    protocol: ProtocolType,
    level: Option<ReasoningLevel>,
    system_prompt: &str,
) -> Value {
    let mapped = match protocol {
        ProtocolType::Passthrough => return request.to_value(),
        ProtocolType::Anthropic => anthropic::encode_request(request),
        ProtocolType::Openai => openai_responses::encode_request(request),
    };
    Value::Object(apply_gateway_fields(&mapped, protocol, level, system_prompt))
}

/// Body for `/v1/messages` and `/v1/responses`: the client already speaks
/// the upstream dialect, so only the gateway-owned fields change.
pub fn forward_request(
    request: &CanonicalRequest,
    protocol: ProtocolType,
    level: Option<ReasoningLevel>,
    system_prompt: &str,
) -> Value {
    Value::Object(apply_gateway_fields(
        request.body(),
        protocol,
        level,
        system_prompt,
    ))
}

fn apply_gateway_fields(
    body: &Map<String, Value>,
    protocol: ProtocolType,
    level: Option<ReasoningLevel>,
    system_prompt: &str,
) -> Map<String, Value> {
    let patched = map_reasoning(level, protocol).apply(body);
    inject_system_prompt(&patched, protocol, system_prompt)
}

pub(crate) fn copy_fields(from: &Map<String, Value>, to: &mut Map<String, Value>, keys: &[&str]) {
    for key in keys {
        if let Some(value) = from.get(*key) {
            if !value.is_null() {
                to.insert((*key).to_string(), value.clone());
            }
        }
    }
}

pub(crate) fn max_tokens(body: &Map<String, Value>) -> Option<u64> {
    body.get("max_tokens")
        .and_then(|v| v.as_u64())
        .or_else(|| body.get("max_completion_tokens").and_then(|v| v.as_u64()))
}

/// Plain text of a chat message's `content`, whether string or part array.
pub(crate) fn content_text(content: Option<&Value>) -> String {
    match content {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter(|part| part.get("type").and_then(|v| v.as_str()) == Some("text"))
            .filter_map(|part| part.get("text").and_then(|v| v.as_str()))
            .collect(),
        _ => String::new(),
    }
}

/// URL carried by an `image_url` part, in either the object or string form.
pub(crate) fn image_url(part: &Value) -> Option<&str> {
    let image = part.get("image_url")?;
    image
        .get("url")
        .and_then(|v| v.as_str())
        .or_else(|| image.as_str())
}

pub(crate) fn role(message: &Value) -> &str {
    message.get("role").and_then(|v| v.as_str()).unwrap_or("user")
}

pub(crate) fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(|v| v.as_str()).unwrap_or("")
}
