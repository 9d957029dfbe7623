use crate::wire::decode::{
    AssembledMessage, AssembledToolCall, StreamDecodeError, Usage, frame_type, parse_frame,
    upstream_error_message,
};
use crate::wire::{FinishReason, UpstreamEvent};
use serde_json::Value;

pub fn decode_event(event_name: &str, data: &str) -> Result<UpstreamEvent, StreamDecodeError> {
    let payload = parse_frame(data)?;
    let kind = frame_type(event_name, &payload);
    match kind {
        "message_start" => Ok(UpstreamEvent::MessageStart),
        "content_block_start" => decode_block_start(kind, &payload),
        "content_block_delta" => decode_block_delta(kind, &payload),
        "message_delta" => {
            let reason = payload
                .get("delta")
                .and_then(|d| d.get("stop_reason"))
                .and_then(|v| v.as_str());
            Ok(match reason {
                Some(reason) => UpstreamEvent::Finish(FinishReason::from_upstream(reason)),
                None => UpstreamEvent::Ignored,
            })
        }
        "message_stop" => Ok(UpstreamEvent::MessageStop),
        "error" => Err(StreamDecodeError::Upstream(upstream_error_message(&payload))),
        _ => Ok(UpstreamEvent::Ignored),
    }
}

fn block_index(kind: &str, payload: &Value) -> Result<u64, StreamDecodeError> {
    payload
        .get("index")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| StreamDecodeError::MissingField {
            event: kind.to_string(),
            field: "index",
        })
}

fn decode_block_start(kind: &str, payload: &Value) -> Result<UpstreamEvent, StreamDecodeError> {
    let block = payload
        .get("content_block")
        .ok_or_else(|| StreamDecodeError::MissingField {
            event: kind.to_string(),
            field: "content_block",
        })?;
    let str_field = |name: &str| {
        block
            .get(name)
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string()
    };
    match block.get("type").and_then(|v| v.as_str()).unwrap_or("") {
        "tool_use" => Ok(UpstreamEvent::ToolCallStart {
            slot: block_index(kind, payload)?,
            id: str_field("id"),
            name: str_field("name"),
        }),
        "text" => {
            let text = str_field("text");
            Ok(if text.is_empty() {
                UpstreamEvent::Ignored
            } else {
                UpstreamEvent::TextDelta(text)
            })
        }
        "thinking" => {
            let thinking = str_field("thinking");
            Ok(if thinking.is_empty() {
                UpstreamEvent::Ignored
            } else {
                UpstreamEvent::ReasoningDelta(thinking)
            })
        }
        _ => Ok(UpstreamEvent::Ignored),
    }
}

fn decode_block_delta(kind: &str, payload: &Value) -> Result<UpstreamEvent, StreamDecodeError> {
    let delta = payload
        .get("delta")
        .ok_or_else(|| StreamDecodeError::MissingField {
            event: kind.to_string(),
            field: "delta",
        })?;
    let text_of = |field: &'static str| {
        delta
            .get(field)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| StreamDecodeError::MissingField {
                event: kind.to_string(),
                field,
            })
    };
    match delta.get("type").and_then(|v| v.as_str()).unwrap_or("") {
        "text_delta" => Ok(UpstreamEvent::TextDelta(text_of("text")?)),
        "thinking_delta" => Ok(UpstreamEvent::ReasoningDelta(text_of("thinking")?)),
        "input_json_delta" => Ok(UpstreamEvent::ToolCallArgsDelta {
            slot: block_index(kind, payload)?,
            arguments: text_of("partial_json")?,
        }),
        _ => Ok(UpstreamEvent::Ignored),
    }
}

/// Reduce a complete messages-API document.
pub fn decode_response(document: &Value) -> Result<AssembledMessage, StreamDecodeError> {
    if document.get("type").and_then(|v| v.as_str()) == Some("error") {
        return Err(StreamDecodeError::Upstream(upstream_error_message(document)));
    }
    let blocks = document
        .get("content")
        .and_then(|v| v.as_array())
        .ok_or_else(|| StreamDecodeError::MissingField {
            event: "message".to_string(),
            field: "content",
        })?;

    let mut out = AssembledMessage::default();
    for block in blocks {
        match block.get("type").and_then(|v| v.as_str()).unwrap_or("") {
            "text" => {
                if let Some(text) = block.get("text").and_then(|v| v.as_str()) {
                    out.text.push_str(text);
                }
            }
            "thinking" => {
                if let Some(thinking) = block.get("thinking").and_then(|v| v.as_str()) {
                    out.reasoning.push_str(thinking);
                }
            }
            "tool_use" => {
                let input = block.get("input").cloned().unwrap_or(Value::Object(Default::default()));
                out.tool_calls.push(AssembledToolCall {
                    id: block
                        .get("id")
                        .and_then(|v| v.as_str())
                        .unwrap_or("")
                        .to_string(),
                    name: block
                        .get("name")
                        .and_then(|v| v.as_str())
                        .unwrap_or("")
                        .to_string(),
                    arguments: input.to_string(),
                });
            }
            _ => {}
        }
    }
    out.finish_reason = document
        .get("stop_reason")
        .and_then(|v| v.as_str())
        .map(FinishReason::from_upstream);
    out.usage = document.get("usage").map(|usage| {
        let field = |name: &str| usage.get(name).and_then(|v| v.as_u64()).unwrap_or(0);
        Usage {
            prompt_tokens: field("input_tokens")
                + field("cache_read_input_tokens")
                + field("cache_creation_input_tokens"),
            completion_tokens: field("output_tokens"),
        }
    });
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(v: Value) -> String {
        v.to_string()
    }

    #[test]
    fn text_and_thinking_deltas_decode() {
        let ev = decode_event(
            "content_block_delta",
            &frame(json!({ "type": "content_block_delta", "index": 0, "delta": { "type": "text_delta", "text": "Hel" } })),
        )
        .unwrap();
        assert_eq!(ev, UpstreamEvent::TextDelta("Hel".to_string()));

        let ev = decode_event(
            "",
            &frame(json!({ "type": "content_block_delta", "index": 0, "delta": { "type": "thinking_delta", "thinking": "hmm" } })),
        )
        .unwrap();
        assert_eq!(ev, UpstreamEvent::ReasoningDelta("hmm".to_string()));
    }

    #[test]
    fn tool_use_block_and_json_delta_decode() {
        let start = decode_event(
            "content_block_start",
            &frame(json!({
                "type": "content_block_start",
                "index": 1,
                "content_block": { "type": "tool_use", "id": "toolu_1", "name": "get_weather", "input": {} }
            })),
        )
        .unwrap();
        assert_eq!(
            start,
            UpstreamEvent::ToolCallStart {
                slot: 1,
                id: "toolu_1".to_string(),
                name: "get_weather".to_string()
            }
        );
        let delta = decode_event(
            "content_block_delta",
            &frame(json!({ "type": "content_block_delta", "index": 1, "delta": { "type": "input_json_delta", "partial_json": "{\"city\":" } })),
        )
        .unwrap();
        assert_eq!(
            delta,
            UpstreamEvent::ToolCallArgsDelta {
                slot: 1,
                arguments: "{\"city\":".to_string()
            }
        );
    }

    #[test]
    fn message_delta_carries_stop_reason() {
        let ev = decode_event(
            "message_delta",
            &frame(json!({ "type": "message_delta", "delta": { "stop_reason": "max_tokens" }, "usage": { "output_tokens": 9 } })),
        )
        .unwrap();
        assert_eq!(ev, UpstreamEvent::Finish(FinishReason::Length));
    }

    #[test]
    fn housekeeping_events_are_ignored() {
        for (name, payload) in [
            ("ping", json!({ "type": "ping" })),
            ("content_block_stop", json!({ "type": "content_block_stop", "index": 0 })),
            ("content_block_start", json!({ "type": "content_block_start", "index": 0, "content_block": { "type": "text", "text": "" } })),
            ("content_block_delta", json!({ "type": "content_block_delta", "index": 0, "delta": { "type": "signature_delta", "signature": "abc" } })),
        ] {
            assert_eq!(decode_event(name, &frame(payload)).unwrap(), UpstreamEvent::Ignored);
        }
    }

    #[test]
    fn malformed_frames_are_errors() {
        assert!(matches!(
            decode_event("content_block_delta", "{not json"),
            Err(StreamDecodeError::InvalidJson(_))
        ));
        assert!(matches!(
            decode_event("content_block_delta", &frame(json!({ "type": "content_block_delta", "index": 0 }))),
            Err(StreamDecodeError::MissingField { field: "delta", .. })
        ));
        assert!(matches!(
            decode_event("error", &frame(json!({ "type": "error", "error": { "type": "overloaded_error", "message": "Overloaded" } }))),
            Err(StreamDecodeError::Upstream(msg)) if msg == "Overloaded"
        ));
    }

    #[test]
    fn full_message_document_reduces() {
        let doc = json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [
                { "type": "thinking", "thinking": "plan", "signature": "sig" },
                { "type": "text", "text": "Hello" },
                { "type": "tool_use", "id": "toolu_1", "name": "lookup", "input": { "q": "x" } }
            ],
            "stop_reason": "tool_use",
            "usage": { "input_tokens": 10, "output_tokens": 4 }
        });
        let msg = decode_response(&doc).unwrap();
        assert_eq!(msg.text, "Hello");
        assert_eq!(msg.reasoning, "plan");
        assert_eq!(msg.tool_calls[0].arguments, "{\"q\":\"x\"}");
        assert_eq!(msg.finish_reason, Some(FinishReason::ToolCalls));
        assert_eq!(
            msg.usage,
            Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 4
            })
        );
    }
}
