use crate::wire::decode::{
    AssembledMessage, AssembledToolCall, StreamDecodeError, Usage, frame_type, parse_frame,
    upstream_error_message,
};
use crate::wire::{FinishReason, UpstreamEvent};
use serde_json::Value;

pub fn decode_event(event_name: &str, data: &str) -> Result<UpstreamEvent, StreamDecodeError> {
    if data.trim() == "[DONE]" {
        return Ok(UpstreamEvent::MessageStop);
    }
    let payload = parse_frame(data)?;
    let kind = frame_type(event_name, &payload);
    match kind {
        "response.created" => Ok(UpstreamEvent::MessageStart),
        "response.output_text.delta" => Ok(UpstreamEvent::TextDelta(delta_text(kind, &payload)?)),
        "response.reasoning_summary_text.delta" | "response.reasoning_text.delta" => {
            Ok(UpstreamEvent::ReasoningDelta(delta_text(kind, &payload)?))
        }
        "response.output_item.added" => {
            let item = payload
                .get("item")
                .ok_or_else(|| missing(kind, "item"))?;
            if item.get("type").and_then(|v| v.as_str()) != Some("function_call") {
                return Ok(UpstreamEvent::Ignored);
            }
            Ok(UpstreamEvent::ToolCallStart {
                slot: output_index(kind, &payload)?,
                id: item
                    .get("call_id")
                    .or_else(|| item.get("id"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
                name: item
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
            })
        }
        "response.function_call_arguments.delta" => Ok(UpstreamEvent::ToolCallArgsDelta {
            slot: output_index(kind, &payload)?,
            arguments: delta_text(kind, &payload)?,
        }),
        "response.completed" | "response.incomplete" => {
            let response = payload
                .get("response")
                .ok_or_else(|| missing(kind, "response"))?;
            Ok(UpstreamEvent::Finish(finish_reason(response)))
        }
        "response.failed" => {
            let response = payload.get("response").unwrap_or(&payload);
            Err(StreamDecodeError::Upstream(upstream_error_message(response)))
        }
        "error" => Err(StreamDecodeError::Upstream(upstream_error_message(&payload))),
        _ => Ok(UpstreamEvent::Ignored),
    }
}

fn missing(kind: &str, field: &'static str) -> StreamDecodeError {
    StreamDecodeError::MissingField {
        event: kind.to_string(),
        field,
    }
}

fn delta_text(kind: &str, payload: &Value) -> Result<String, StreamDecodeError> {
    payload
        .get("delta")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| missing(kind, "delta"))
}

fn output_index(kind: &str, payload: &Value) -> Result<u64, StreamDecodeError> {
    payload
        .get("output_index")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| missing(kind, "output_index"))
}

fn has_function_call(response: &Value) -> bool {
    response
        .get("output")
        .and_then(|v| v.as_array())
        .is_some_and(|items| {
            items
                .iter()
                .any(|item| item.get("type").and_then(|v| v.as_str()) == Some("function_call"))
        })
}

fn finish_reason(response: &Value) -> FinishReason {
    if response.get("status").and_then(|v| v.as_str()) == Some("incomplete") {
        let reason = response
            .get("incomplete_details")
            .and_then(|d| d.get("reason"))
            .and_then(|v| v.as_str())
            .unwrap_or("max_output_tokens");
        return FinishReason::from_upstream(reason);
    }
    if has_function_call(response) {
        FinishReason::ToolCalls
    } else {
        FinishReason::Stop
    }
}

/// Reduce a complete responses-API document.
pub fn decode_response(document: &Value) -> Result<AssembledMessage, StreamDecodeError> {
    if document.get("status").and_then(|v| v.as_str()) == Some("failed") {
        return Err(StreamDecodeError::Upstream(upstream_error_message(document)));
    }
    let items = document
        .get("output")
        .and_then(|v| v.as_array())
        .ok_or_else(|| missing("response", "output"))?;

    let mut out = AssembledMessage::default();
    for item in items {
        match item.get("type").and_then(|v| v.as_str()).unwrap_or("") {
            "message" => {
                for part in item
                    .get("content")
                    .and_then(|v| v.as_array())
                    .into_iter()
                    .flatten()
                {
                    if part.get("type").and_then(|v| v.as_str()) == Some("output_text") {
                        if let Some(text) = part.get("text").and_then(|v| v.as_str()) {
                            out.text.push_str(text);
                        }
                    }
                }
            }
            "reasoning" => {
                for summary in item
                    .get("summary")
                    .and_then(|v| v.as_array())
                    .into_iter()
                    .flatten()
                {
                    if let Some(text) = summary.get("text").and_then(|v| v.as_str()) {
                        out.reasoning.push_str(text);
                    }
                }
            }
            "function_call" => {
                let field = |name: &str| {
                    item.get(name)
                        .and_then(|v| v.as_str())
                        .unwrap_or("")
                        .to_string()
                };
                out.tool_calls.push(AssembledToolCall {
                    id: field("call_id"),
                    name: field("name"),
                    arguments: field("arguments"),
                });
            }
            _ => {}
        }
    }
    out.finish_reason = Some(finish_reason(document));
    out.usage = document.get("usage").map(|usage| {
        let field = |name: &str| usage.get(name).and_then(|v| v.as_u64()).unwrap_or(0);
        Usage {
            prompt_tokens: field("input_tokens"),
            completion_tokens: field("output_tokens"),
        }
    });
    Ok(out)
}
