use crate::canonical::CanonicalRequest;
use crate::transforms::text_block;
use crate::wire::encode::{content_text, copy_fields, image_url, max_tokens, role, str_field};
use serde_json::{Map, Value, json};

const DEFAULT_MAX_TOKENS: u64 = 4096;

/// Chat-completions body to a messages-API body. Fields the messages API
/// does not know are dropped.
pub fn encode_request(request: &CanonicalRequest) -> Map<String, Value> {
    let mut system_blocks = Vec::new();
    let mut messages: Vec<Value> = Vec::new();

    for message in request.messages() {
        match role(message) {
            "system" | "developer" => {
                let text = content_text(message.get("content"));
                if !text.is_empty() {
                    system_blocks.push(text_block(text));
                }
            }
            "tool" => push_tool_result(&mut messages, message),
            "assistant" => messages.push(encode_assistant(message)),
            _ => messages.push(json!({
                "role": "user",
                "content": encode_content(message.get("content")),
            })),
        }
    }

    let body = request.body();
    let mut out = Map::new();
    out.insert("model".to_string(), Value::String(request.model().to_string()));
    out.insert("messages".to_string(), Value::Array(messages));
    out.insert(
        "max_tokens".to_string(),
        Value::from(max_tokens(body).unwrap_or(DEFAULT_MAX_TOKENS)),
    );
    if !system_blocks.is_empty() {
        out.insert("system".to_string(), Value::Array(system_blocks));
    }
    copy_fields(body, &mut out, &["stream", "temperature", "top_p", "thinking"]);
    match body.get("stop") {
        Some(Value::String(stop)) => {
            out.insert("stop_sequences".to_string(), json!([stop]));
        }
        Some(Value::Array(stops)) => {
            out.insert("stop_sequences".to_string(), Value::Array(stops.clone()));
        }
        _ => {}
    }
    if let Some(Value::Array(tools)) = body.get("tools") {
        out.insert("tools".to_string(), Value::Array(encode_tools(tools)));
    }
    if let Some(choice) = body.get("tool_choice").and_then(encode_tool_choice) {
        out.insert("tool_choice".to_string(), choice);
    }
    if let Some(user) = body.get("user").and_then(|v| v.as_str()) {
        out.insert("metadata".to_string(), json!({ "user_id": user }));
    }
    out
}

fn encode_content(content: Option<&Value>) -> Vec<Value> {
    match content {
        Some(Value::String(text)) if !text.is_empty() => vec![text_block(text.clone())],
        Some(Value::Array(parts)) => parts.iter().filter_map(encode_part).collect(),
        _ => Vec::new(),
    }
}

fn encode_part(part: &Value) -> Option<Value> {
    match part.get("type").and_then(|v| v.as_str())? {
        "text" => {
            let text = str_field(part, "text");
            (!text.is_empty()).then(|| text_block(text))
        }
        "image_url" => image_url(part).map(encode_image),
        _ => None,
    }
}

fn encode_image(url: &str) -> Value {
    if let Some(rest) = url.strip_prefix("data:") {
        if let Some((media_type, data)) = rest.split_once(";base64,") {
            return json!({
                "type": "image",
                "source": { "type": "base64", "media_type": media_type, "data": data }
            });
        }
    }
    json!({
        "type": "image",
        "source": { "type": "url", "url": url }
    })
}

fn encode_assistant(message: &Value) -> Value {
    let mut content = encode_content(message.get("content"));
    for call in message
        .get("tool_calls")
        .and_then(|v| v.as_array())
        .into_iter()
        .flatten()
    {
        let function = call.get("function").unwrap_or(&Value::Null);
        let arguments = str_field(function, "arguments");
        let input = if arguments.is_empty() {
            json!({})
        } else {
            serde_json::from_str::<Value>(arguments).unwrap_or_else(|_| json!({ "_raw": arguments }))
        };
        content.push(json!({
            "type": "tool_use",
            "id": str_field(call, "id"),
            "name": str_field(function, "name"),
            "input": input,
        }));
    }
    json!({ "role": "assistant", "content": content })
}

/// Consecutive tool messages collapse into one user turn of `tool_result`
/// blocks.
fn push_tool_result(messages: &mut Vec<Value>, message: &Value) {
    let block = json!({
        "type": "tool_result",
        "tool_use_id": str_field(message, "tool_call_id"),
        "content": content_text(message.get("content")),
    });
    if let Some(last) = messages.last_mut() {
        let only_results = last.get("role").and_then(|v| v.as_str()) == Some("user")
            && last
                .get("content")
                .and_then(|v| v.as_array())
                .is_some_and(|blocks| {
                    !blocks.is_empty()
                        && blocks.iter().all(|b| {
                            b.get("type").and_then(|v| v.as_str()) == Some("tool_result")
                        })
                });
        if only_results {
            if let Some(blocks) = last.get_mut("content").and_then(|v| v.as_array_mut()) {
                blocks.push(block);
                return;
            }
        }
    }
    messages.push(json!({ "role": "user", "content": [block] }));
}

fn encode_tools(tools: &[Value]) -> Vec<Value> {
    tools
        .iter()
        .filter_map(|tool| {
            let function = tool.get("function")?;
            let mut out = Map::new();
            out.insert("name".to_string(), Value::String(str_field(function, "name").to_string()));
            if let Some(description) = function.get("description").filter(|v| !v.is_null()) {
                out.insert("description".to_string(), description.clone());
            }
            out.insert(
                "input_schema".to_string(),
                function
                    .get("parameters")
                    .cloned()
                    .unwrap_or_else(|| json!({ "type": "object", "properties": {} })),
            );
            Some(Value::Object(out))
        })
        .collect()
}

fn encode_tool_choice(choice: &Value) -> Option<Value> {
    match choice {
        Value::String(mode) => match mode.as_str() {
            "auto" => Some(json!({ "type": "auto" })),
            "required" => Some(json!({ "type": "any" })),
            "none" => Some(json!({ "type": "none" })),
            _ => None,
        },
        Value::Object(_) => choice
            .get("function")
            .and_then(|f| f.get("name"))
            .and_then(|v| v.as_str())
            .map(|name| json!({ "type": "tool", "name": name })),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(body: Value) -> Value {
        let model = body["model"].as_str().unwrap().to_string();
        Value::Object(encode_request(&CanonicalRequest::new(body, &model).unwrap()))
    }

    #[test]
    fn system_messages_become_blocks_and_defaults_apply() {
        let out = encode(json!({
            "model": "claude-opus-4-1-20250805",
            "messages": [
                { "role": "system", "content": "be terse" },
                { "role": "user", "content": "hi" }
            ],
            "stream": true,
            "frequency_penalty": 0.5
        }));
        assert_eq!(
            out,
            json!({
                "model": "claude-opus-4-1-20250805",
                "messages": [{ "role": "user", "content": [{ "type": "text", "text": "hi" }] }],
                "max_tokens": 4096,
                "system": [{ "type": "text", "text": "be terse" }],
                "stream": true
            })
        );
    }

    #[test]
    fn sampling_fields_map() {
        let out = encode(json!({
            "model": "m",
            "messages": [],
            "max_completion_tokens": 300,
            "temperature": 0.2,
            "top_p": 0.9,
            "stop": "END",
            "user": "u-1"
        }));
        assert_eq!(out["max_tokens"], json!(300));
        assert_eq!(out["temperature"], json!(0.2));
        assert_eq!(out["top_p"], json!(0.9));
        assert_eq!(out["stop_sequences"], json!(["END"]));
        assert_eq!(out["metadata"], json!({ "user_id": "u-1" }));
    }

    #[test]
    fn tool_round_trip_messages_map() {
        let out = encode(json!({
            "model": "m",
            "messages": [
                { "role": "user", "content": "weather?" },
                { "role": "assistant", "content": null, "tool_calls": [
                    { "id": "call_1", "type": "function", "function": { "name": "get_weather", "arguments": "{\"city\":\"Paris\"}" } },
                    { "id": "call_2", "type": "function", "function": { "name": "get_time", "arguments": "" } }
                ]},
                { "role": "tool", "tool_call_id": "call_1", "content": "sunny" },
                { "role": "tool", "tool_call_id": "call_2", "content": "noon" }
            ],
            "tools": [{ "type": "function", "function": { "name": "get_weather", "description": "d", "parameters": { "type": "object" } } }],
            "tool_choice": "required"
        }));
        let messages = out["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(
            messages[1]["content"][0],
            json!({ "type": "tool_use", "id": "call_1", "name": "get_weather", "input": { "city": "Paris" } })
        );
        assert_eq!(messages[1]["content"][1]["input"], json!({}));
        assert_eq!(
            messages[2]["content"],
            json!([
                { "type": "tool_result", "tool_use_id": "call_1", "content": "sunny" },
                { "type": "tool_result", "tool_use_id": "call_2", "content": "noon" }
            ])
        );
        assert_eq!(
            out["tools"],
            json!([{ "name": "get_weather", "description": "d", "input_schema": { "type": "object" } }])
        );
        assert_eq!(out["tool_choice"], json!({ "type": "any" }));
    }

    #[test]
    fn image_parts_map_to_sources() {
        let out = encode(json!({
            "model": "m",
            "messages": [{ "role": "user", "content": [
                { "type": "text", "text": "what is this" },
                { "type": "image_url", "image_url": { "url": "data:image/png;base64,AAAA" } },
                { "type": "image_url", "image_url": { "url": "https://example.com/a.png" } }
            ]}]
        }));
        let content = &out["messages"][0]["content"];
        assert_eq!(
            content[1]["source"],
            json!({ "type": "base64", "media_type": "image/png", "data": "AAAA" })
        );
        assert_eq!(
            content[2]["source"],
            json!({ "type": "url", "url": "https://example.com/a.png" })
        );
    }

    #[test]
    fn named_tool_choice_maps_to_tool() {
        assert_eq!(
            encode_tool_choice(&json!({ "type": "function", "function": { "name": "f" } })),
            Some(json!({ "type": "tool", "name": "f" }))
        );
    }
}
