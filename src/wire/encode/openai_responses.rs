use crate::canonical::CanonicalRequest;
use crate::wire::encode::{content_text, copy_fields, image_url, max_tokens, role, str_field};
use serde_json::{Map, Value, json};

/// Chat-completions body to a responses-API body.
pub fn encode_request(request: &CanonicalRequest) -> Map<String, Value> {
    let mut instructions: Vec<String> = Vec::new();
    let mut input = Vec::new();

    for message in request.messages() {
        match role(message) {
            "system" | "developer" => {
                let text = content_text(message.get("content"));
                if !text.is_empty() {
                    instructions.push(text);
                }
            }
            "tool" => input.push(json!({
                "type": "function_call_output",
                "call_id": str_field(message, "tool_call_id"),
                "output": content_text(message.get("content")),
            })),
            "assistant" => encode_assistant(message, &mut input),
            _ => input.push(json!({
                "type": "message",
                "role": "user",
                "content": encode_user_content(message.get("content")),
            })),
        }
    }

    let body = request.body();
    let mut out = Map::new();
    out.insert("model".to_string(), Value::String(request.model().to_string()));
    out.insert("input".to_string(), Value::Array(input));
    if !instructions.is_empty() {
        out.insert(
            "instructions".to_string(),
            Value::String(instructions.join("\n\n")),
        );
    }
    if let Some(max) = max_tokens(body) {
        out.insert("max_output_tokens".to_string(), Value::from(max));
    }
    copy_fields(
        body,
        &mut out,
        &["stream", "temperature", "top_p", "parallel_tool_calls", "reasoning"],
    );
    if !out.contains_key("reasoning") {
        if let Some(effort) = body.get("reasoning_effort").and_then(|v| v.as_str()) {
            out.insert("reasoning".to_string(), json!({ "effort": effort }));
        }
    }
    if let Some(Value::Array(tools)) = body.get("tools") {
        out.insert("tools".to_string(), Value::Array(encode_tools(tools)));
    }
    if let Some(choice) = body.get("tool_choice").and_then(encode_tool_choice) {
        out.insert("tool_choice".to_string(), choice);
    }
    out
}

fn encode_user_content(content: Option<&Value>) -> Vec<Value> {
    match content {
        Some(Value::String(text)) => vec![json!({ "type": "input_text", "text": text })],
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(|part| match part.get("type").and_then(|v| v.as_str())? {
                "text" => Some(json!({ "type": "input_text", "text": str_field(part, "text") })),
                "image_url" => {
                    image_url(part).map(|url| json!({ "type": "input_image", "image_url": url }))
                }
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn encode_assistant(message: &Value, input: &mut Vec<Value>) {
    let text = content_text(message.get("content"));
    if !text.is_empty() {
        input.push(json!({
            "type": "message",
            "role": "assistant",
            "content": [{ "type": "output_text", "text": text }],
        }));
    }
    for call in message
        .get("tool_calls")
        .and_then(|v| v.as_array())
        .into_iter()
        .flatten()
    {
        let function = call.get("function").unwrap_or(&Value::Null);
        input.push(json!({
            "type": "function_call",
            "call_id": str_field(call, "id"),
            "name": str_field(function, "name"),
            "arguments": str_field(function, "arguments"),
        }));
    }
}

fn encode_tools(tools: &[Value]) -> Vec<Value> {
    tools
        .iter()
        .map(|tool| {
            let Some(function) = tool.get("function") else {
                return tool.clone();
            };
            let mut out = Map::new();
            out.insert("type".to_string(), Value::String("function".to_string()));
            out.insert(
                "name".to_string(),
                Value::String(str_field(function, "name").to_string()),
            );
            if let Some(description) = function.get("description").filter(|v| !v.is_null()) {
                out.insert("description".to_string(), description.clone());
            }
            out.insert(
                "parameters".to_string(),
                function
                    .get("parameters")
                    .cloned()
                    .unwrap_or_else(|| json!({ "type": "object", "properties": {} })),
            );
            if let Some(strict) = function.get("strict").and_then(|v| v.as_bool()) {
                out.insert("strict".to_string(), Value::Bool(strict));
            }
            Value::Object(out)
        })
        .collect()
}

fn encode_tool_choice(choice: &Value) -> Option<Value> {
    match choice {
        Value::String(_) => Some(choice.clone()),
        Value::Object(_) => match choice
            .get("function")
            .and_then(|f| f.get("name"))
            .and_then(|v| v.as_str())
        {
            Some(name) => Some(json!({ "type": "function", "name": name })),
            None => Some(choice.clone()),
        },
        _ => None,
    }
}
