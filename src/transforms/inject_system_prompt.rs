use crate::config::ProtocolType;
use crate::transforms::text_block;
use serde_json::{Map, Value};

/// Prepend the gateway system prompt in the shape each dialect expects.
///
/// Anthropic bodies get a leading text block in an existing `system` block
/// list; any other `system` is replaced by the prompt block alone. OpenAI responses bodies get the
/// prompt glued in front of `instructions` with no separator. Passthrough
/// bodies are returned unchanged.
pub fn inject_system_prompt(
    body: &Map<String, Value>,
    protocol: ProtocolType,
    prompt: &str,
) -> Map<String, Value> {
    let mut out = body.clone();
    if prompt.is_empty() {
        return out;
    }
    match protocol {
        ProtocolType::Anthropic => {
            let mut blocks = vec![text_block(prompt)];
            if let Some(Value::Array(existing)) = body.get("system") {
                blocks.extend(existing.iter().cloned());
            }
            out.insert("system".to_string(), Value::Array(blocks));
        }
        ProtocolType::Openai => {
            let existing = body
                .get("instructions")
                .and_then(|v| v.as_str())
                .unwrap_or("");
            out.insert(
                "instructions".to_string(),
                Value::String(format!("{prompt}{existing}")),
            );
        }
        ProtocolType::Passthrough => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn empty_prompt_changes_nothing() {
        let body = obj(json!({ "system": "keep", "instructions": "keep" }));
        for protocol in [ProtocolType::Anthropic, ProtocolType::Openai] {
            assert_eq!(inject_system_prompt(&body, protocol, ""), body);
        }
    }

    #[test]
    fn anthropic_prompt_goes_to_front_of_existing_blocks() {
        let body = obj(json!({
            "system": [{ "type": "text", "text": "original", "cache_control": { "type": "ephemeral" } }]
        }));
        let out = inject_system_prompt(&body, ProtocolType::Anthropic, "P");
        assert_eq!(
            out["system"],
            json!([
                { "type": "text", "text": "P" },
                { "type": "text", "text": "original", "cache_control": { "type": "ephemeral" } }
            ])
        );
    }

    #[test]
    fn anthropic_prompt_creates_sequence_when_absent() {
        let out = inject_system_prompt(&obj(json!({})), ProtocolType::Anthropic, "P");
        assert_eq!(out["system"], json!([{ "type": "text", "text": "P" }]));
    }

    #[test]
    fn anthropic_string_system_is_replaced_by_prompt_block() {
        let out = inject_system_prompt(
            &obj(json!({ "system": "be brief" })),
            ProtocolType::Anthropic,
            "P",
        );
        assert_eq!(out["system"], json!([{ "type": "text", "text": "P" }]));
    }

    #[test]
    fn openai_prompt_prefixes_instructions() {
        let out = inject_system_prompt(
            &obj(json!({ "instructions": "Answer in French." })),
            ProtocolType::Openai,
            "You are Droid.\n\n",
        );
        assert_eq!(out["instructions"], "You are Droid.\n\nAnswer in French.");

        let out = inject_system_prompt(&obj(json!({})), ProtocolType::Openai, "P");
        assert_eq!(out["instructions"], "P");
    }

    #[test]
    fn passthrough_is_untouched() {
        let body = obj(json!({ "messages": [] }));
        assert_eq!(
            inject_system_prompt(&body, ProtocolType::Passthrough, "P"),
            body
        );
    }
}
