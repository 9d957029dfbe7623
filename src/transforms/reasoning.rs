use crate::config::ProtocolType;
use crate::model_registry::ReasoningLevel;
use crate::transforms::FieldPatch;
use serde_json::json;

/// Fixed thinking budget per level for the Anthropic messages protocol.
pub fn budget_tokens(level: ReasoningLevel) -> Option<u32> {
    match level {
        ReasoningLevel::Low => Some(4096),
        ReasoningLevel::Medium => Some(12288),
        ReasoningLevel::High => Some(24576),
        ReasoningLevel::Off | ReasoningLevel::Auto => None,
    }
}

/// Field owning reasoning controls in each dialect.
pub fn reasoning_field(protocol: ProtocolType) -> Option<&'static str> {
    match protocol {
        ProtocolType::Anthropic => Some("thinking"),
        ProtocolType::Openai => Some("reasoning"),
        ProtocolType::Passthrough => None,
    }
}

/// `auto` leaves the request alone, `low|medium|high` sets the dialect's
/// effort field, and anything else (`off` or no declared level) strips it.
/// Passthrough bodies are never touched.
pub fn map_reasoning(level: Option<ReasoningLevel>, protocol: ProtocolType) -> FieldPatch {
    let Some(field) = reasoning_field(protocol) else {
        return FieldPatch::Keep;
    };
    match level {
        Some(ReasoningLevel::Auto) => FieldPatch::Keep,
        Some(level @ (ReasoningLevel::Low | ReasoningLevel::Medium | ReasoningLevel::High)) => {
            let value = match protocol {
                ProtocolType::Anthropic => json!({
                    "type": "enabled",
                    "budget_tokens": budget_tokens(level),
                }),
                _ => json!({
                    "effort": level.as_str(),
                    "summary": "auto",
                }),
            };
            FieldPatch::Set { field, value }
        }
        Some(ReasoningLevel::Off) | None => FieldPatch::Remove { field },
    }
}
