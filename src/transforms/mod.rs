use serde_json::{Map, Value};

pub mod inject_system_prompt;
pub mod message_filter;
pub mod reasoning;

pub use inject_system_prompt::inject_system_prompt;
pub use message_filter::MessageFilter;
pub use reasoning::map_reasoning;

/// A single top-level field edit on an outgoing request body.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldPatch {
    Keep,
    Set { field: &'static str, value: Value },
    Remove { field: &'static str },
}

impl FieldPatch {
    /// Returns a patched copy; the input is left untouched.
    pub fn apply(&self, body: &Map<String, Value>) -> Map<String, Value> {
        let mut out = body.clone();
        match self {
            FieldPatch::Keep => {}
            FieldPatch::Set { field, value } => {
                out.insert((*field).to_string(), value.clone());
            }
            FieldPatch::Remove { field } => {
                out.remove(*field);
            }
        }
        out
    }
}

pub fn text_block(text: impl Into<String>) -> Value {
    let mut block = Map::new();
    block.insert("type".to_string(), Value::String("text".to_string()));
    block.insert("text".to_string(), Value::String(text.into()));
    Value::Object(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn keep_returns_equal_copy() {
        let body = obj(json!({ "model": "m", "reasoning": { "effort": "low" } }));
        assert_eq!(FieldPatch::Keep.apply(&body), body);
    }

    #[test]
    fn set_overwrites_existing_field() {
        let body = obj(json!({ "thinking": { "type": "disabled" } }));
        let patched = FieldPatch::Set {
            field: "thinking",
            value: json!({ "type": "enabled" }),
        }
        .apply(&body);
        assert_eq!(patched["thinking"], json!({ "type": "enabled" }));
        assert_eq!(body["thinking"], json!({ "type": "disabled" }));
    }

    #[test]
    fn remove_is_a_noop_when_missing() {
        let body = obj(json!({ "model": "m" }));
        assert_eq!(FieldPatch::Remove { field: "reasoning" }.apply(&body), body);
    }
}
