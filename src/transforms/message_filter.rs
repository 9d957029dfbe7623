use crate::config::MessageFilterConfig;
use regex::{NoExpand, Regex};
use serde_json::{Map, Value};

/// Case-insensitive phrase scrubber applied to client message text before the
/// request is translated.
#[derive(Debug, Clone)]
pub struct MessageFilter {
    pattern: Regex,
    replacement: String,
}

impl MessageFilter {
    /// `None` when the phrase list is empty.
    pub fn new(config: &MessageFilterConfig) -> Result<Option<Self>, regex::Error> {
        let alternatives: Vec<String> = config
            .phrases
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(regex::escape)
            .collect();
        if alternatives.is_empty() {
            return Ok(None);
        }
        let pattern = Regex::new(&format!("(?i)(?:{})", alternatives.join("|")))?;
        Ok(Some(Self {
            pattern,
            replacement: config.replacement.clone(),
        }))
    }

    pub fn filter_text(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, NoExpand(&self.replacement))
            .into_owned()
    }

    /// String content, or the `text` of each part in a content array.
    pub fn filter_content(&self, content: &Value) -> Value {
        match content {
            Value::String(s) => Value::String(self.filter_text(s)),
            Value::Array(parts) => Value::Array(
                parts
                    .iter()
                    .map(|part| {
                        let Some(obj) = part.as_object() else {
                            return part.clone();
                        };
                        let Some(text) = obj.get("text").and_then(|v| v.as_str()) else {
                            return part.clone();
                        };
                        let mut obj = obj.clone();
                        obj.insert("text".to_string(), Value::String(self.filter_text(text)));
                        Value::Object(obj)
                    })
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    pub fn filter_messages(&self, messages: &[Value]) -> Vec<Value> {
        messages
            .iter()
            .map(|message| {
                let Some(obj) = message.as_object() else {
                    return message.clone();
                };
                let mut obj = obj.clone();
                if let Some(content) = obj.get("content") {
                    let filtered = self.filter_content(content);
                    obj.insert("content".to_string(), filtered);
                }
                Value::Object(obj)
            })
            .collect()
    }

    /// Filters `messages`, `input`, `system` and `instructions` in any of the
    /// three client dialects.
    pub fn filter_request(&self, body: &Map<String, Value>) -> Map<String, Value> {
        let mut out = body.clone();
        for key in ["messages", "input"] {
            match body.get(key) {
                Some(Value::Array(items)) => {
                    out.insert(key.to_string(), Value::Array(self.filter_messages(items)));
                }
                Some(Value::String(text)) => {
                    out.insert(key.to_string(), Value::String(self.filter_text(text)));
                }
                _ => {}
            }
        }
        for key in ["system", "instructions"] {
            if let Some(content) = body.get(key) {
                out.insert(key.to_string(), self.filter_content(content));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filter() -> MessageFilter {
        MessageFilter::new(&MessageFilterConfig {
            phrases: vec![
                "GitHub Copilot".to_string(),
                "ChatGPT".to_string(),
                "Cursor".to_string(),
                "$1".to_string(),
            ],
            replacement: "assistant".to_string(),
        })
        .unwrap()
        .unwrap()
    }

    #[test]
    fn empty_phrase_list_disables_filter() {
        let cfg = MessageFilterConfig {
            phrases: vec!["  ".to_string()],
            replacement: String::new(),
        };
        assert!(MessageFilter::new(&cfg).unwrap().is_none());
    }

    #[test]
    fn phrases_match_case_insensitively() {
        assert_eq!(
            filter().filter_text("github copilot and CHATGPT and CuRsOr"),
            "assistant and assistant and assistant"
        );
        assert_eq!(filter().filter_text("plain text"), "plain text");
    }

    #[test]
    fn phrases_are_literal() {
        assert_eq!(filter().filter_text("cost $1"), "cost assistant");
    }

    #[test]
    fn array_content_only_touches_text_parts() {
        let out = filter().filter_content(&json!([
            { "type": "text", "text": "I use Cursor" },
            { "type": "image_url", "image_url": { "url": "https://example.com/Cursor.png" } }
        ]));
        assert_eq!(out[0]["text"], "I use assistant");
        assert_eq!(out[1]["image_url"]["url"], "https://example.com/Cursor.png");
    }

    #[test]
    fn request_filter_covers_messages_and_system() {
        let body = json!({
            "model": "m",
            "system": [{ "type": "text", "text": "You are ChatGPT" }],
            "messages": [{ "role": "user", "content": "Hi ChatGPT" }]
        });
        let out = filter().filter_request(body.as_object().unwrap());
        assert_eq!(out["system"][0]["text"], "You are assistant");
        assert_eq!(out["messages"][0]["content"], "Hi assistant");
        assert_eq!(out["model"], "m");
    }
}
