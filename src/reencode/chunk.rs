use crate::wire::FinishReason;
use serde::Serialize;

pub const CHUNK_OBJECT: &str = "chat.completion.chunk";

/// One `chat.completion.chunk` frame as sent to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientChunk {
    pub id: String,
    pub object: &'static str,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: ChunkDelta,
    pub finish_reason: Option<FinishReason>,
}

/// Text, reasoning and tool-call increments share this shape; whichever
/// field is populated says what the chunk carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChunkDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCallDelta {
    pub index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    pub function: FunctionDelta,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FunctionDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

impl ClientChunk {
    pub fn delta(&self) -> &ChunkDelta {
        &self.choices[0].delta
    }

    pub fn finish_reason(&self) -> Option<&FinishReason> {
        self.choices.first().and_then(|c| c.finish_reason.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unset_delta_fields_are_omitted() {
        let chunk = ClientChunk {
            id: "chatcmpl-1".to_string(),
            object: CHUNK_OBJECT,
            created: 7,
            model: "m".to_string(),
            choices: vec![ChunkChoice {
                index: 0,
                delta: ChunkDelta {
                    content: Some("hi".to_string()),
                    ..Default::default()
                },
                finish_reason: None,
            }],
        };
        assert_eq!(
            serde_json::to_value(&chunk).unwrap(),
            json!({
                "id": "chatcmpl-1",
                "object": "chat.completion.chunk",
                "created": 7,
                "model": "m",
                "choices": [{ "index": 0, "delta": { "content": "hi" }, "finish_reason": null }]
            })
        );
    }

    #[test]
    fn tool_call_delta_serializes_type_field() {
        let delta = ChunkDelta {
            tool_calls: Some(vec![ToolCallDelta {
                index: 0,
                id: Some("call_1".to_string()),
                kind: Some("function"),
                function: FunctionDelta {
                    name: Some("ls".to_string()),
                    arguments: Some(String::new()),
                },
            }]),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&delta).unwrap(),
            json!({ "tool_calls": [{ "index": 0, "id": "call_1", "type": "function", "function": { "name": "ls", "arguments": "" } }] })
        );
    }
}
