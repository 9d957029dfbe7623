use serde::Serialize;

pub mod decode;
pub mod encode;

/// One decoded unit from an upstream event stream, independent of dialect.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamEvent {
    MessageStart,
    TextDelta(String),
    ReasoningDelta(String),
    /// `slot` is the upstream's own position for the call (content block
    /// index or output index); the re-encoder renumbers it.
    ToolCallStart {
        slot: u64,
        id: String,
        name: String,
    },
    ToolCallArgsDelta {
        slot: u64,
        arguments: String,
    },
    Finish(FinishReason),
    /// End of stream without a stop reason of its own.
    MessageStop,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Other(String),
}

impl FinishReason {
    /// Maps both upstream vocabularies onto chat-completions finish reasons.
    pub fn from_upstream(reason: &str) -> Self {
        match reason {
            "end_turn" | "stop" | "stop_sequence" | "pause_turn" | "completed" => {
                FinishReason::Stop
            }
            "max_tokens" | "length" | "max_output_tokens" => FinishReason::Length,
            "tool_use" | "tool_calls" => FinishReason::ToolCalls,
            "content_filter" | "refusal" => FinishReason::ContentFilter,
            other => FinishReason::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FinishReason::Stop => "stop",
            FinishReason::Length => "length",
            FinishReason::ToolCalls => "tool_calls",
            FinishReason::ContentFilter => "content_filter",
            FinishReason::Other(s) => s.as_str(),
        }
    }
}

impl Serialize for FinishReason {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_vocabularies_map_to_chat_reasons() {
        for (upstream, expected) in [
            ("end_turn", "stop"),
            ("stop", "stop"),
            ("stop_sequence", "stop"),
            ("max_tokens", "length"),
            ("length", "length"),
            ("max_output_tokens", "length"),
            ("tool_use", "tool_calls"),
            ("tool_calls", "tool_calls"),
            ("refusal", "content_filter"),
        ] {
            assert_eq!(FinishReason::from_upstream(upstream).as_str(), expected);
        }
    }

    #[test]
    fn unknown_reasons_pass_through() {
        assert_eq!(
            FinishReason::from_upstream("model_context_window_exceeded"),
            FinishReason::Other("model_context_window_exceeded".to_string())
        );
    }
}
