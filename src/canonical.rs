use crate::error::{AppResult, GatewayError};
use serde_json::{Map, Value};

/// The client body after model redirection. Never mutated once built; every
/// transformation step produces a new map.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRequest {
    body: Map<String, Value>,
}

/// Reads the client's model id, rejecting absent or empty values.
pub fn requested_model(body: &Value) -> AppResult<&str> {
    body.get("model")
        .and_then(|v| v.as_str())
        .filter(|v| !v.is_empty())
        .ok_or(GatewayError::MissingModel)
}

impl CanonicalRequest {
    pub fn new(body: Value, model_id: &str) -> AppResult<Self> {
        let Value::Object(mut body) = body else {
            return Err(GatewayError::internal("request body must be a JSON object"));
        };
        body.insert("model".to_string(), Value::String(model_id.to_string()));
        Ok(Self { body })
    }

    pub fn model(&self) -> &str {
        self.body
            .get("model")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
    }

    pub fn is_streaming(&self) -> bool {
        self.body.get("stream").and_then(|v| v.as_bool()) == Some(true)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    pub fn messages(&self) -> &[Value] {
        self.body
            .get("messages")
            .and_then(|v| v.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.body.clone())
    }

    /// Same request with a different body, e.g. after message filtering.
    pub fn with_body(&self, body: Map<String, Value>) -> Self {
        let model = self.body.get("model").cloned();
        let mut body = body;
        if let Some(model) = model {
            body.insert("model".to_string(), model);
        }
        Self { body }
    }
}
