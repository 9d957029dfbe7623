use crate::config::ProtocolType;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    #[error("model is required")]
    MissingModel,
    #[error("Model {0} not found")]
    ModelNotFound(String),
    #[error("Endpoint type {0} not found")]
    EndpointNotFound(ProtocolType),
    #[error("{path} only supports {expected} endpoints")]
    InvalidEndpointType {
        path: &'static str,
        expected: ProtocolType,
    },
    #[error("Endpoint returned {}", .status.as_u16())]
    Upstream { status: StatusCode, body: String },
    #[error("malformed upstream stream: {0}")]
    StreamDecode(String),
    #[error("{0}")]
    Internal(String),
}

impl GatewayError {
    pub fn internal(message: impl Into<String>) -> Self {
        GatewayError::Internal(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MissingModel | GatewayError::InvalidEndpointType { .. } => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::ModelNotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Upstream { status, .. } => *status,
            GatewayError::EndpointNotFound(_)
            | GatewayError::StreamDecode(_)
            | GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> Value {
        match self {
            GatewayError::MissingModel
            | GatewayError::ModelNotFound(_)
            | GatewayError::EndpointNotFound(_) => json!({ "error": self.to_string() }),
            GatewayError::InvalidEndpointType { .. } => json!({
                "error": "Invalid endpoint type",
                "message": self.to_string(),
            }),
            GatewayError::Upstream { body, .. } => json!({
                "error": self.to_string(),
                "details": body,
            }),
            GatewayError::StreamDecode(_) | GatewayError::Internal(_) => json!({
                "error": "Internal server error",
                "message": self.to_string(),
            }),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        if self.status().is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (self.status(), axum::Json(self.body())).into_response()
    }
}

impl From<axum::extract::rejection::JsonRejection> for GatewayError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        GatewayError::Internal(rejection.body_text())
    }
}

impl From<crate::wire::decode::StreamDecodeError> for GatewayError {
    fn from(err: crate::wire::decode::StreamDecodeError) -> Self {
        GatewayError::StreamDecode(err.to_string())
    }
}

pub type AppResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn render(err: GatewayError) -> (StatusCode, Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn model_not_found_renders_flat_error() {
        let (status, body) = render(GatewayError::ModelNotFound("nope".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Model nope not found" }));
    }

    #[tokio::test]
    async fn upstream_error_keeps_status_and_details() {
        let (status, body) = render(GatewayError::Upstream {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: "{\"error\":\"slow down\"}".to_string(),
        })
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "Endpoint returned 429");
        assert_eq!(body["details"], "{\"error\":\"slow down\"}");
    }

    #[tokio::test]
    async fn endpoint_missing_is_a_server_error() {
        let (status, body) = render(GatewayError::EndpointNotFound(ProtocolType::Openai)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Endpoint type openai not found");
    }

    #[tokio::test]
    async fn internal_error_exposes_message() {
        let (status, body) = render(GatewayError::internal("boom")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Internal server error", "message": "boom" }));
    }
}
