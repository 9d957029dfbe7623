use crate::error::{AppResult, GatewayError};
use crate::model_registry::EndpointDescriptor;
use axum::http::HeaderMap;
use serde_json::Value;

/// Shared client for every upstream call. No request timeout is set; the
/// transport's own limits apply. The user agent is a per-request header.
pub fn build_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().build()
}

/// POST `body` to the endpoint. Non-2xx answers are read in full and turned
/// into [`GatewayError::Upstream`]; nothing is retried.
pub async fn send(
    client: &reqwest::Client,
    endpoint: &EndpointDescriptor,
    headers: HeaderMap,
    body: &Value,
) -> AppResult<reqwest::Response> {
    let resp = client
        .post(&endpoint.base_url)
        .headers(headers)
        .json(body)
        .send()
        .await
        .map_err(|err| {
            tracing::warn!(endpoint = %endpoint.base_url, error = %err, "upstream request failed");
            GatewayError::internal(err.to_string())
        })?;

    let status = resp.status();
    tracing::info!(
        endpoint = %endpoint.base_url,
        status = status.as_u16(),
        "upstream responded"
    );
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), body = %text, "upstream returned an error");
        return Err(GatewayError::Upstream {
            status,
            body: text,
        });
    }
    Ok(resp)
}

/// Read a buffered (non-streaming) upstream answer as JSON.
pub async fn read_json(resp: reqwest::Response) -> AppResult<Value> {
    let text = resp
        .text()
        .await
        .map_err(|err| GatewayError::internal(err.to_string()))?;
    serde_json::from_str(&text).map_err(|err| GatewayError::internal(err.to_string()))
}
