use crate::app::AppState;
use crate::canonical::{CanonicalRequest, requested_model};
use crate::config::ProtocolType;
use crate::error::{AppResult, GatewayError};
use crate::headers::build_headers;
use crate::model_registry::{EndpointDescriptor, ModelDescriptor};
use crate::reencode::{self, Reencoder};
use crate::upstream;
use crate::wire::encode;
use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header};
use axum::response::sse::Event;
use axum::response::{IntoResponse, Response, Sse};
use futures_util::StreamExt;
use serde_json::{Value, json};

const AVAILABLE_ENDPOINTS: [&str; 4] = [
    "GET /v1/models",
    "POST /v1/chat/completions",
    "POST /v1/responses",
    "POST /v1/messages",
];

pub async fn root() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": "OpenAI compatible API proxy",
        "endpoints": AVAILABLE_ENDPOINTS,
    }))
}

pub async fn list_models(State(state): State<AppState>) -> Json<Value> {
    tracing::info!("listing models");
    let created = chrono::Utc::now().timestamp_millis();
    let data: Vec<Value> = state
        .registry
        .models()
        .iter()
        .map(|model| {
            json!({
                "id": model.id,
                "object": "model",
                "created": created,
                "owned_by": model.protocol_type.config_name(),
                "permission": [],
                "root": model.id,
                "parent": Value::Null,
            })
        })
        .collect();
    Json(json!({ "object": "list", "data": data }))
}

pub async fn create_chat_completions(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Response> {
    let Json(body) = payload?;
    let routed = route(&state, &body, None)?;
    let protocol = routed.model.protocol_type;
    let request = canonical_request(&state, body, &routed.model_id)?;

    let wire_body = encode::build_request(
        &request,
        protocol,
        routed.model.reasoning,
        state.registry.system_prompt(),
    );
    let streaming = wire_body.get("stream").and_then(|v| v.as_bool()) == Some(true);
    let credential = state.credentials.resolve(&headers, false);
    let upstream_headers = build_headers(
        &credential,
        &headers,
        protocol,
        streaming,
        state.registry.user_agent(),
    )?;
    log_body(&state, "upstream request body", &wire_body);
    let resp = upstream::send(&state.http, routed.endpoint, upstream_headers, &wire_body).await?;

    if streaming {
        if protocol == ProtocolType::Passthrough {
            return Ok(forward_event_stream(resp));
        }
        let chunks = reencode::reencode_stream(
            resp.bytes_stream(),
            Reencoder::new(protocol, routed.model_id),
        )
        .map(|item| {
            item.map_err(GatewayError::from).and_then(|chunk| {
                Event::default()
                    .json_data(chunk)
                    .map_err(|err| GatewayError::internal(err.to_string()))
            })
        });
        return Ok(with_event_stream_headers(Sse::new(chunks).into_response()));
    }

    let document = upstream::read_json(resp).await?;
    log_body(&state, "upstream response body", &document);
    if protocol == ProtocolType::Passthrough || !state.runtime.translate_nonstream {
        return Ok(Json(document).into_response());
    }
    let completion = reencode::assemble_completion(protocol, &document, &routed.model_id)?;
    Ok(Json(completion).into_response())
}

pub async fn create_response(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Response> {
    let Json(body) = payload?;
    forward_direct(&state, &headers, body, "/v1/responses", ProtocolType::Openai).await
}

pub async fn create_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Response> {
    let Json(body) = payload?;
    forward_direct(&state, &headers, body, "/v1/messages", ProtocolType::Anthropic).await
}

pub async fn not_found(method: Method, uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not Found",
            "message": format!("Path {} {} does not exist", method, uri.path()),
            "availableEndpoints": AVAILABLE_ENDPOINTS,
        })),
    )
        .into_response()
}

struct Routed<'a> {
    model_id: String,
    model: &'a ModelDescriptor,
    endpoint: &'a EndpointDescriptor,
}

/// Redirect, model lookup, optional protocol restriction, endpoint lookup.
/// Every failure here happens before any upstream contact.
fn route<'a>(
    state: &'a AppState,
    body: &Value,
    only: Option<(&'static str, ProtocolType)>,
) -> AppResult<Routed<'a>> {
    let requested = requested_model(body)?;
    let model_id = state.registry.resolve_redirect(requested).to_string();
    let model = state
        .registry
        .find_model(&model_id)
        .ok_or_else(|| GatewayError::ModelNotFound(model_id.clone()))?;
    if let Some((path, expected)) = only {
        if model.protocol_type != expected {
            return Err(GatewayError::InvalidEndpointType { path, expected });
        }
    }
    let endpoint = state
        .registry
        .find_endpoint(model.protocol_type)
        .ok_or(GatewayError::EndpointNotFound(model.protocol_type))?;
    tracing::info!(
        model = %model_id,
        protocol = %model.protocol_type,
        endpoint = %endpoint.base_url,
        "routing request"
    );
    Ok(Routed {
        model_id,
        model,
        endpoint,
    })
}

fn canonical_request(state: &AppState, body: Value, model_id: &str) -> AppResult<CanonicalRequest> {
    let request = CanonicalRequest::new(body, model_id)?;
    Ok(match &state.message_filter {
        Some(filter) => request.with_body(filter.filter_request(request.body())),
        None => request,
    })
}

/// `/v1/responses` and `/v1/messages`: the client body already speaks the
/// upstream dialect and the answer goes back untouched.
async fn forward_direct(
    state: &AppState,
    headers: &HeaderMap,
    body: Value,
    path: &'static str,
    expected: ProtocolType,
) -> AppResult<Response> {
    let routed = route(state, &body, Some((path, expected)))?;
    let request = canonical_request(state, body, &routed.model_id)?;
    let streaming = request.is_streaming();

    let wire_body = encode::forward_request(
        &request,
        expected,
        routed.model.reasoning,
        state.registry.system_prompt(),
    );
    let credential = state.credentials.resolve(headers, true);
    let upstream_headers = build_headers(
        &credential,
        headers,
        expected,
        streaming,
        state.registry.user_agent(),
    )?;
    log_body(state, "upstream request body", &wire_body);
    let resp = upstream::send(&state.http, routed.endpoint, upstream_headers, &wire_body).await?;

    if streaming {
        return Ok(forward_event_stream(resp));
    }
    let document = upstream::read_json(resp).await?;
    log_body(state, "upstream response body", &document);
    Ok(Json(document).into_response())
}

/// Full bodies are only logged when the config turns on `dev_mode`.
fn log_body(state: &AppState, label: &str, body: &Value) {
    if state.registry.dev_mode() {
        tracing::debug!(body = %body, "{}", label);
    }
}

/// Relay the upstream event stream byte for byte.
fn forward_event_stream(resp: reqwest::Response) -> Response {
    let response = Body::from_stream(resp.bytes_stream()).into_response();
    with_event_stream_headers(response)
}

fn with_event_stream_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    response
}
