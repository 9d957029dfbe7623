use crate::auth::ensure_bearer;
use crate::config::ProtocolType;
use crate::error::{AppResult, GatewayError};
use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use axum::http::{HeaderMap, HeaderName, HeaderValue};

pub const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";

const ANTHROPIC_VERSION: HeaderName = HeaderName::from_static("anthropic-version");
const ANTHROPIC_BETA: HeaderName = HeaderName::from_static("anthropic-beta");
const OPENAI_FORWARDED: [&str; 2] = ["x-session-id", "openai-beta"];

/// Headers for one upstream call. Passthrough gets the credential verbatim;
/// the other dialects get it with a `Bearer ` prefix.
pub fn build_headers(
    credential: &str,
    client: &HeaderMap,
    protocol: ProtocolType,
    is_streaming: bool,
    user_agent: &str,
) -> AppResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if protocol == ProtocolType::Passthrough {
        headers.insert(AUTHORIZATION, header_value(credential)?);
        return Ok(headers);
    }

    if !credential.is_empty() {
        headers.insert(AUTHORIZATION, header_value(&ensure_bearer(credential))?);
    }
    if !user_agent.is_empty() {
        headers.insert(USER_AGENT, header_value(user_agent)?);
    }

    match protocol {
        ProtocolType::Anthropic => {
            let version = client
                .get(&ANTHROPIC_VERSION)
                .cloned()
                .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_ANTHROPIC_VERSION));
            headers.insert(ANTHROPIC_VERSION, version);
            if let Some(beta) = client.get(&ANTHROPIC_BETA) {
                headers.insert(ANTHROPIC_BETA, beta.clone());
            }
            if is_streaming {
                headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
            }
        }
        ProtocolType::Openai => {
            for name in OPENAI_FORWARDED {
                if let Some(value) = client.get(name) {
                    headers.insert(HeaderName::from_static(name), value.clone());
                }
            }
        }
        ProtocolType::Passthrough => {}
    }
    Ok(headers)
}

fn header_value(value: &str) -> AppResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| GatewayError::internal("upstream header value contains invalid characters"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn anthropic_streaming_headers() {
        let headers = build_headers(
            "Bearer k",
            &client(&[("anthropic-beta", "interleaved-thinking-2025-05-14"), ("x-other", "1")]),
            ProtocolType::Anthropic,
            true,
            "factory-cli/0.22.2",
        )
        .unwrap();
        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(headers["authorization"], "Bearer k");
        assert_eq!(headers["anthropic-version"], "2023-06-01");
        assert_eq!(headers["anthropic-beta"], "interleaved-thinking-2025-05-14");
        assert_eq!(headers["accept"], "text/event-stream");
        assert_eq!(headers["user-agent"], "factory-cli/0.22.2");
        assert!(headers.get("x-other").is_none());
    }

    #[test]
    fn anthropic_keeps_client_version_and_skips_accept_when_buffered() {
        let headers = build_headers(
            "Bearer k",
            &client(&[("anthropic-version", "2024-01-01")]),
            ProtocolType::Anthropic,
            false,
            "ua",
        )
        .unwrap();
        assert_eq!(headers["anthropic-version"], "2024-01-01");
        assert!(headers.get("accept").is_none());
    }

    #[test]
    fn openai_forwards_session_headers() {
        let headers = build_headers(
            "Bearer k",
            &client(&[("x-session-id", "s-1"), ("anthropic-version", "x")]),
            ProtocolType::Openai,
            true,
            "ua",
        )
        .unwrap();
        assert_eq!(headers["x-session-id"], "s-1");
        assert!(headers.get("anthropic-version").is_none());
        assert!(headers.get("accept").is_none());
    }

    #[test]
    fn passthrough_sets_only_content_type_and_authorization() {
        let headers = build_headers(
            "Bearer k",
            &client(&[("anthropic-beta", "b")]),
            ProtocolType::Passthrough,
            true,
            "ua",
        )
        .unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["authorization"], "Bearer k");
    }

    #[test]
    fn bare_fixed_key_gets_bearer_except_for_passthrough() {
        let anthropic =
            build_headers("fk-1", &HeaderMap::new(), ProtocolType::Anthropic, false, "ua").unwrap();
        assert_eq!(anthropic["authorization"], "Bearer fk-1");
        let passthrough =
            build_headers("fk-1", &HeaderMap::new(), ProtocolType::Passthrough, false, "ua").unwrap();
        assert_eq!(passthrough["authorization"], "fk-1");
    }

    #[test]
    fn invalid_credential_is_an_error() {
        assert!(build_headers("Bearer \n", &HeaderMap::new(), ProtocolType::Openai, false, "").is_err());
    }
}
