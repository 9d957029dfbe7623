use axum::http::HeaderMap;

/// Where the upstream credential comes from for one request.
#[derive(Clone, Debug, Default)]
pub struct CredentialSource {
    pub fixed: Option<String>,
}

impl CredentialSource {
    pub fn new(fixed: Option<String>) -> Self {
        Self {
            fixed: fixed.filter(|v| !v.trim().is_empty()),
        }
    }

    /// A process-level key wins over anything the client sent. The client's
    /// `authorization` header is tried first, then `x-api-key` when allowed.
    pub fn resolve(&self, headers: &HeaderMap, allow_x_api_key: bool) -> String {
        if let Some(fixed) = &self.fixed {
            return fixed.clone();
        }
        let client = header_str(headers, "authorization").or_else(|| {
            if allow_x_api_key {
                header_str(headers, "x-api-key")
            } else {
                None
            }
        });
        match client {
            Some(value) => ensure_bearer(value),
            None => String::new(),
        }
    }
}

pub fn ensure_bearer(value: &str) -> String {
    if value.starts_with("Bearer ") {
        value.to_string()
    } else {
        format!("Bearer {value}")
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}
