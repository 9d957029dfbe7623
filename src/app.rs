use crate::auth::CredentialSource;
use crate::config::{ConfigError, GatewayConfig};
use crate::model_registry::ModelRegistry;
use crate::transforms::MessageFilter;
use axum::Router;
use axum::http::{HeaderName, Method, header};
use axum::routing::{get, post};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<RuntimeConfig>,
    pub registry: Arc<ModelRegistry>,
    pub http: reqwest::Client,
    pub credentials: CredentialSource,
    pub message_filter: Option<Arc<MessageFilter>>,
}

#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    pub listen: String,
    pub config_path: Option<PathBuf>,
    pub api_key: Option<String>,
    pub translate_nonstream: bool,
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        let listen = env_var("DROID2API_LISTEN").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let config_path = env_var("DROID2API_CONFIG").map(PathBuf::from);
        let api_key = env_var("FACTORY_API_KEY");
        let translate_nonstream = env_var("DROID2API_TRANSLATE_NONSTREAM")
            .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"));
        Self {
            listen,
            config_path,
            api_key,
            translate_nonstream,
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid message filter: {0}")]
    MessageFilter(#[from] regex::Error),
    #[error("failed to build http client: {0}")]
    HttpClient(String),
    #[error("invalid listen address {addr}: {reason}")]
    Listen { addr: String, reason: String },
    #[error("server error: {0}")]
    Serve(String),
}

pub fn load_state() -> Result<AppState, StartupError> {
    let runtime = RuntimeConfig::from_env();
    let config = match &runtime.config_path {
        Some(path) => GatewayConfig::from_file(path)?,
        None => GatewayConfig::builtin(),
    };
    load_state_with(runtime, config)
}

pub fn load_state_with(
    runtime: RuntimeConfig,
    config: GatewayConfig,
) -> Result<AppState, StartupError> {
    config.validate()?;
    let registry = ModelRegistry::from_config(config);
    let message_filter = match registry.message_filter() {
        Some(filter) => MessageFilter::new(filter)?.map(Arc::new),
        None => None,
    };
    let http = crate::upstream::build_client()
        .map_err(|err| StartupError::HttpClient(err.to_string()))?;
    tracing::info!(
        models = registry.models().len(),
        fixed_credential = runtime.api_key.is_some(),
        message_filter = message_filter.is_some(),
        dev_mode = registry.dev_mode(),
        "gateway state loaded"
    );
    Ok(AppState {
        credentials: CredentialSource::new(runtime.api_key.clone()),
        runtime: Arc::new(runtime),
        registry: Arc::new(registry),
        http,
        message_filter,
    })
}

pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-api-key"),
            HeaderName::from_static("anthropic-version"),
        ]);

    Router::new()
        .route("/", get(crate::handlers::root))
        .route("/v1/models", get(crate::handlers::list_models))
        .route(
            "/v1/chat/completions",
            post(crate::handlers::create_chat_completions),
        )
        .route("/v1/responses", post(crate::handlers::create_response))
        .route("/v1/messages", post(crate::handlers::create_messages))
        .fallback(crate::handlers::not_found)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            MakeRequestUuid,
        ))
}
