use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Upstream wire dialect a model speaks.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolType {
    Anthropic,
    Openai,
    #[serde(alias = "common")]
    Passthrough,
}

impl ProtocolType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProtocolType::Anthropic => "anthropic",
            ProtocolType::Openai => "openai",
            ProtocolType::Passthrough => "passthrough",
        }
    }

    /// The `type` spelling of config files, which model listings report as
    /// `owned_by`.
    pub fn config_name(self) -> &'static str {
        match self {
            ProtocolType::Passthrough => "common",
            other => other.as_str(),
        }
    }
}

impl std::fmt::Display for ProtocolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default)]
    pub model_redirects: HashMap<String, String>,
    pub endpoint: Vec<EndpointConfig>,
    pub models: Vec<ModelConfig>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub message_filter: Option<MessageFilterConfig>,
    /// Logs upstream request and response bodies at debug level.
    #[serde(default)]
    pub dev_mode: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    pub name: ProtocolType,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    pub name: String,
    pub id: String,
    #[serde(rename = "type")]
    pub protocol_type: ProtocolType,
    #[serde(default)]
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MessageFilterConfig {
    pub phrases: Vec<String>,
    #[serde(default)]
    pub replacement: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("duplicate model id: {0}")]
    DuplicateModel(String),
    #[error("duplicate endpoint for protocol type: {0}")]
    DuplicateEndpoint(ProtocolType),
    #[error("endpoint {0} has an empty base_url")]
    EmptyBaseUrl(ProtocolType),
    #[error("model {0} has an empty id")]
    EmptyModelId(String),
}

impl GatewayConfig {
    pub fn builtin() -> Self {
        let model_redirects = [
            ("claude-3-5-haiku-20241022", "claude-haiku-4-5-20251001"),
            ("claude-sonnet-4-5", "claude-sonnet-4-5-20250929"),
            ("gpt-5", "gpt-5-2025-08-07"),
        ]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();

        let endpoint = vec![
            EndpointConfig {
                name: ProtocolType::Openai,
                base_url: "https://app.factory.ai/api/llm/o/v1/responses".to_string(),
            },
            EndpointConfig {
                name: ProtocolType::Anthropic,
                base_url: "https://app.factory.ai/api/llm/a/v1/messages".to_string(),
            },
            EndpointConfig {
                name: ProtocolType::Passthrough,
                base_url: "https://app.factory.ai/api/llm/o/v1/chat/completions".to_string(),
            },
        ];

        let models = vec![
            model("Opus 4.1", "claude-opus-4-1-20250805", ProtocolType::Anthropic, Some("auto")),
            model("Haiku 4.5", "claude-haiku-4-5-20251001", ProtocolType::Anthropic, Some("auto")),
            model("Sonnet 4.5", "claude-sonnet-4-5-20250929", ProtocolType::Anthropic, Some("auto")),
            model("GPT-5", "gpt-5-2025-08-07", ProtocolType::Openai, Some("auto")),
            model("GPT-5-Codex", "gpt-5-codex", ProtocolType::Openai, Some("off")),
            model("GLM-4.6", "glm-4.6", ProtocolType::Passthrough, None),
        ];

        Self {
            model_redirects,
            endpoint,
            models,
            user_agent: default_user_agent(),
            system_prompt: "You are Droid, an AI software engineering agent built by Factory.\n\n"
                .to_string(),
            message_filter: None,
            dev_mode: false,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let config: GatewayConfig =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: display,
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen_models = HashSet::new();
        for model in &self.models {
            if model.id.trim().is_empty() {
                return Err(ConfigError::EmptyModelId(model.name.clone()));
            }
            if !seen_models.insert(model.id.as_str()) {
                return Err(ConfigError::DuplicateModel(model.id.clone()));
            }
        }
        let mut seen_endpoints = HashSet::new();
        for endpoint in &self.endpoint {
            if endpoint.base_url.trim().is_empty() {
                return Err(ConfigError::EmptyBaseUrl(endpoint.name));
            }
            if !seen_endpoints.insert(endpoint.name) {
                return Err(ConfigError::DuplicateEndpoint(endpoint.name));
            }
        }
        Ok(())
    }
}

fn model(name: &str, id: &str, protocol_type: ProtocolType, reasoning: Option<&str>) -> ModelConfig {
    ModelConfig {
        name: name.to_string(),
        id: id.to_string(),
        protocol_type,
        reasoning: reasoning.map(str::to_string),
    }
}

fn default_user_agent() -> String {
    "factory-cli/0.22.2".to_string()
}
