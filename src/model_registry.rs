use crate::config::{GatewayConfig, MessageFilterConfig, ProtocolType};
use serde::Serialize;
use std::collections::HashMap;

/// Abstract reasoning tier declared per model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningLevel {
    Off,
    Auto,
    Low,
    Medium,
    High,
}

impl ReasoningLevel {
    /// Case-insensitive parse. Unrecognised values yield `None`, which callers
    /// treat the same as `Off`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "off" => Some(ReasoningLevel::Off),
            "auto" => Some(ReasoningLevel::Auto),
            "low" => Some(ReasoningLevel::Low),
            "medium" => Some(ReasoningLevel::Medium),
            "high" => Some(ReasoningLevel::High),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReasoningLevel::Off => "off",
            ReasoningLevel::Auto => "auto",
            ReasoningLevel::Low => "low",
            ReasoningLevel::Medium => "medium",
            ReasoningLevel::High => "high",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub display_name: String,
    pub protocol_type: ProtocolType,
    pub reasoning: Option<ReasoningLevel>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointDescriptor {
    pub protocol_type: ProtocolType,
    pub base_url: String,
}

/// Read-only view over the gateway config, built once at startup and shared
/// behind an `Arc`.
#[derive(Debug)]
pub struct ModelRegistry {
    models: Vec<ModelDescriptor>,
    model_index: HashMap<String, usize>,
    endpoints: HashMap<ProtocolType, EndpointDescriptor>,
    redirects: HashMap<String, String>,
    system_prompt: String,
    user_agent: String,
    message_filter: Option<MessageFilterConfig>,
    dev_mode: bool,
}

impl ModelRegistry {
    pub fn from_config(config: GatewayConfig) -> Self {
        let models: Vec<ModelDescriptor> = config
            .models
            .into_iter()
            .map(|m| ModelDescriptor {
                reasoning: m.reasoning.as_deref().and_then(ReasoningLevel::parse),
                id: m.id,
                display_name: m.name,
                protocol_type: m.protocol_type,
            })
            .collect();
        let model_index = models
            .iter()
            .enumerate()
            .map(|(idx, m)| (m.id.clone(), idx))
            .collect();
        let endpoints = config
            .endpoint
            .into_iter()
            .map(|e| {
                (
                    e.name,
                    EndpointDescriptor {
                        protocol_type: e.name,
                        base_url: e.base_url,
                    },
                )
            })
            .collect();
        Self {
            models,
            model_index,
            endpoints,
            redirects: config.model_redirects,
            system_prompt: config.system_prompt,
            user_agent: config.user_agent,
            message_filter: config.message_filter,
            dev_mode: config.dev_mode,
        }
    }

    /// Apply the alias table once. Unmapped ids are returned unchanged.
    pub fn resolve_redirect<'a>(&'a self, requested: &'a str) -> &'a str {
        match self.redirects.get(requested) {
            Some(target) => {
                tracing::debug!(from = %requested, to = %target, "model redirected");
                target.as_str()
            }
            None => requested,
        }
    }

    pub fn find_model(&self, id: &str) -> Option<&ModelDescriptor> {
        self.model_index.get(id).map(|idx| &self.models[*idx])
    }

    pub fn find_endpoint(&self, protocol_type: ProtocolType) -> Option<&EndpointDescriptor> {
        self.endpoints.get(&protocol_type)
    }

    /// Models in configuration order.
    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn message_filter(&self) -> Option<&MessageFilterConfig> {
        self.message_filter.as_ref()
    }

    pub fn dev_mode(&self) -> bool {
        self.dev_mode
    }
}
