//! The boundary to the remote inference API.
//!
//! [`LlmBackend`] is implemented by whatever actually performs inference (an
//! HTTP client, a local runtime, a test double). The provider hands it a fully
//! resolved [`BackendCall`] and gets a [`BackendReply`] back; neither type
//! carries vendor-specific fields.

use async_trait::async_trait;
use relayclaw_core::error::ProviderError;
use relayclaw_core::message::Message;
use relayclaw_core::provider::{ToolDefinition, Usage};
use serde::{Deserialize, Serialize};

/// Tool-choice directive sent whenever tools are present.
pub const TOOL_CHOICE_AUTO: &str = "auto";

/// A completion call after dialect resolution.
#[derive(Clone)]
pub struct BackendCall {
    /// Resolved model id, e.g. `openrouter/anthropic/claude-opus-4-5`
    pub model: String,

    pub messages: Vec<Message>,

    pub max_tokens: u32,

    /// Effective temperature (after model-specific pinning)
    pub temperature: f32,

    /// Endpoint to call instead of the vendor default
    pub api_base: Option<String>,

    /// Credential for the resolved model's family
    pub api_key: Option<String>,

    pub tools: Option<Vec<ToolDefinition>>,

    /// Set to `"auto"` exactly when `tools` is set
    pub tool_choice: Option<String>,
}

impl BackendCall {
    /// The call as an OpenAI-style JSON body. The credential is never included.
    pub fn payload(&self) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": self.messages,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });

        if let Some(api_base) = &self.api_base {
            body["api_base"] = serde_json::json!(api_base);
        }

        if let Some(tools) = &self.tools {
            let tools: Vec<serde_json::Value> = tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            body["tools"] = serde_json::json!(tools);
        }

        if let Some(choice) = &self.tool_choice {
            body["tool_choice"] = serde_json::json!(choice);
        }

        body
    }
}

impl std::fmt::Debug for BackendCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendCall")
            .field("model", &self.model)
            .field("messages", &self.messages.len())
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("tools", &self.tools.as_ref().map(Vec::len))
            .field("tool_choice", &self.tool_choice)
            .finish()
    }
}

/// What the backend returned for one call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendReply {
    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub tool_calls: Vec<BackendToolCall>,

    #[serde(default)]
    pub finish_reason: Option<String>,

    #[serde(default)]
    pub usage: Option<Usage>,

    /// Model that actually answered, if reported
    #[serde(default)]
    pub model: Option<String>,
}

/// A tool call as the backend reported it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendToolCall {
    pub id: String,
    pub name: String,

    /// Either a JSON-encoded string or an already structured value
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// A remote (or local) inference API.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Perform one completion call.
    async fn invoke(&self, call: BackendCall) -> Result<BackendReply, ProviderError>;
}
