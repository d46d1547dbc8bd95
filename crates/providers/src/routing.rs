//! Routing provider: one abstract request in, one canonical response out.
//!
//! The dialect and credential table are fixed when the provider is built. Each
//! `complete` call resolves the model id, builds a [`BackendCall`], invokes the
//! backend and normalizes the reply. Backend errors (and panics) come back as
//! a response with finish reason `error`.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use relayclaw_config::AppConfig;
use relayclaw_core::error::ProviderError;
use relayclaw_core::provider::{
    CompletionRequest, CompletionResponse, FinishReason, Provider, ToolCallRequest,
};
use tracing::{debug, error};

use crate::backend::{BackendCall, BackendReply, BackendToolCall, LlmBackend, TOOL_CHOICE_AUTO};
use crate::credentials::{CredentialSlot, Credentials};
use crate::dialect::{Dialect, effective_temperature};
use crate::observe;

/// Key used when tool arguments cannot be decoded into an object.
pub const RAW_ARGUMENTS_KEY: &str = "raw";

/// What a provider is configured with.
#[derive(Clone, Default)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    /// Explicit endpoint override
    pub api_base: Option<String>,
    pub default_model: String,
}

impl ProviderSettings {
    pub fn new(default_model: impl Into<String>) -> Self {
        Self {
            default_model: default_model.into(),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// A [`Provider`] that speaks the dialect of one backend family.
pub struct RoutingProvider {
    backend: Arc<dyn LlmBackend>,
    default_model: String,
    api_base: Option<String>,
    dialect: Dialect,
    credentials: Credentials,
}

impl RoutingProvider {
    /// Build a provider with an empty credential table.
    pub fn new(backend: Arc<dyn LlmBackend>, settings: ProviderSettings) -> Self {
        Self::with_credentials(backend, settings, Credentials::new())
    }

    /// Build a provider whose credential table starts from `seed`.
    ///
    /// Vendor keys from `settings` never replace a seeded value; aggregator and
    /// self-hosted keys always do.
    pub fn with_credentials(
        backend: Arc<dyn LlmBackend>,
        settings: ProviderSettings,
        seed: Credentials,
    ) -> Self {
        let api_key = settings.api_key.filter(|k| !k.is_empty());
        let api_base = settings.api_base.filter(|b| !b.is_empty());
        let dialect = Dialect::detect(api_key.as_deref(), api_base.as_deref());

        let mut credentials = seed;
        let slot = credentials.propagate(
            dialect,
            api_key.as_deref(),
            api_base.as_deref(),
            &settings.default_model,
        );

        debug!(
            dialect = %dialect,
            default_model = %settings.default_model,
            credential = slot.map(|s| s.env_name()).unwrap_or("unchanged"),
            "Completion provider configured"
        );

        Self {
            backend,
            default_model: settings.default_model,
            api_base,
            dialect,
            credentials,
        }
    }

    /// Build from the application config.
    pub fn from_config(
        config: &AppConfig,
        backend: Arc<dyn LlmBackend>,
        seed: Credentials,
    ) -> Self {
        let creds = config.provider_credentials();
        let settings = ProviderSettings {
            api_key: creds.api_key,
            api_base: creds.api_base,
            default_model: config.default_model.clone(),
        };
        Self::with_credentials(backend, settings, seed)
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Resolve `model` (or the default model) into this provider's dialect.
    pub fn resolve_model(&self, model: Option<&str>) -> String {
        self.dialect
            .resolve_model(model.unwrap_or(&self.default_model))
    }

    /// Translate an abstract request into the call the backend receives.
    pub fn build_call(&self, request: &CompletionRequest) -> BackendCall {
        let model = self.resolve_model(request.model.as_deref());
        let temperature = effective_temperature(&model, request.temperature);

        let slot = CredentialSlot::for_model(&model);
        let api_key = slot
            .and_then(|s| self.credentials.get(s))
            .map(str::to_string);

        let api_base = self.api_base.clone().or_else(|| match slot {
            Some(CredentialSlot::Moonshot) => self
                .credentials
                .get(CredentialSlot::MoonshotBase)
                .map(str::to_string),
            _ => None,
        });

        let tools = request.tools.clone().filter(|t| !t.is_empty());
        let tool_choice = tools.as_ref().map(|_| TOOL_CHOICE_AUTO.to_string());

        BackendCall {
            model,
            messages: request.messages.clone(),
            max_tokens: request.max_tokens,
            temperature,
            api_base,
            api_key,
            tools,
            tool_choice,
        }
    }

    /// Normalize a backend reply.
    pub fn parse_reply(reply: BackendReply) -> CompletionResponse {
        CompletionResponse {
            content: reply.content,
            tool_calls: reply.tool_calls.into_iter().map(decode_tool_call).collect(),
            finish_reason: reply
                .finish_reason
                .map(FinishReason::from)
                .unwrap_or_default(),
            usage: reply.usage,
        }
    }
}

#[async_trait]
impl Provider for RoutingProvider {
    fn name(&self) -> &str {
        self.dialect.as_str()
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn complete(&self, request: CompletionRequest) -> CompletionResponse {
        let call = self.build_call(&request);
        observe::log_request(&call);

        let outcome = AssertUnwindSafe(self.backend.invoke(call))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(ProviderError::Panicked(panic_message(panic.as_ref()))));

        let response = match outcome {
            Ok(reply) => {
                if let Some(model) = &reply.model {
                    debug!(model = %model, "Response model");
                }
                Self::parse_reply(reply)
            }
            Err(e) => {
                error!(error = %e, "LLM API call failed");
                CompletionResponse::error(format!("Error calling LLM: {e}"))
            }
        };

        observe::log_response(&response);
        response
    }
}

fn decode_tool_call(call: BackendToolCall) -> ToolCallRequest {
    ToolCallRequest {
        id: call.id,
        name: call.name,
        arguments: decode_arguments(call.arguments),
    }
}

/// Tool arguments as an object. Anything that is not (or does not decode to)
/// an object is kept verbatim under [`RAW_ARGUMENTS_KEY`].
fn decode_arguments(arguments: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    use serde_json::Value;

    match arguments {
        Value::Object(map) => map,
        Value::Null => serde_json::Map::new(),
        Value::String(encoded) => match serde_json::from_str::<Value>(&encoded) {
            Ok(Value::Object(map)) => map,
            _ => raw_arguments(Value::String(encoded)),
        },
        other => raw_arguments(other),
    }
}

fn raw_arguments(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    let mut map = serde_json::Map::new();
    map.insert(RAW_ARGUMENTS_KEY.to_string(), value);
    map
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
